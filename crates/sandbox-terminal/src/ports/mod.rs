//! Ports Layer - trait definitions
//!
//! - `inbound`: what a console shell drives a terminal through
//!
//! The driven side (publishing and deferred work) uses the
//! `EventPublisher` and `SimScheduler` traits from `sandbox-bus`.

pub mod inbound;

pub use inbound::{OutputChunk, OutputCursor, SessionPhase, TerminalApi};
