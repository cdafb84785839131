//! Adapters Layer (Driven Adapters)
//!
//! Components that sit on the bus next to the terminals rather than inside
//! one.
//!
//! ## Adapters
//!
//! - `ResponderSimulator` - answers `mosquitto_rr` requests with canned replies
//! - `BrokerLog` - records every publish as a broker console log line

pub mod broker_log;
pub mod responder;

pub use broker_log::{BrokerLog, LogEntry};
pub use responder::{ResponderSimulator, RESPONDER_CLIENT_ID};
