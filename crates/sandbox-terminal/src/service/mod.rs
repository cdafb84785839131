//! Service Layer - orchestration
//!
//! - `CommandInterpreter`: runs commands against the bus and scheduler
//! - `TerminalSession`: per-terminal state, implements `TerminalApi`

pub mod interpreter;
pub mod session;

pub use interpreter::CommandInterpreter;
pub use session::{TerminalSession, INTERRUPT_MARKER};
