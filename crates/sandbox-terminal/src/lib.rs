//! # Sandbox Terminal
//!
//! Simulated terminals for the broker sandbox: what happens when someone
//! types `mosquitto_pub`, `mosquitto_sub`, `mosquitto_rr`, the broker's
//! service and log commands, or the Node-RED install and start-up commands.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): no bus or clock access
//!   - `Command`: the grammar table, tried in priority order
//!   - `Subscription`: filter, verbosity and count limit
//!   - `canned_reply`: responder reply mapping
//!   - `SandboxConfig` / `SandboxConfigBuilder`: configuration with validation
//!
//! - **Ports Layer** (`ports/`)
//!   - `TerminalApi`: driving port used by a console shell
//!
//! - **Service Layer** (`service/`)
//!   - `CommandInterpreter`: executes commands
//!   - `TerminalSession`: per-terminal state, implements `TerminalApi`
//!
//! - **Adapters Layer** (`adapters/`)
//!   - `ResponderSimulator`: canned replies to request/response exchanges
//!   - `BrokerLog`: broker console log history
//!
//! - `SandboxContainer` wires the above together.
//!
//! ## Guarantees
//!
//! - A failed command prints exactly one line and has no other effect.
//! - A round trip prints its reply or its timeout line, never both.
//! - A count-limited subscription prints exactly `count` deliveries and one
//!   removal notice.
//!
//! ## Usage Example
//!
//! ```ignore
//! use sandbox_terminal::{ContextTheme, SandboxConfig, SandboxContainer, TerminalApi};
//!
//! let sandbox = SandboxContainer::new(SandboxConfig::default())?;
//! let terminal = sandbox.open_terminal(ContextTheme::Primary);
//!
//! terminal.execute("mosquitto_rr -t requests/x -e replies/x -m get");
//! sandbox.advance(500);
//! assert_eq!(terminal.lines().last().map(String::as_str), Some("RUN"));
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod container;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{BrokerLog, LogEntry, ResponderSimulator, RESPONDER_CLIENT_ID};
pub use container::SandboxContainer;
pub use domain::{
    canned_reply, Command, ContextTheme, SandboxConfig, SandboxConfigBuilder, Subscription,
    LOG_HEADER,
};
pub use error::{CommandError, ConfigError};
pub use ports::{OutputChunk, OutputCursor, SessionPhase, TerminalApi};
pub use service::{CommandInterpreter, TerminalSession, INTERRUPT_MARKER};
