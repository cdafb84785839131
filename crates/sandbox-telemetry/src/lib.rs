//! # Sandbox Telemetry
//!
//! Structured logging for the broker sandbox. Everything goes to stderr so
//! it never mixes with simulated terminal output on stdout.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sandbox_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     tracing::info!("Sandbox starting");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SANDBOX_LOG_LEVEL` or `RUST_LOG` | `warn` | Log filter directive |
//! | `SANDBOX_JSON_LOGS` | `false` | Emit JSON lines instead of text |
//! | `SANDBOX_LOG_TARGETS` | `true` | Include the module target in each line |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Failed to install log subscriber: {0}")]
    SubscriberInit(String),
}
