//! Domain Layer - command grammar and terminal text
//!
//! This layer contains:
//! - Tokenizing and flag scanning
//! - The command grammar table
//! - Subscription bookkeeping
//! - Responder reply mapping
//! - Broker log and console transcripts
//! - Configuration
//!
//! RULES:
//! - No bus or scheduler access
//! - Pure functions where possible

pub mod args;
pub mod command;
pub mod config;
pub mod log_line;
pub mod reply;
pub mod subscription;
pub mod transcript;

pub use command::{Command, PublishArgs, RequestArgs, SubscribeArgs};
pub use config::{SandboxConfig, SandboxConfigBuilder};
pub use log_line::{format_publish, startup_lines, LOG_HEADER};
pub use reply::canned_reply;
pub use subscription::Subscription;

use serde::{Deserialize, Serialize};

/// Which lesson a terminal belongs to. Only changes the `help` text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextTheme {
    /// Broker lesson
    #[default]
    Primary,
    /// Node-RED lesson
    Secondary,
}
