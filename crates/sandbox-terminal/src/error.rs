//! Error types for the terminal subsystem

use sandbox_bus::TopicError;
use thiserror::Error;

/// Errors a command can end in.
///
/// None of these are fatal. Each one is rendered as exactly one terminal line
/// through its `Display` implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Error: missing required argument {flag} ({what})")]
    MissingArgument {
        flag: &'static str,
        what: &'static str,
    },

    #[error("{program}: command not found")]
    UnrecognizedCommand { program: String },

    #[error("Timed out after {waited_ms}ms waiting for a response on {topic}")]
    TimeoutExpired { topic: String, waited_ms: u64 },

    #[error("Error: invalid value '{value}' for {flag}")]
    InvalidValue { flag: &'static str, value: String },

    #[error("Error: invalid topic '{topic}': {reason}")]
    InvalidTopic { topic: String, reason: TopicError },

    #[error("{command}: disabled in read-only mode")]
    Disabled { command: String },
}

/// Errors from validating a `SandboxConfig`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("default wait must be greater than zero")]
    ZeroWait,

    #[error("broker log history must hold at least one line")]
    EmptyHistory,

    #[error("follow backlog {backlog} exceeds log history {history}")]
    BacklogTooLarge { backlog: usize, history: usize },

    #[error("invalid responder filter '{filter}': {reason}")]
    InvalidResponderFilter { filter: String, reason: TopicError },
}
