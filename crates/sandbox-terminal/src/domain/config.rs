//! Sandbox configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use sandbox_terminal::domain::SandboxConfigBuilder;
//!
//! let config = SandboxConfigBuilder::new()
//!     .default_wait_ms(5_000)
//!     .read_only(true)
//!     .build()
//!     .expect("Valid config");
//! ```

use crate::error::ConfigError;
use sandbox_bus::validate_filter;
use serde::{Deserialize, Serialize};

/// Configuration shared by every terminal in one sandbox.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Round-trip timeout when `-W` is not given (ms)
    pub default_wait_ms: u64,
    /// Delay before the responder publishes its reply (ms)
    pub responder_delay_ms: u64,
    /// Request-topic filters the responder answers
    pub responder_topics: Vec<String>,
    /// Gap between narrated console lines (ms)
    pub narration_step_ms: u64,
    /// Broker log lines kept for late followers
    pub log_history: usize,
    /// History lines replayed when a follow starts
    pub follow_backlog: usize,
    /// Port Node-RED reports when `-p` is not given
    pub node_red_port: u16,
    /// Reject commands that publish or subscribe
    pub read_only: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            default_wait_ms: 3_000,
            responder_delay_ms: 500,
            responder_topics: vec!["requests/#".to_string()],
            narration_step_ms: 200,
            log_history: 200,
            follow_backlog: 10,
            node_red_port: 1880,
            read_only: false,
        }
    }
}

impl SandboxConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_wait_ms == 0 {
            return Err(ConfigError::ZeroWait);
        }

        if self.log_history == 0 {
            return Err(ConfigError::EmptyHistory);
        }

        if self.follow_backlog > self.log_history {
            return Err(ConfigError::BacklogTooLarge {
                backlog: self.follow_backlog,
                history: self.log_history,
            });
        }

        for filter in &self.responder_topics {
            validate_filter(filter).map_err(|reason| ConfigError::InvalidResponderFilter {
                filter: filter.clone(),
                reason,
            })?;
        }

        Ok(())
    }
}

/// Fluent builder for `SandboxConfig`
#[derive(Debug, Default)]
pub struct SandboxConfigBuilder {
    config: SandboxConfig,
}

impl SandboxConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_wait_ms(mut self, ms: u64) -> Self {
        self.config.default_wait_ms = ms;
        self
    }

    pub fn responder_delay_ms(mut self, ms: u64) -> Self {
        self.config.responder_delay_ms = ms;
        self
    }

    pub fn responder_topics<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.responder_topics = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn narration_step_ms(mut self, ms: u64) -> Self {
        self.config.narration_step_ms = ms;
        self
    }

    pub fn log_history(mut self, lines: usize) -> Self {
        self.config.log_history = lines;
        self
    }

    pub fn follow_backlog(mut self, lines: usize) -> Self {
        self.config.follow_backlog = lines;
        self
    }

    pub fn node_red_port(mut self, port: u16) -> Self {
        self.config.node_red_port = port;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.config.read_only = read_only;
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<SandboxConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
