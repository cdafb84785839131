//! # Sandbox Container
//!
//! Owns everything the terminals of one sandbox share and wires it
//! together: the bus, the logical clock, the responder and the broker log.
//!
//! ```text
//! SandboxConfig ─▶ InMemoryEventBus ─▶ BrokerLog (attached first)
//!                  ManualClock      ─▶ ResponderSimulator
//!                                   ─▶ CommandInterpreter ─▶ TerminalSession*
//! ```

use crate::adapters::{BrokerLog, ResponderSimulator};
use crate::domain::{ContextTheme, SandboxConfig};
use crate::error::ConfigError;
use crate::service::{CommandInterpreter, TerminalSession};
use sandbox_bus::{InMemoryEventBus, ListenerHandle, ManualClock, SimScheduler};
use std::sync::Arc;
use tracing::info;

/// Shared wiring for one sandbox.
pub struct SandboxContainer {
    config: Arc<SandboxConfig>,
    bus: Arc<InMemoryEventBus>,
    clock: Arc<ManualClock>,
    broker_log: Arc<BrokerLog>,
    interpreter: CommandInterpreter,
    _log_recorder: ListenerHandle,
}

impl SandboxContainer {
    /// Build a sandbox whose logical clock starts at the current time.
    pub fn new(config: SandboxConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(ManualClock::new()))
    }

    /// Build a sandbox on an existing clock.
    pub fn with_clock(config: SandboxConfig, clock: Arc<ManualClock>) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);

        let bus = Arc::new(InMemoryEventBus::new());
        let scheduler: Arc<dyn SimScheduler> = clock.clone();

        let broker_log = Arc::new(BrokerLog::new(config.log_history, scheduler.now()));
        let log_recorder = broker_log.attach(&bus);

        let responder = Arc::new(ResponderSimulator::new(
            bus.clone(),
            scheduler.clone(),
            &config,
        ));
        let interpreter = CommandInterpreter::new(
            config.clone(),
            bus.clone(),
            scheduler,
            responder,
            broker_log.clone(),
        );

        info!(
            read_only = config.read_only,
            default_wait_ms = config.default_wait_ms,
            responder_delay_ms = config.responder_delay_ms,
            "Sandbox initialized"
        );

        Ok(Self {
            config,
            bus,
            clock,
            broker_log,
            interpreter,
            _log_recorder: log_recorder,
        })
    }

    /// Open a new terminal attached to this sandbox.
    pub fn open_terminal(&self, theme: ContextTheme) -> TerminalSession {
        TerminalSession::new(self.interpreter.clone(), theme)
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn clock(&self) -> &Arc<ManualClock> {
        &self.clock
    }

    pub fn broker_log(&self) -> &Arc<BrokerLog> {
        &self.broker_log
    }

    /// Advance the logical clock by `delta_ms`. Returns the tasks run.
    pub fn advance(&self, delta_ms: u64) -> usize {
        self.clock.advance(delta_ms)
    }

    /// Advance the logical clock to `target_ms`. Returns the tasks run.
    pub fn advance_to(&self, target_ms: u64) -> usize {
        self.clock.advance_to(target_ms)
    }

    /// Run every pending task. Returns the tasks run.
    pub fn run_until_idle(&self) -> usize {
        self.clock.run_until_idle()
    }
}
