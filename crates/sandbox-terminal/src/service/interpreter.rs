//! Command Interpreter
//!
//! Runs parsed command lines against the bus, the scheduler and the
//! responder. Holds no state of its own: everything a command leaves behind
//! lives in the session it ran in.

use crate::adapters::{BrokerLog, ResponderSimulator};
use crate::domain::transcript::{
    help_lines, node_red_startup_lines, npm_install_lines, status_block,
};
use crate::domain::{
    format_publish, Command, PublishArgs, RequestArgs, SandboxConfig, SubscribeArgs,
    Subscription, LOG_HEADER,
};
use crate::error::CommandError;
use crate::service::session::TerminalSession;
use sandbox_bus::{
    EventFilter, EventPublisher, InMemoryEventBus, ListenerControl, PublishedEvent, SimScheduler,
    TaskHandle,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared, stateless command runner.
///
/// Cheap to clone; every terminal in a sandbox holds a clone.
#[derive(Clone)]
pub struct CommandInterpreter {
    config: Arc<SandboxConfig>,
    bus: Arc<InMemoryEventBus>,
    scheduler: Arc<dyn SimScheduler>,
    responder: Arc<ResponderSimulator>,
    broker_log: Arc<BrokerLog>,
}

impl CommandInterpreter {
    pub fn new(
        config: Arc<SandboxConfig>,
        bus: Arc<InMemoryEventBus>,
        scheduler: Arc<dyn SimScheduler>,
        responder: Arc<ResponderSimulator>,
        broker_log: Arc<BrokerLog>,
    ) -> Self {
        Self {
            config,
            bus,
            scheduler,
            responder,
            broker_log,
        }
    }

    pub(crate) fn bus(&self) -> &InMemoryEventBus {
        &self.bus
    }

    /// Run one command line in `session`.
    ///
    /// A failed command prints exactly one line and changes nothing else.
    pub fn execute(&self, raw: &str, session: &TerminalSession) {
        if let Err(error) = self.run(raw, session) {
            warn!(
                client = %session.client_id(),
                command = %raw.trim(),
                error = %error,
                "Command rejected"
            );
            session.state().lock().push(error.to_string());
        }
    }

    fn run(&self, raw: &str, session: &TerminalSession) -> Result<(), CommandError> {
        let command = Command::parse(raw)?;

        if self.config.read_only && command.is_mutating() {
            return Err(CommandError::Disabled {
                command: command.program().to_string(),
            });
        }

        debug!(client = %session.client_id(), program = command.program(), "Executing command");

        match command {
            Command::Empty => {}
            Command::Clear => session.state().lock().clear(),
            Command::Help => {
                let lines = help_lines(session.theme(), self.config.read_only);
                session.state().lock().extend(lines);
            }
            Command::Publish(args) => self.publish(args, session),
            Command::Subscribe(args) => self.subscribe(args, session),
            Command::RequestResponse(args) => self.request_response(args, session),
            Command::Status => session.state().lock().extend(status_block()),
            Command::FollowLog => self.follow_log(session),
            Command::InstallNodeRed => self.narrate(npm_install_lines(), session),
            Command::StartNodeRed { port } => {
                let port = port.unwrap_or(self.config.node_red_port);
                let lines =
                    node_red_startup_lines(port, self.scheduler.now(), self.config.narration_step_ms);
                self.narrate(lines, session);
            }
        }

        Ok(())
    }

    fn publish(&self, args: PublishArgs, session: &TerminalSession) {
        let event = PublishedEvent::new(
            args.topic,
            args.payload,
            session.client_id(),
            self.scheduler.now(),
        )
        .with_retained(args.retain);
        self.bus.publish(event);
    }

    fn subscribe(&self, args: SubscribeArgs, session: &TerminalSession) {
        debug!(client = %session.client_id(), filter = %args.filter, "Subscription added");
        session
            .state()
            .lock()
            .subscribe(Subscription::new(args.filter, args.verbose, args.count));
    }

    /// Publish a request and wait for the first reply or the timeout,
    /// whichever fires first.
    ///
    /// The reply listener is registered before the request goes out, and the
    /// responder is scheduled before the timeout, so a reply due at the same
    /// millisecond as the timeout wins.
    fn request_response(&self, args: RequestArgs, session: &TerminalSession) {
        let wait_ms = args.wait_ms.unwrap_or(self.config.default_wait_ms);
        let id = session.state().lock().open_round_trip(&args.response_topic);

        let state = session.weak_state();
        let listener = self.bus.listen_filtered(
            EventFilter::exact(args.response_topic.clone()),
            move |event| {
                if let Some(state) = state.upgrade() {
                    state.lock().resolve_round_trip(id, &event.payload);
                }
                ListenerControl::Remove
            },
        );

        debug!(
            client = %session.client_id(),
            request_topic = %args.request_topic,
            response_topic = %args.response_topic,
            wait_ms,
            "Round trip started"
        );

        self.bus.publish(PublishedEvent::new(
            args.request_topic.clone(),
            args.payload.clone(),
            session.client_id(),
            self.scheduler.now(),
        ));

        if self.responder.serves(&args.request_topic) {
            self.responder
                .respond(&args.request_topic, &args.response_topic, &args.payload);
        }

        let state = session.weak_state();
        let timeout = self.scheduler.schedule(
            wait_ms,
            Box::new(move || {
                if let Some(state) = state.upgrade() {
                    state.lock().expire_round_trip(id, wait_ms);
                }
            }),
        );

        session.state().lock().arm_round_trip(id, listener, timeout);
    }

    /// Print the log header and recent history, then stream every new
    /// publish as a broker log line until interrupted.
    fn follow_log(&self, session: &TerminalSession) {
        let backlog = self.broker_log.tail(self.config.follow_backlog);
        {
            let mut state = session.state().lock();
            state.push(LOG_HEADER);
            state.extend(backlog);
        }

        let state = session.weak_state();
        let handle = self.bus.listen(move |event| match state.upgrade() {
            Some(state) => {
                state.lock().push(format_publish(event));
                ListenerControl::Keep
            }
            None => ListenerControl::Remove,
        });
        session.state().lock().set_follow(handle);
    }

    /// Print the first line now and each following line one narration
    /// step after the previous one.
    fn narrate(&self, lines: Vec<String>, session: &TerminalSession) {
        let step = self.config.narration_step_ms;
        let mut lines = lines.into_iter();
        let Some(first) = lines.next() else {
            return;
        };
        session.state().lock().push(first);

        let tasks: Vec<TaskHandle> = lines
            .enumerate()
            .map(|(i, line)| {
                let state = session.weak_state();
                let delay = step.saturating_mul(i as u64 + 1);
                self.scheduler.schedule(
                    delay,
                    Box::new(move || {
                        if let Some(state) = state.upgrade() {
                            state.lock().push(line);
                        }
                    }),
                )
            })
            .collect();

        session.state().lock().add_narration(tasks);
    }
}
