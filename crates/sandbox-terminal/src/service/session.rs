//! Terminal Session
//!
//! One simulated terminal: its line buffer, active subscriptions, pending
//! round trips, log follow and narrated output.
//!
//! ## Locking
//!
//! All of it lives in one [`SessionState`] behind a `parking_lot::Mutex`.
//! Bus callbacks and scheduled tasks capture a `Weak` reference to it, so a
//! dropped session is never kept alive by its own listeners. The lock is
//! never held while publishing or while the scheduler runs; it may be held
//! while a listener handle is dropped.

use crate::domain::{ContextTheme, Subscription};
use crate::error::CommandError;
use crate::ports::{OutputChunk, OutputCursor, SessionPhase, TerminalApi};
use crate::service::interpreter::CommandInterpreter;
use parking_lot::Mutex;
use sandbox_bus::{ListenerControl, ListenerHandle, PublishedEvent, TaskHandle};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tracing::{debug, info};
use uuid::Uuid;

/// Printed when Ctrl-C stops something.
pub const INTERRUPT_MARKER: &str = "^C";

/// One `mosquitto_rr` waiting for its reply or its timeout.
struct PendingRoundTrip {
    response_topic: String,
    listener: Option<ListenerHandle>,
    timeout: Option<TaskHandle>,
}

/// Mutable state of a terminal.
#[derive(Default)]
pub(crate) struct SessionState {
    lines: Vec<String>,
    /// Bumped by every `clear`
    clear_epoch: u64,
    subscriptions: Vec<Subscription>,
    next_round_trip: u64,
    round_trips: BTreeMap<u64, PendingRoundTrip>,
    follow: Option<ListenerHandle>,
    narration: Vec<TaskHandle>,
}

impl SessionState {
    pub(crate) fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub(crate) fn extend(&mut self, lines: impl IntoIterator<Item = String>) {
        self.lines.extend(lines);
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
        self.clear_epoch += 1;
    }

    pub(crate) fn subscribe(&mut self, subscription: Subscription) {
        self.push(subscription.confirmation());
        self.subscriptions.push(subscription);
    }

    /// Hand an event to every matching subscription.
    ///
    /// A subscription that reaches its count limit is removed in the same
    /// pass that prints its last delivery.
    pub(crate) fn deliver(&mut self, event: &PublishedEvent) -> usize {
        let mut output = Vec::new();
        let mut delivered = 0;

        self.subscriptions.retain_mut(|subscription| {
            if !subscription.accepts(&event.topic) {
                return true;
            }
            delivered += 1;
            output.push(subscription.render(event));
            if subscription.record_delivery() {
                output.push(subscription.removal_notice());
                false
            } else {
                true
            }
        });

        self.lines.extend(output);
        delivered
    }

    pub(crate) fn open_round_trip(&mut self, response_topic: &str) -> u64 {
        self.next_round_trip += 1;
        let id = self.next_round_trip;
        self.round_trips.insert(
            id,
            PendingRoundTrip {
                response_topic: response_topic.to_string(),
                listener: None,
                timeout: None,
            },
        );
        id
    }

    /// Attach the reply listener and timeout to an open round trip.
    ///
    /// If the round trip already settled, both are released immediately.
    pub(crate) fn arm_round_trip(&mut self, id: u64, listener: ListenerHandle, timeout: TaskHandle) {
        match self.round_trips.get_mut(&id) {
            Some(pending) => {
                pending.listener = Some(listener);
                pending.timeout = Some(timeout);
            }
            None => {
                timeout.cancel();
            }
        }
    }

    /// Settle a round trip with its reply. No-op if it already settled.
    pub(crate) fn resolve_round_trip(&mut self, id: u64, payload: &str) -> bool {
        let Some(pending) = self.round_trips.remove(&id) else {
            return false;
        };
        if let Some(timeout) = &pending.timeout {
            timeout.cancel();
        }
        self.push(payload);
        debug!(round_trip = id, topic = %pending.response_topic, "Round trip answered");
        true
    }

    /// Settle a round trip with a timeout. No-op if it already settled.
    pub(crate) fn expire_round_trip(&mut self, id: u64, waited_ms: u64) -> bool {
        let Some(pending) = self.round_trips.remove(&id) else {
            return false;
        };
        debug!(round_trip = id, topic = %pending.response_topic, "Round trip timed out");
        self.push(
            CommandError::TimeoutExpired {
                topic: pending.response_topic,
                waited_ms,
            }
            .to_string(),
        );
        true
    }

    pub(crate) fn set_follow(&mut self, handle: ListenerHandle) {
        self.follow = Some(handle);
    }

    pub(crate) fn add_narration(&mut self, tasks: impl IntoIterator<Item = TaskHandle>) {
        self.narration.retain(|task| !task.is_settled());
        self.narration.extend(tasks);
    }

    /// Stop the log follow and pending narration.
    fn interrupt(&mut self) -> bool {
        let mut stopped = self.follow.take().is_some();
        for task in self.narration.drain(..) {
            stopped |= task.cancel();
        }
        if stopped {
            self.push(INTERRUPT_MARKER);
        }
        stopped
    }

    /// Release every listener and cancel every task the session owns.
    fn shutdown(&mut self) {
        self.subscriptions.clear();
        self.follow = None;
        for task in self.narration.drain(..) {
            task.cancel();
        }
        for (_, pending) in std::mem::take(&mut self.round_trips) {
            if let Some(timeout) = pending.timeout {
                timeout.cancel();
            }
        }
    }

    fn phase(&self) -> SessionPhase {
        match self.round_trips.len() {
            0 => SessionPhase::Idle,
            pending => SessionPhase::AwaitingResponse { pending },
        }
    }

    fn output_since(&self, cursor: OutputCursor) -> OutputChunk {
        let cleared = cursor.epoch != self.clear_epoch;
        let start = if cleared { 0 } else { cursor.offset };
        OutputChunk {
            cleared,
            lines: self.lines.get(start..).map(<[String]>::to_vec).unwrap_or_default(),
            cursor: OutputCursor {
                epoch: self.clear_epoch,
                offset: self.lines.len(),
            },
        }
    }
}

/// A simulated terminal attached to the sandbox bus.
///
/// Dropping the session deregisters all of its bus listeners and cancels
/// all of its scheduled tasks.
pub struct TerminalSession {
    client_id: String,
    theme: ContextTheme,
    state: Arc<Mutex<SessionState>>,
    interpreter: CommandInterpreter,
    /// Delivers bus events to the session's subscriptions
    _dispatch: ListenerHandle,
}

impl TerminalSession {
    /// Open a terminal on the interpreter's bus.
    pub fn new(interpreter: CommandInterpreter, theme: ContextTheme) -> Self {
        let uuid = Uuid::new_v4().simple().to_string().to_uppercase();
        let client_id = format!("auto-{}", &uuid[..8]);
        let state = Arc::new(Mutex::new(SessionState::default()));

        let weak = Arc::downgrade(&state);
        let dispatch = interpreter.bus().listen(move |event| match weak.upgrade() {
            Some(state) => {
                state.lock().deliver(event);
                ListenerControl::Keep
            }
            None => ListenerControl::Remove,
        });

        info!(client = %client_id, theme = ?theme, "Terminal session opened");

        Self {
            client_id,
            theme,
            state,
            interpreter,
            _dispatch: dispatch,
        }
    }

    /// Client id this terminal publishes under.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn theme(&self) -> ContextTheme {
        self.theme
    }

    /// Filters of the active subscriptions, oldest first.
    pub fn subscriptions(&self) -> Vec<String> {
        self.state
            .lock()
            .subscriptions
            .iter()
            .map(|s| s.filter().to_string())
            .collect()
    }

    /// Whether a log follow is running.
    pub fn is_following(&self) -> bool {
        self.state.lock().follow.is_some()
    }

    pub(crate) fn state(&self) -> &Mutex<SessionState> {
        &self.state
    }

    pub(crate) fn weak_state(&self) -> Weak<Mutex<SessionState>> {
        Arc::downgrade(&self.state)
    }
}

impl TerminalApi for TerminalSession {
    fn execute(&self, line: &str) {
        self.interpreter.execute(line, self);
    }

    fn interrupt(&self) {
        if self.state.lock().interrupt() {
            debug!(client = %self.client_id, "Interrupted");
        }
    }

    fn lines(&self) -> Vec<String> {
        self.state.lock().lines.clone()
    }

    fn output_since(&self, cursor: OutputCursor) -> OutputChunk {
        self.state.lock().output_since(cursor)
    }

    fn phase(&self) -> SessionPhase {
        self.state.lock().phase()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.state.lock().shutdown();
        info!(client = %self.client_id, "Terminal session closed");
    }
}

impl std::fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSession")
            .field("client_id", &self.client_id)
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}
