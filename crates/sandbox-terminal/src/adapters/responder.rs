//! Responder Simulator
//!
//! Stands in for the device on the far side of a `mosquitto_rr` exchange.
//! It does not listen on the bus; the interpreter asks it to respond after
//! publishing a request it serves.

use crate::domain::{canned_reply, SandboxConfig};
use sandbox_bus::{EventFilter, EventPublisher, PublishedEvent, SimScheduler, TaskHandle};
use std::sync::Arc;
use tracing::debug;

/// Client id the responder publishes its replies under.
pub const RESPONDER_CLIENT_ID: &str = "sandbox-responder";

/// Simulated request/response peer
pub struct ResponderSimulator {
    /// Where replies are published
    bus: Arc<dyn EventPublisher>,
    /// Defers each reply by `delay_ms`
    scheduler: Arc<dyn SimScheduler>,
    delay_ms: u64,
    /// Request topics this responder answers
    serving: EventFilter,
}

impl ResponderSimulator {
    /// Create a responder from the sandbox configuration
    pub fn new(
        bus: Arc<dyn EventPublisher>,
        scheduler: Arc<dyn SimScheduler>,
        config: &SandboxConfig,
    ) -> Self {
        Self {
            bus,
            scheduler,
            delay_ms: config.responder_delay_ms,
            serving: EventFilter::patterns(config.responder_topics.iter().cloned()),
        }
    }

    /// Whether a request on `request_topic` gets an answer.
    pub fn serves(&self, request_topic: &str) -> bool {
        self.serving.selects(request_topic)
    }

    /// Schedule exactly one reply on `response_topic`.
    ///
    /// The reply is published `delay_ms` after this call whether or not
    /// anyone is still waiting for it.
    pub fn respond(&self, request_topic: &str, response_topic: &str, payload: &str) -> TaskHandle {
        let reply = canned_reply(payload);
        let delay = i64::try_from(self.delay_ms).unwrap_or(i64::MAX);
        let timestamp = self.scheduler.now() + chrono::Duration::milliseconds(delay);

        debug!(
            request_topic = %request_topic,
            response_topic = %response_topic,
            reply = %reply,
            delay_ms = self.delay_ms,
            "Responder reply scheduled"
        );

        let event = PublishedEvent::new(response_topic, reply, RESPONDER_CLIENT_ID, timestamp);
        let bus = Arc::clone(&self.bus);
        self.scheduler.schedule(
            self.delay_ms,
            Box::new(move || {
                bus.publish(event);
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;
    use sandbox_bus::{InMemoryEventBus, ListenerControl, ManualClock};

    fn setup() -> (Arc<InMemoryEventBus>, Arc<ManualClock>, ResponderSimulator) {
        let bus = Arc::new(InMemoryEventBus::new());
        let clock = Arc::new(ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH));
        let responder = ResponderSimulator::new(bus.clone(), clock.clone(), &SandboxConfig::default());
        (bus, clock, responder)
    }

    #[test]
    fn test_serves_default_filter() {
        let (_bus, _clock, responder) = setup();
        assert!(responder.serves("requests/x"));
        assert!(responder.serves("requests/a/b"));
        assert!(!responder.serves("commands/x"));
    }

    #[test]
    fn test_no_filters_serves_nothing() {
        let bus = Arc::new(InMemoryEventBus::new());
        let clock = Arc::new(ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH));
        let config = SandboxConfig {
            responder_topics: Vec::new(),
            ..SandboxConfig::default()
        };
        let responder = ResponderSimulator::new(bus, clock, &config);
        assert!(!responder.serves("requests/x"));
    }

    #[test]
    fn test_reply_published_after_delay() {
        let (bus, clock, responder) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _handle = bus.listen(move |event| {
            sink.lock().push(event.clone());
            ListenerControl::Keep
        });

        responder.respond("requests/x", "replies/x", "get");
        clock.advance(499);
        assert!(seen.lock().is_empty());

        clock.advance(1);
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].topic, "replies/x");
        assert_eq!(seen[0].payload, "RUN");
        assert_eq!(seen[0].source, RESPONDER_CLIENT_ID);
        assert_eq!(seen[0].timestamp.timestamp_millis(), 500);
    }

    #[test]
    fn test_cancelled_reply_never_published() {
        let (bus, clock, responder) = setup();
        let handle = responder.respond("requests/x", "replies/x", "stop");
        assert!(handle.cancel());

        clock.run_until_idle();
        assert_eq!(bus.events_published(), 0);
    }
}
