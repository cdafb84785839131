//! Broker Log
//!
//! Rolling history of the lines a verbose broker would have written. A log
//! follow replays the tail of it before streaming new lines.

use crate::domain::{format_publish, startup_lines};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sandbox_bus::{InMemoryEventBus, ListenerControl, ListenerHandle, PublishedEvent};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// One line of broker output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub line: String,
}

/// Bounded broker log history
pub struct BrokerLog {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl BrokerLog {
    /// Create a log holding at most `capacity` lines, seeded with the
    /// broker start-up lines.
    pub fn new(capacity: usize, started: DateTime<Utc>) -> Self {
        let log = Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        };
        for line in startup_lines(started) {
            log.push(LogEntry {
                timestamp: started,
                line,
            });
        }
        log
    }

    /// Record a publish.
    pub fn record(&self, event: &PublishedEvent) {
        self.push(LogEntry {
            timestamp: event.timestamp,
            line: format_publish(event),
        });
    }

    /// The last `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> Vec<String> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(count);
        entries.iter().skip(skip).map(|e| e.line.clone()).collect()
    }

    /// Every retained line, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.tail(self.capacity)
    }

    /// Every retained entry, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Record every event published on `bus` from now on.
    ///
    /// Recording stops when the handle is dropped or the log itself is.
    #[must_use = "dropping the handle stops recording"]
    pub fn attach(self: &Arc<Self>, bus: &InMemoryEventBus) -> ListenerHandle {
        let log = Arc::downgrade(self);
        bus.listen(move |event| match log.upgrade() {
            Some(log) => {
                log.record(event);
                ListenerControl::Keep
            }
            None => ListenerControl::Remove,
        })
    }

    fn push(&self, entry: LogEntry) {
        trace!(line = %entry.line, "Broker log line");
        let mut entries = self.entries.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_bus::EventPublisher;

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    #[test]
    fn test_seeded_with_startup_lines() {
        let log = BrokerLog::new(200, epoch());
        let history = log.history();
        assert_eq!(history.len(), 5);
        assert!(history[0].contains("starting"));
    }

    #[test]
    fn test_history_is_bounded() {
        let log = BrokerLog::new(3, epoch());
        for i in 0..10 {
            log.record(&PublishedEvent::new(format!("t/{i}"), "x", "c", epoch()));
        }
        let history = log.history();
        assert_eq!(history.len(), 3);
        assert!(history[2].contains("'t/9'"));
        assert!(history[0].contains("'t/7'"));
    }

    #[test]
    fn test_tail_returns_newest() {
        let log = BrokerLog::new(10, epoch());
        log.record(&PublishedEvent::new("a", "x", "c", epoch()));
        let tail = log.tail(2);
        assert_eq!(tail.len(), 2);
        assert!(tail[0].ends_with("running"));
        assert!(tail[1].contains("'a'"));
    }

    #[test]
    fn test_attach_records_bus_events() {
        let bus = InMemoryEventBus::new();
        let log = Arc::new(BrokerLog::new(10, epoch()));
        let handle = log.attach(&bus);

        bus.publish(PublishedEvent::new("sensors/t", "21.5", "auto-1", epoch()));
        assert!(log.history().last().is_some_and(|l| l.contains("'sensors/t'")));

        drop(handle);
        bus.publish(PublishedEvent::new("after", "x", "auto-1", epoch()));
        assert!(!log.history().iter().any(|l| l.contains("'after'")));
    }

    #[test]
    fn test_entries_serialize() {
        let log = BrokerLog::new(10, epoch());
        let json = serde_json::to_string(&log.entries()).expect("serialize");
        let back: Vec<LogEntry> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, log.entries());
    }
}
