//! # Deferred Callbacks
//!
//! Every delay in the sandbox (responder replies, round-trip timeouts,
//! narrated console output) goes through [`SimScheduler`]. The only
//! implementation is [`ManualClock`], a logical millisecond clock that runs
//! due tasks when it is advanced. Tests advance it by hand; the console
//! advances it from wall-clock time.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

/// A deferred callback.
pub type Task = Box<dyn FnOnce() + Send>;

/// Scheduler port shared by every component that defers work.
pub trait SimScheduler: Send + Sync {
    /// Current logical time as a wall-clock timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds elapsed on the logical clock.
    fn elapsed_ms(&self) -> u64;

    /// Run `task` once `delay_ms` logical milliseconds have passed.
    fn schedule(&self, delay_ms: u64, task: Task) -> TaskHandle;
}

/// Cancellation handle for one scheduled task.
///
/// A task settles exactly once: either it runs, or it is cancelled. Cloning
/// the handle shares the same settlement flag.
#[derive(Clone)]
pub struct TaskHandle {
    id: u64,
    settled: Arc<AtomicBool>,
}

impl TaskHandle {
    /// Cancel the task.
    ///
    /// Returns `true` if this call stopped it from running, `false` if it had
    /// already run or been cancelled.
    pub fn cancel(&self) -> bool {
        let stopped = !self.settled.swap(true, Ordering::AcqRel);
        if stopped {
            trace!(task = self.id, "Task cancelled");
        }
        stopped
    }

    /// Whether the task has run or been cancelled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("settled", &self.is_settled())
            .finish()
    }
}

struct ScheduledTask {
    settled: Arc<AtomicBool>,
    task: Task,
}

#[derive(Default)]
struct ClockState {
    now_ms: u64,
    next_seq: u64,
    /// Keyed by (due time, scheduling order).
    queue: BTreeMap<(u64, u64), ScheduledTask>,
}

impl ClockState {
    /// Drop cancelled tasks that are still waiting for their due time.
    fn prune_settled(&mut self) {
        self.queue
            .retain(|_, scheduled| !scheduled.settled.load(Ordering::Acquire));
    }
}

/// Logical clock scheduler.
///
/// Tasks due at the same millisecond run in the order they were scheduled.
/// The clock lock is released while a task runs, so tasks may schedule
/// further tasks; those run in the same `advance` call if they fall due
/// inside the advanced window.
pub struct ManualClock {
    origin: DateTime<Utc>,
    state: Mutex<ClockState>,
}

impl ManualClock {
    /// Create a clock whose logical zero is the current wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_origin(Utc::now())
    }

    /// Create a clock whose logical zero is `origin`.
    #[must_use]
    pub fn with_origin(origin: DateTime<Utc>) -> Self {
        Self {
            origin,
            state: Mutex::new(ClockState::default()),
        }
    }

    /// Advance the clock by `delta_ms`, running every task that falls due.
    ///
    /// Returns the number of tasks that ran.
    pub fn advance(&self, delta_ms: u64) -> usize {
        let target = self.state.lock().now_ms.saturating_add(delta_ms);
        self.advance_to(target)
    }

    /// Advance the clock to `target_ms`, running every task that falls due.
    ///
    /// A target in the past leaves the clock where it is.
    pub fn advance_to(&self, target_ms: u64) -> usize {
        let mut ran = 0;

        loop {
            let next = {
                let mut state = self.state.lock();
                let due = state.queue.first_key_value().map(|(&(due, _), _)| due);
                match due {
                    Some(due) if due <= target_ms => {
                        state.now_ms = state.now_ms.max(due);
                        state.queue.pop_first().map(|(_, scheduled)| scheduled)
                    }
                    _ => {
                        state.now_ms = state.now_ms.max(target_ms);
                        None
                    }
                }
            };

            let Some(scheduled) = next else {
                break;
            };
            if !scheduled.settled.swap(true, Ordering::AcqRel) {
                (scheduled.task)();
                ran += 1;
            }
        }

        ran
    }

    /// Advance until no live task remains queued.
    ///
    /// Returns the number of tasks that ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(last_due) = self.last_due() {
            ran += self.advance_to(last_due);
        }
        ran
    }

    /// Number of queued tasks that have not been cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .queue
            .values()
            .filter(|scheduled| !scheduled.settled.load(Ordering::Acquire))
            .count()
    }

    fn last_due(&self) -> Option<u64> {
        let mut state = self.state.lock();
        state.prune_settled();
        state.queue.last_key_value().map(|(&(due, _), _)| due)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimScheduler for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.elapsed_ms();
        self.origin + Duration::milliseconds(i64::try_from(elapsed).unwrap_or(i64::MAX))
    }

    fn elapsed_ms(&self) -> u64 {
        self.state.lock().now_ms
    }

    fn schedule(&self, delay_ms: u64, task: Task) -> TaskHandle {
        let settled = Arc::new(AtomicBool::new(false));
        let mut state = self.state.lock();
        state.prune_settled();

        let due = state.now_ms.saturating_add(delay_ms);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.queue.insert(
            (due, seq),
            ScheduledTask {
                settled: settled.clone(),
                task,
            },
        );

        trace!(task = seq, due_ms = due, "Task scheduled");

        TaskHandle { id: seq, settled }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(
        clock: &ManualClock,
        log: &Arc<Mutex<Vec<&'static str>>>,
        delay: u64,
        label: &'static str,
    ) -> TaskHandle {
        let log = log.clone();
        clock.schedule(delay, Box::new(move || log.lock().push(label)))
    }

    #[test]
    fn test_tasks_run_when_due() {
        let clock = ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH);
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&clock, &log, 100, "a");

        assert_eq!(clock.advance(99), 0);
        assert!(log.lock().is_empty());
        assert_eq!(clock.advance(1), 1);
        assert_eq!(*log.lock(), vec!["a"]);
        assert_eq!(clock.elapsed_ms(), 100);
    }

    #[test]
    fn test_cancelled_tasks_pruned_on_schedule() {
        let clock = ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH);
        let log = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..10 {
            assert!(recording(&clock, &log, 60_000, "timeout").cancel());
        }
        assert_eq!(clock.state.lock().queue.len(), 10);

        recording(&clock, &log, 10, "live");
        assert_eq!(clock.state.lock().queue.len(), 1);
        assert_eq!(clock.pending(), 1);

        clock.advance(10);
        assert_eq!(*log.lock(), vec!["live"]);
    }

    #[test]
    fn test_due_order_then_schedule_order() {
        let clock = ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH);
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&clock, &log, 50, "late");
        recording(&clock, &log, 10, "first");
        recording(&clock, &log, 10, "second");

        clock.advance(100);
        assert_eq!(*log.lock(), vec!["first", "second", "late"]);
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let clock = ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH);
        let log = Arc::new(Mutex::new(Vec::new()));
        let handle = recording(&clock, &log, 10, "a");

        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.advance(10), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_cancel_after_run_is_noop() {
        let clock = ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH);
        let log = Arc::new(Mutex::new(Vec::new()));
        let handle = recording(&clock, &log, 0, "a");

        clock.advance(0);
        assert!(handle.is_settled());
        assert!(!handle.cancel());
    }

    #[test]
    fn test_task_cancels_sibling_due_same_tick() {
        let clock = Arc::new(ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH));
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim: Arc<Mutex<Option<TaskHandle>>> = Arc::new(Mutex::new(None));

        let slot = victim.clone();
        clock.schedule(
            5,
            Box::new(move || {
                if let Some(handle) = slot.lock().take() {
                    handle.cancel();
                }
            }),
        );
        *victim.lock() = Some(recording(&clock, &log, 5, "victim"));

        assert_eq!(clock.advance(5), 1);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_nested_schedule_inside_window() {
        let clock = Arc::new(ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH));
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_clock = Arc::downgrade(&clock);
        let inner_log = log.clone();
        clock.schedule(
            10,
            Box::new(move || {
                inner_log.lock().push("outer");
                if let Some(clock) = inner_clock.upgrade() {
                    let log = inner_log.clone();
                    clock.schedule(10, Box::new(move || log.lock().push("inner")));
                }
            }),
        );

        assert_eq!(clock.advance(25), 2);
        assert_eq!(*log.lock(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_run_until_idle() {
        let clock = ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH);
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&clock, &log, 3_000, "timeout");
        recording(&clock, &log, 500, "reply");

        assert_eq!(clock.run_until_idle(), 2);
        assert_eq!(clock.elapsed_ms(), 3_000);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_now_tracks_origin() {
        let origin = DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_700_000_000);
        let clock = ManualClock::with_origin(origin);
        clock.advance(2_500);
        assert_eq!(clock.now().timestamp(), 1_700_000_002);
    }

    #[test]
    fn test_advance_to_past_is_noop() {
        let clock = ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH);
        clock.advance(100);
        clock.advance_to(40);
        assert_eq!(clock.elapsed_ms(), 100);
    }
}
