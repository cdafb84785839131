//! # Event Publisher
//!
//! Defines the publishing side of the bus and the in-memory registry that
//! backs it.

use crate::events::{EventFilter, PublishedEvent};
use crate::subscriber::{Listener, ListenerControl, ListenerHandle, ListenerId, ListenerRegistry};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Trait for publishing events to the bus.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// Every listener registered when the call starts, and still registered
    /// when its turn comes, is invoked before this returns.
    ///
    /// # Returns
    ///
    /// The number of listeners that were invoked.
    fn publish(&self, event: PublishedEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the event bus.
///
/// Delivery is synchronous and in registration order. The registry lock is
/// never held while a listener runs.
pub struct InMemoryEventBus {
    /// Registered listeners, shared with every `ListenerHandle`.
    registry: Arc<Mutex<ListenerRegistry>>,

    /// Total events published.
    events_published: AtomicU64,
}

impl InMemoryEventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(ListenerRegistry::default())),
            events_published: AtomicU64::new(0),
        }
    }

    /// Register a listener for every event.
    ///
    /// The listener stays registered until the returned handle is dropped or
    /// unsubscribed, or the callback returns `ListenerControl::Remove`.
    #[must_use = "dropping the handle deregisters the listener"]
    pub fn listen<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&PublishedEvent) -> ListenerControl + Send + Sync + 'static,
    {
        let listener: Arc<Listener> = Arc::new(callback);
        let id = self.registry.lock().insert(listener);

        debug!(listener = %id, "New listener registered");

        ListenerHandle::new(id, Arc::downgrade(&self.registry))
    }

    /// Register a listener that only sees events matching `filter`.
    ///
    /// Events the filter rejects leave the registration untouched.
    #[must_use = "dropping the handle deregisters the listener"]
    pub fn listen_filtered<F>(&self, filter: EventFilter, callback: F) -> ListenerHandle
    where
        F: Fn(&PublishedEvent) -> ListenerControl + Send + Sync + 'static,
    {
        self.listen(move |event| {
            if filter.matches(event) {
                callback(event)
            } else {
                ListenerControl::Keep
            }
        })
    }

    /// Deregister a listener by id.
    ///
    /// Returns `false` if it was not registered. Safe to call from inside a
    /// callback, including for the listener currently running.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let removed = self.registry.lock().remove(id);
        if removed {
            debug!(listener = %id, "Listener deregistered");
        }
        removed
    }

    /// Get the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registry.lock().len()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: PublishedEvent) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let snapshot = self.registry.lock().snapshot();
        let mut invoked = 0;

        for (id, listener) in snapshot {
            // Deregistered by an earlier listener in this same publish.
            if !self.registry.lock().contains(id) {
                continue;
            }
            invoked += 1;
            if listener(&event) == ListenerControl::Remove {
                self.registry.lock().remove(id);
                debug!(listener = %id, topic = %event.topic, "One-shot listener removed");
            }
        }

        debug!(
            topic = %event.topic,
            source = %event.source,
            bytes = event.payload_len(),
            retained = event.retained,
            listeners = invoked,
            "Event published"
        );

        invoked
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
