//! # Event Listeners
//!
//! The receiving side of the bus: listener ids, the handle returned by
//! `listen`, and the registry both sides share.

use crate::events::PublishedEvent;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Opaque token identifying one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// What a callback wants to happen to its registration afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerControl {
    /// Stay registered.
    Keep,
    /// Deregister now. Used by one-shot listeners.
    Remove,
}

/// Callback invoked for every event a listener accepts.
pub type Listener = dyn Fn(&PublishedEvent) -> ListenerControl + Send + Sync;

/// Registration-ordered listener table.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(ListenerId, Arc<Listener>)>,
}

impl ListenerRegistry {
    pub(crate) fn insert(&mut self, listener: Arc<Listener>) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        before != self.listeners.len()
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|(existing, _)| *existing == id)
    }

    pub(crate) fn snapshot(&self) -> Vec<(ListenerId, Arc<Listener>)> {
        self.listeners.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

/// Capability to deregister a listener.
///
/// Dropping the handle deregisters the listener. Deregistering twice, or
/// after a one-shot listener already removed itself, is a no-op.
pub struct ListenerHandle {
    id: ListenerId,
    registry: Weak<Mutex<ListenerRegistry>>,
}

impl ListenerHandle {
    pub(crate) fn new(id: ListenerId, registry: Weak<Mutex<ListenerRegistry>>) -> Self {
        Self { id, registry }
    }

    /// The registration this handle controls.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Whether the listener is still registered on a live bus.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.lock().contains(self.id))
    }

    /// Deregister the listener.
    ///
    /// Returns `true` if this call removed it.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry.lock().remove(self.id);
        if removed {
            debug!(listener = %self.id, "Listener deregistered");
        }
        removed
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Arc<Listener> {
        Arc::new(|_: &PublishedEvent| ListenerControl::Keep)
    }

    #[test]
    fn test_registry_preserves_order() {
        let mut registry = ListenerRegistry::default();
        let a = registry.insert(noop());
        let b = registry.insert(noop());
        let ids: Vec<ListenerId> = registry.snapshot().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = ListenerRegistry::default();
        let id = registry.insert(noop());
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_handle_drop_deregisters() {
        let registry = Arc::new(Mutex::new(ListenerRegistry::default()));
        let id = registry.lock().insert(noop());
        {
            let handle = ListenerHandle::new(id, Arc::downgrade(&registry));
            assert!(handle.is_active());
        }
        assert!(!registry.lock().contains(id));
    }

    #[test]
    fn test_handle_outlives_registry() {
        let registry = Arc::new(Mutex::new(ListenerRegistry::default()));
        let id = registry.lock().insert(noop());
        let handle = ListenerHandle::new(id, Arc::downgrade(&registry));
        drop(registry);
        assert!(!handle.is_active());
        assert!(!handle.unsubscribe());
    }
}
