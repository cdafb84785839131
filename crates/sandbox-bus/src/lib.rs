//! # Sandbox Bus - In-Memory Publish/Subscribe Core
//!
//! The simulated broker every terminal talks to. There is no wire protocol
//! here: a publish is a synchronous fan-out to whatever listeners are
//! registered at that moment.
//!
//! ## Pieces
//!
//! ```text
//! ┌──────────────┐   publish()    ┌──────────────┐   callback   ┌──────────────┐
//! │  Terminal A  │ ─────────────▶ │  Event Bus   │ ───────────▶ │  Terminal B  │
//! └──────────────┘                └──────────────┘              └──────────────┘
//!        │                               ▲
//!        │ schedule()                    │ publish() (deferred)
//!        ▼                               │
//! ┌──────────────┐     advance()  ┌──────────────┐
//! │ ManualClock  │ ─────────────▶ │  Responder   │
//! └──────────────┘                └──────────────┘
//! ```
//!
//! - [`topic`]: MQTT-style filter matching (`+`, `#`)
//! - [`events`]: the immutable [`PublishedEvent`] and listener filters
//! - [`publisher`]: the [`InMemoryEventBus`] listener registry
//! - [`subscriber`]: listener handles and per-callback control
//! - [`scheduler`]: deferred callbacks against a logical clock
//!
//! ## Re-entrancy
//!
//! `publish` iterates a snapshot of the registry taken when it starts, and
//! re-checks each listener is still registered right before invoking it. A
//! listener may therefore publish, listen or unsubscribe from inside its own
//! callback.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod scheduler;
pub mod subscriber;
pub mod topic;

// Re-export main types
pub use events::{EventFilter, PublishedEvent, TopicSelector};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use scheduler::{ManualClock, SimScheduler, Task, TaskHandle};
pub use subscriber::{ListenerControl, ListenerHandle, ListenerId};
pub use topic::{matches, validate_filter, validate_topic, TopicError};

/// Topic level separator.
pub const TOPIC_SEPARATOR: char = '/';

/// Single-level wildcard.
pub const SINGLE_LEVEL_WILDCARD: &str = "+";

/// Multi-level wildcard.
pub const MULTI_LEVEL_WILDCARD: &str = "#";
