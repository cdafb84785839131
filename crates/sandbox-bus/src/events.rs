//! # Published Events
//!
//! The single event type that flows through the bus, plus the filter a
//! listener can attach to its registration.

use crate::topic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message published to the simulated broker.
///
/// Immutable once created. The bus hands every listener a shared reference
/// to the same instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedEvent {
    /// Publish target. Never contains wildcards.
    pub topic: String,
    /// Message body as typed by the user.
    pub payload: String,
    /// Retain flag. Only rendered, never replayed.
    pub retained: bool,
    /// Logical-clock time of the publish.
    pub timestamp: DateTime<Utc>,
    /// Client id of the publisher.
    pub source: String,
}

impl PublishedEvent {
    /// Create a non-retained event.
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        payload: impl Into<String>,
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retained: false,
            timestamp,
            source: source.into(),
        }
    }

    /// Builder-style method to set the retain flag.
    #[must_use]
    pub fn with_retained(mut self, retained: bool) -> Self {
        self.retained = retained;
        self
    }

    /// Payload size in bytes, as a broker would report it.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

/// How a filter selects on the event topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicSelector {
    /// Wildcard-aware subscription filter.
    Pattern(String),
    /// Byte-for-byte topic equality.
    Exact(String),
}

impl TopicSelector {
    /// Check the selector against a published topic.
    #[must_use]
    pub fn accepts(&self, topic_name: &str) -> bool {
        match self {
            Self::Pattern(filter) => topic::matches(filter, topic_name),
            Self::Exact(expected) => expected == topic_name,
        }
    }
}

/// Filter for registering a listener on a subset of events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Topic selectors. Empty means all topics.
    pub topics: Vec<TopicSelector>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for wildcard subscription patterns.
    #[must_use]
    pub fn patterns<I, S>(filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: filters
                .into_iter()
                .map(|f| TopicSelector::Pattern(f.into()))
                .collect(),
        }
    }

    /// Create a filter that only accepts one exact topic.
    #[must_use]
    pub fn exact(topic_name: impl Into<String>) -> Self {
        Self {
            topics: vec![TopicSelector::Exact(topic_name.into())],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &PublishedEvent) -> bool {
        self.topics.is_empty() || self.selects(&event.topic)
    }

    /// Whether any selector accepts `topic_name`.
    ///
    /// Unlike [`EventFilter::matches`], a filter with no selectors selects
    /// nothing.
    #[must_use]
    pub fn selects(&self, topic_name: &str) -> bool {
        self.topics.iter().any(|s| s.accepts(topic_name))
    }
}
