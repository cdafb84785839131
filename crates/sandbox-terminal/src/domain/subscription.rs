//! Per-terminal subscription state

use sandbox_bus::{matches, PublishedEvent};

/// One active `mosquitto_sub` in a terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    filter: String,
    verbose: bool,
    count_max: Option<u32>,
    delivered: u32,
}

impl Subscription {
    pub fn new(filter: impl Into<String>, verbose: bool, count_max: Option<u32>) -> Self {
        Self {
            filter: filter.into(),
            verbose,
            count_max,
            delivered: 0,
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn delivered(&self) -> u32 {
        self.delivered
    }

    /// Whether a message on `topic` is delivered to this subscription.
    pub fn accepts(&self, topic: &str) -> bool {
        matches(&self.filter, topic)
    }

    /// Output line for one delivered message.
    pub fn render(&self, event: &PublishedEvent) -> String {
        if self.verbose {
            format!("{} {}", event.topic, event.payload)
        } else {
            event.payload.clone()
        }
    }

    /// Count a delivery. Returns `true` once the count limit is reached.
    pub fn record_delivery(&mut self) -> bool {
        self.delivered = self.delivered.saturating_add(1);
        self.count_max.is_some_and(|max| self.delivered >= max)
    }

    /// Line printed when the subscription starts.
    pub fn confirmation(&self) -> String {
        match self.count_max {
            Some(max) => format!(
                "Subscribed to {} (exits after {} message(s))",
                self.filter, max
            ),
            None => format!("Subscribed to {}", self.filter),
        }
    }

    /// Line printed when the count limit removes the subscription.
    pub fn removal_notice(&self) -> String {
        format!(
            "Unsubscribed from {} after {} message(s)",
            self.filter, self.delivered
        )
    }
}
