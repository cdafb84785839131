//! # Topic Matching
//!
//! Decides whether a subscription filter matches a published topic.
//!
//! Both strings are split on `/` and compared segment by segment. Empty
//! segments (from leading, trailing or doubled slashes) are ordinary
//! segments: `/a` has two levels, the first of which is `""`.

use crate::{MULTI_LEVEL_WILDCARD, SINGLE_LEVEL_WILDCARD, TOPIC_SEPARATOR};
use thiserror::Error;

/// Reasons a topic or filter is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopicError {
    /// Topic or filter is the empty string.
    #[error("topic must not be empty")]
    Empty,

    /// A publish target contains a wildcard character.
    #[error("wildcards are not allowed in a publish topic")]
    WildcardInTopic,

    /// A wildcard shares a level with other characters (`a/b+`).
    #[error("wildcard must occupy a whole topic level")]
    PartialWildcard,

    /// `#` appears before the last level.
    #[error("'#' must be the last level of a filter")]
    MultiLevelNotLast,
}

/// Returns true when `topic` is matched by `filter`.
///
/// `#` matches the current level and everything below it, regardless of how
/// many levels remain. `+` matches exactly one level. Any other filter level
/// must equal the topic level. Without a `#`, the topic must have exactly as
/// many levels as the filter.
#[must_use]
pub fn matches(filter: &str, topic: &str) -> bool {
    let mut topic_levels = topic.split(TOPIC_SEPARATOR);

    for filter_level in filter.split(TOPIC_SEPARATOR) {
        if filter_level == MULTI_LEVEL_WILDCARD {
            return true;
        }
        let Some(topic_level) = topic_levels.next() else {
            return false;
        };
        if filter_level != SINGLE_LEVEL_WILDCARD && filter_level != topic_level {
            return false;
        }
    }

    topic_levels.next().is_none()
}

/// Checks a subscription filter is well formed.
///
/// # Errors
///
/// - `TopicError::Empty` - empty filter
/// - `TopicError::PartialWildcard` - `+` or `#` mixed into a level
/// - `TopicError::MultiLevelNotLast` - `#` followed by further levels
pub fn validate_filter(filter: &str) -> Result<(), TopicError> {
    if filter.is_empty() {
        return Err(TopicError::Empty);
    }

    let levels: Vec<&str> = filter.split(TOPIC_SEPARATOR).collect();
    let last = levels.len() - 1;

    for (index, level) in levels.iter().enumerate() {
        let has_wildcard = level.contains('+') || level.contains('#');
        if has_wildcard && *level != SINGLE_LEVEL_WILDCARD && *level != MULTI_LEVEL_WILDCARD {
            return Err(TopicError::PartialWildcard);
        }
        if *level == MULTI_LEVEL_WILDCARD && index != last {
            return Err(TopicError::MultiLevelNotLast);
        }
    }

    Ok(())
}

/// Checks a topic can be used as a publish target.
///
/// # Errors
///
/// - `TopicError::Empty` - empty topic
/// - `TopicError::WildcardInTopic` - topic contains `+` or `#`
pub fn validate_topic(topic: &str) -> Result<(), TopicError> {
    if topic.is_empty() {
        return Err(TopicError::Empty);
    }
    if topic.contains('+') || topic.contains('#') {
        return Err(TopicError::WildcardInTopic);
    }
    Ok(())
}
