use chrono::{DateTime, Utc};
use serde::Serialize;

/// Registry snapshot exposed for operational visibility.
///
/// Dispatched tasks are never redelivered, so a growing
/// `oldest_dispatched_age_ms` is how a lost worker shows up.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegistryMetrics {
    /// Tasks ever created by this registry.
    pub total: usize,
    pub pending: usize,
    pub dispatched: usize,
    pub done: usize,
    /// Task IDs waiting in the dispatch queue.
    pub queue_depth: usize,
    pub oldest_queued_age_ms: Option<u64>,
    pub oldest_dispatched_age_ms: Option<u64>,
}

/// A task handed to a worker longer ago than the staleness threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaleTask {
    pub task_id: String,
    pub expression_id: String,
    pub dispatched_at: DateTime<Utc>,
    pub age_ms: u64,
}

/// Milliseconds elapsed since `since`, clamped at zero.
pub(crate) fn age_ms(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    now.signed_duration_since(since).num_milliseconds().max(0) as u64
}
