//! Structured events emitted by the tracker on every transition.
//!
//! Consumers poll the event log to build dashboards or audit trails.
//! The log itself is a bounded history; old events fall off the front.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::WorkId;

/// A structured event emitted by the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence number. Consumers can detect gaps.
    pub seq: u64,
    /// When this event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    WorkStarted {
        id: WorkId,
        work_type: String,
    },
    WorkCompleted {
        id: WorkId,
        duration_ms: u64,
    },
    WorkFailed {
        id: WorkId,
        error: String,
        duration_ms: u64,
    },
    WorkCancelled {
        id: WorkId,
        duration_ms: u64,
    },
    /// An in-flight record exceeded the staleness cutoff and was settled
    /// as failed by `expire_stale`.
    WorkExpired {
        id: WorkId,
        running_for_ms: u64,
    },
}
