//! Core data model.
//!
//! A work record is one tracked asynchronous operation: identity, the
//! caller's opaque payload, lifecycle status, and the outcome recorded
//! at settle time. The tracker never interprets payloads or results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Work Record
// ---------------------------------------------------------------------------

/// A single tracked asynchronous operation and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRecord {
    /// Unique identifier.
    pub id: WorkId,

    /// Monotonic start sequence within one tracker instance. Gives
    /// in-flight snapshots their insertion order and the persistence
    /// mirror a stable ordering key.
    pub seq: u64,

    /// What kind of work this is (e.g., "agent-activation", "data-fetch").
    /// Opaque to the tracker; useful as a filter key on history reads.
    pub work_type: String,

    /// Caller-supplied input. The tracker doesn't interpret this.
    pub payload: serde_json::Value,

    /// Current lifecycle status.
    pub status: WorkStatus,

    /// Result data. Present only when status is `Completed`.
    pub result: Option<serde_json::Value>,

    /// Error message. Present only when status is `Failed`.
    pub error: Option<String>,

    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,

    /// Wall-clock duration from start to settle. Present once settled.
    pub duration_ms: Option<u64>,
}

/// Newtype for work record IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkId(pub Uuid);

impl WorkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for WorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short display: first 8 chars of UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl Default for WorkId {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a work record.
///
/// A record is created `Running` and transitions exactly once into one of
/// the settled states. Settled records are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// In flight; the caller's asynchronous work has not settled yet.
    Running,
    /// Done successfully. Terminal.
    Completed,
    /// The tracked work failed (or timed out). Terminal.
    Failed,
    /// The caller gave up before the work settled. Terminal.
    Cancelled,
}

impl WorkStatus {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: WorkStatus) -> bool {
        use WorkStatus::*;
        matches!(
            (self, to),
            (Running, Completed) | (Running, Failed) | (Running, Cancelled)
        )
    }

    /// Has this record left the in-flight map?
    pub fn is_settled(self) -> bool {
        !matches!(self, WorkStatus::Running)
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkStatus::Running => "running",
            WorkStatus::Completed => "completed",
            WorkStatus::Failed => "failed",
            WorkStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Outcome of the tracked asynchronous work, reported by the caller at
/// settle time.
///
/// A tagged union rather than a struct with optional `result`/`error`
/// fields, so a malformed outcome shape cannot be constructed: success
/// always carries data, failure always carries an error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success { result: serde_json::Value },
    Failure { error: String },
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for starting new work. The tracker's public API for submission.
pub struct NewWork {
    pub(crate) work_type: String,
    pub(crate) payload: serde_json::Value,
}

impl NewWork {
    pub fn new(work_type: impl Into<String>) -> Self {
        Self {
            work_type: work_type.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
