//! Core tracker. The public API for starting, settling, and inspecting
//! asynchronous work.
//!
//! The tracker owns the in-flight map, the settled history, and the event
//! log. All transitions go through here. It never performs the
//! asynchronous work itself: callers run their own calls between `start`
//! and `settle`, and the tracker has no visibility into that gap beyond
//! the eventual settle. It also never retries — retry policy belongs to
//! the caller.
//!
//! Single-owner by construction (`&mut self` on every mutation), so no
//! locking discipline is needed; multiple in-flight operations interleave
//! on one logical thread and may settle in any order.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::event::{Event, EventKind};
use crate::history::BoundedHistory;
use crate::model::{NewWork, Outcome, WorkId, WorkRecord, WorkStatus};
use crate::persist::HistoryStore;
use crate::stats;

/// Tracker capacities. Both histories evict oldest-first past their cap.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Maximum settled records retained.
    pub history_capacity: usize,
    /// Maximum events retained.
    pub event_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_capacity: 200,
            event_capacity: 500,
        }
    }
}

/// Tracks in-flight asynchronous operations and their settled history.
pub struct WorkTracker {
    in_flight: HashMap<WorkId, WorkRecord>,
    history: BoundedHistory<WorkRecord>,
    events: BoundedHistory<Event>,
    store: Option<Box<dyn HistoryStore>>,
    next_seq: u64,
    next_event_seq: u64,
}

impl WorkTracker {
    /// Create a tracker with no persistence mirror.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            in_flight: HashMap::new(),
            history: BoundedHistory::new(config.history_capacity),
            events: BoundedHistory::new(config.event_capacity),
            store: None,
            next_seq: 0,
            // Event seqs start at 1 so `events_since(0)` yields everything.
            next_event_seq: 1,
        }
    }

    /// Create a tracker mirrored through a [`HistoryStore`].
    ///
    /// Previously mirrored records are loaded best-effort: a load failure
    /// is logged and the tracker starts empty. Only settled records are
    /// restored — a `running` row in the mirror is a stale leftover from
    /// a previous process and is dropped.
    pub fn with_store(config: TrackerConfig, mut store: Box<dyn HistoryStore>) -> Self {
        let mut tracker = Self::new(config);

        match store.load() {
            Ok(records) => {
                for record in records {
                    if !record.status.is_settled() {
                        continue;
                    }
                    tracker.next_seq = tracker.next_seq.max(record.seq + 1);
                    tracker.history.append(record);
                }
            }
            Err(e) => warn!(error = %e, "history mirror load failed; starting empty"),
        }

        tracker.store = Some(store);
        tracker
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start tracking a unit of work. Synchronous bookkeeping only: the id
    /// is allocated, a `Running` record enters the in-flight map, and the
    /// caller goes off to do the actual work.
    pub fn start(&mut self, new: NewWork) -> WorkId {
        let id = WorkId::new();
        let seq = self.next_seq;
        self.next_seq += 1;

        let record = WorkRecord {
            id,
            seq,
            work_type: new.work_type.clone(),
            payload: new.payload,
            status: WorkStatus::Running,
            result: None,
            error: None,
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
        };

        self.in_flight.insert(id, record);
        self.record_event(EventKind::WorkStarted {
            id,
            work_type: new.work_type,
        });

        debug!(%id, "work started");
        id
    }

    /// Record the outcome of an in-flight operation. Returns `true` if the
    /// record transitioned.
    ///
    /// An unknown or already-settled id is a silent no-op returning
    /// `false` — a caller retrying its error handling (or a real response
    /// arriving after `cancel`) must not be able to disturb the history.
    pub fn settle(&mut self, id: WorkId, outcome: Outcome) -> bool {
        let Some(record) = self.in_flight.remove(&id) else {
            debug!(%id, "settle for unknown or already-settled id ignored");
            return false;
        };

        match outcome {
            Outcome::Success { result } => {
                let record = finish(record, WorkStatus::Completed, Some(result), None);
                let duration_ms = record.duration_ms.unwrap_or(0);
                self.record_event(EventKind::WorkCompleted { id, duration_ms });
                self.push_history(record);
            }
            Outcome::Failure { error } => {
                let record =
                    finish(record, WorkStatus::Failed, None, Some(error.clone()));
                let duration_ms = record.duration_ms.unwrap_or(0);
                self.record_event(EventKind::WorkFailed {
                    id,
                    error,
                    duration_ms,
                });
                self.push_history(record);
            }
        }

        true
    }

    /// Cancel an in-flight operation. Returns `true` and moves the record
    /// to history as `Cancelled`; `false` if the id is not in flight.
    ///
    /// Cancellation is cooperative bookkeeping only: the underlying call
    /// is not aborted, and its late response will hit the already-settled
    /// no-op path in [`settle`](Self::settle).
    pub fn cancel(&mut self, id: WorkId) -> bool {
        let Some(record) = self.in_flight.remove(&id) else {
            return false;
        };

        let record = finish(record, WorkStatus::Cancelled, None, None);
        let duration_ms = record.duration_ms.unwrap_or(0);
        self.record_event(EventKind::WorkCancelled { id, duration_ms });
        self.push_history(record);

        debug!(%id, "work cancelled");
        true
    }

    /// Settle every in-flight record that started more than `older_than`
    /// ago as failed with a timeout error. Returns the expired ids.
    ///
    /// Without this the in-flight map grows without bound whenever a
    /// caller forgets to settle. Callers decide the cutoff and cadence.
    pub fn expire_stale(&mut self, older_than: Duration) -> Vec<WorkId> {
        let cutoff = Utc::now() - older_than;
        let stale: Vec<WorkId> = self
            .in_flight
            .values()
            .filter(|r| r.started_at < cutoff)
            .map(|r| r.id)
            .collect();

        for id in &stale {
            let Some(record) = self.in_flight.remove(id) else {
                continue;
            };
            let running_for_ms = duration_ms_between(record.started_at, Utc::now());
            let error = format!("timed out after running for {running_for_ms}ms");
            let record = finish(record, WorkStatus::Failed, None, Some(error));
            self.record_event(EventKind::WorkExpired {
                id: *id,
                running_for_ms,
            });
            self.push_history(record);
            warn!(id = %id, running_for_ms, "stale work expired");
        }

        stale
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Look up a record by id: the in-flight map first, then history.
    /// `None` if the id is unknown or already evicted.
    pub fn status(&self, id: WorkId) -> Option<&WorkRecord> {
        self.in_flight
            .get(&id)
            .or_else(|| self.history.find(|r| r.id == id))
    }

    /// Snapshot of currently running records, in start order.
    pub fn in_flight(&self) -> Vec<WorkRecord> {
        let mut records: Vec<WorkRecord> = self.in_flight.values().cloned().collect();
        records.sort_by_key(|r| r.seq);
        records
    }

    /// Settled records, most recent first.
    pub fn history(&self, limit: Option<usize>) -> Vec<&WorkRecord> {
        self.history.list(limit)
    }

    /// Settled records, most recent first, filtered.
    pub fn history_where(
        &self,
        limit: Option<usize>,
        predicate: impl Fn(&WorkRecord) -> bool,
    ) -> Vec<&WorkRecord> {
        self.history.list_where(limit, predicate)
    }

    /// Events with a sequence number greater than `since_seq`, ascending.
    pub fn events_since(&self, since_seq: u64) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.seq > since_seq)
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Derived metrics
    // -----------------------------------------------------------------------

    pub fn success_rate(&self) -> f64 {
        stats::success_rate(&self.history)
    }

    pub fn average_duration_ms(&self) -> f64 {
        stats::average_duration_ms(&self.history)
    }

    pub fn rate_over_window(&self, window: Duration) -> usize {
        stats::rate_over_window(&self.history, window)
    }

    pub fn trend(&self, selector: impl Fn(&WorkRecord) -> f64) -> stats::Trend {
        stats::trend(&self.history, selector)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn push_history(&mut self, record: WorkRecord) {
        self.history.append(record);

        // Mirror best-effort: a save failure must never surface to the
        // caller or disturb the in-memory ledger.
        if let Some(store) = self.store.as_mut() {
            let snapshot: Vec<WorkRecord> = self.history.iter().cloned().collect();
            if let Err(e) = store.save(&snapshot) {
                warn!(error = %e, "history mirror save failed; continuing in memory");
            }
        }
    }

    fn record_event(&mut self, kind: EventKind) {
        let seq = self.next_event_seq;
        self.next_event_seq += 1;
        self.events.append(Event {
            seq,
            timestamp: Utc::now(),
            kind,
        });
    }
}

/// Apply the single allowed transition out of `Running` and stamp the
/// settle time.
fn finish(
    mut record: WorkRecord,
    status: WorkStatus,
    result: Option<serde_json::Value>,
    error: Option<String>,
) -> WorkRecord {
    debug_assert!(record.status.can_transition_to(status));

    let now = Utc::now();
    record.status = status;
    record.result = result;
    record.error = error;
    record.duration_ms = Some(duration_ms_between(record.started_at, now));
    record.ended_at = Some(now);
    record
}

fn duration_ms_between(
    start: chrono::DateTime<Utc>,
    end: chrono::DateTime<Utc>,
) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}
