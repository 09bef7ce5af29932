//! Tests for derived metrics over a history snapshot.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use worktrack::history::BoundedHistory;
use worktrack::model::{WorkId, WorkRecord, WorkStatus};
use worktrack::stats::{self, TrendDirection};

fn record(status: WorkStatus, duration_ms: Option<u64>) -> WorkRecord {
    record_at(status, duration_ms, Utc::now())
}

fn record_at(status: WorkStatus, duration_ms: Option<u64>, started_at: DateTime<Utc>) -> WorkRecord {
    WorkRecord {
        id: WorkId::new(),
        seq: 0,
        work_type: "test-work".to_string(),
        payload: serde_json::Value::Null,
        status,
        result: None,
        error: None,
        started_at,
        ended_at: Some(started_at),
        duration_ms,
    }
}

/// A record whose trend metric is carried in the payload, so fractional
/// values are possible.
fn metric_record(value: f64) -> WorkRecord {
    let mut r = record(WorkStatus::Completed, Some(1));
    r.payload = json!({ "v": value });
    r
}

fn metric(r: &WorkRecord) -> f64 {
    r.payload["v"].as_f64().unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Success rate
// ---------------------------------------------------------------------------

#[test]
fn success_rate_is_completed_over_total() {
    let mut history = BoundedHistory::new(10);
    history.append(record(WorkStatus::Completed, Some(10)));
    history.append(record(WorkStatus::Completed, Some(10)));
    history.append(record(WorkStatus::Failed, Some(10)));
    history.append(record(WorkStatus::Cancelled, Some(10)));

    assert_eq!(stats::success_rate(&history), 0.5);
}

#[test]
fn success_rate_stays_within_bounds() {
    let mut history = BoundedHistory::new(10);
    for _ in 0..5 {
        history.append(record(WorkStatus::Failed, Some(1)));
    }
    assert_eq!(stats::success_rate(&history), 0.0);

    let mut history = BoundedHistory::new(10);
    for _ in 0..5 {
        history.append(record(WorkStatus::Completed, Some(1)));
    }
    assert_eq!(stats::success_rate(&history), 1.0);
}

#[test]
fn empty_history_reads_as_neutral_defaults() {
    let history: BoundedHistory<WorkRecord> = BoundedHistory::new(10);

    // Dashboard policy: no operations attempted reads as 1.0, not NaN.
    assert_eq!(stats::success_rate(&history), 1.0);
    assert_eq!(stats::average_duration_ms(&history), 0.0);

    let trend = stats::trend(&history, metric);
    assert_eq!(trend.direction, TrendDirection::InsufficientData);
}

// ---------------------------------------------------------------------------
// Average duration
// ---------------------------------------------------------------------------

#[test]
fn average_duration_means_settled_durations() {
    let mut history = BoundedHistory::new(10);
    history.append(record(WorkStatus::Completed, Some(100)));
    history.append(record(WorkStatus::Failed, Some(200)));
    history.append(record(WorkStatus::Cancelled, Some(300)));

    assert_eq!(stats::average_duration_ms(&history), 200.0);
}

#[test]
fn records_without_duration_are_excluded_from_average() {
    let mut history = BoundedHistory::new(10);
    history.append(record(WorkStatus::Completed, Some(100)));
    history.append(record(WorkStatus::Running, None));

    assert_eq!(stats::average_duration_ms(&history), 100.0);
}

// ---------------------------------------------------------------------------
// Windowed rate
// ---------------------------------------------------------------------------

#[test]
fn rate_over_window_counts_recent_starts_only() {
    let now = Utc::now();
    let mut history = BoundedHistory::new(10);
    history.append(record_at(WorkStatus::Completed, Some(1), now - Duration::seconds(5)));
    history.append(record_at(WorkStatus::Completed, Some(1), now - Duration::seconds(30)));
    history.append(record_at(WorkStatus::Failed, Some(1), now - Duration::minutes(10)));

    assert_eq!(
        stats::rate_over_window_at(&history, Duration::minutes(1), now),
        2
    );
    assert_eq!(
        stats::rate_over_window_at(&history, Duration::seconds(10), now),
        1
    );
    assert_eq!(
        stats::rate_over_window_at(&history, Duration::hours(1), now),
        3
    );
}

// ---------------------------------------------------------------------------
// Trend classification
// ---------------------------------------------------------------------------

fn thirds_history(older: f64, recent: f64) -> BoundedHistory<WorkRecord> {
    let mut history = BoundedHistory::new(10);
    for _ in 0..3 {
        history.append(metric_record(older));
    }
    for _ in 0..3 {
        history.append(metric_record(recent));
    }
    history
}

#[test]
fn change_below_band_is_stable() {
    let trend = stats::trend(&thirds_history(100.0, 104.9), metric);
    assert_eq!(trend.direction, TrendDirection::Stable);
    assert!((trend.change_percent - 4.9).abs() < 1e-9);
}

#[test]
fn change_above_band_is_increasing() {
    let trend = stats::trend(&thirds_history(100.0, 105.1), metric);
    assert_eq!(trend.direction, TrendDirection::Increasing);
    assert!((trend.change_percent - 5.1).abs() < 1e-9);

    let trend = stats::trend(&thirds_history(100.0, 106.0), metric);
    assert_eq!(trend.direction, TrendDirection::Increasing);
}

#[test]
fn negative_change_above_band_is_decreasing() {
    let trend = stats::trend(&thirds_history(100.0, 90.0), metric);
    assert_eq!(trend.direction, TrendDirection::Decreasing);
    assert!((trend.change_percent - -10.0).abs() < 1e-9);
}

#[test]
fn zero_baseline_is_defined_as_stable() {
    let trend = stats::trend(&thirds_history(0.0, 50.0), metric);
    assert_eq!(trend.direction, TrendDirection::Stable);
    assert_eq!(trend.change_percent, 0.0);
}

#[test]
fn fewer_than_two_records_is_insufficient_data() {
    let mut history = BoundedHistory::new(10);
    history.append(metric_record(100.0));

    let trend = stats::trend(&history, metric);
    assert_eq!(trend.direction, TrendDirection::InsufficientData);
}

#[test]
fn two_records_compare_first_against_last() {
    let mut history = BoundedHistory::new(10);
    history.append(metric_record(100.0));
    history.append(metric_record(120.0));

    let trend = stats::trend(&history, metric);
    assert_eq!(trend.direction, TrendDirection::Increasing);
    assert!((trend.change_percent - 20.0).abs() < 1e-9);
}
