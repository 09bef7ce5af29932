//! Derived metrics over a history snapshot.
//!
//! All functions are read-only: they take a history reference and compute
//! counts, rates, and a coarse trend classification. Several defaults here
//! are dashboard policy rather than mathematics — they are documented on
//! each function and must not be "fixed" back into NaN propagation.

use chrono::{DateTime, Duration, Utc};

use crate::history::BoundedHistory;
use crate::model::{WorkRecord, WorkStatus};

/// Relative change below this magnitude (in percent) classifies as stable.
const STABLE_BAND_PERCENT: f64 = 5.0;

/// Coarse direction of a metric over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    /// Fewer than two records; no comparison is possible.
    InsufficientData,
}

/// Result of comparing the oldest third of a history against the newest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub direction: TrendDirection,
    pub change_percent: f64,
}

/// Fraction of history records that completed successfully, in `[0, 1]`.
///
/// An empty history reads as `1.0`, not NaN: "no operations attempted"
/// is a neutral default for a dashboard, not an error state.
pub fn success_rate(history: &BoundedHistory<WorkRecord>) -> f64 {
    if history.is_empty() {
        return 1.0;
    }
    let completed = history
        .iter()
        .filter(|r| r.status == WorkStatus::Completed)
        .count();
    completed as f64 / history.len() as f64
}

/// Arithmetic mean of `duration_ms` over records that carry one.
/// `0.0` when no settled durations exist.
pub fn average_duration_ms(history: &BoundedHistory<WorkRecord>) -> f64 {
    let durations: Vec<u64> = history.iter().filter_map(|r| r.duration_ms).collect();
    if durations.is_empty() {
        return 0.0;
    }
    durations.iter().sum::<u64>() as f64 / durations.len() as f64
}

/// Count of records whose `started_at` falls within `[now - window, now]`.
pub fn rate_over_window(history: &BoundedHistory<WorkRecord>, window: Duration) -> usize {
    rate_over_window_at(history, window, Utc::now())
}

/// As [`rate_over_window`], with an explicit reference time.
pub fn rate_over_window_at(
    history: &BoundedHistory<WorkRecord>,
    window: Duration,
    now: DateTime<Utc>,
) -> usize {
    let cutoff = now - window;
    history
        .iter()
        .filter(|r| r.started_at >= cutoff && r.started_at <= now)
        .count()
}

/// Classify the trend of `selector(record)` by comparing the oldest third
/// of the history against the newest third (split by count, not time).
///
/// Change is `(recent - older) / older * 100`. A zero older-third mean is
/// defined as 0% change with direction `Stable` — a jump from nothing has
/// no meaningful percentage. Fewer than two records yields
/// `InsufficientData`.
pub fn trend(
    history: &BoundedHistory<WorkRecord>,
    selector: impl Fn(&WorkRecord) -> f64,
) -> Trend {
    let values: Vec<f64> = history.iter().map(selector).collect();
    if values.len() < 2 {
        return Trend {
            direction: TrendDirection::InsufficientData,
            change_percent: 0.0,
        };
    }

    let third = (values.len() / 3).max(1);
    let older = mean(&values[..third]);
    let recent = mean(&values[values.len() - third..]);

    if older == 0.0 {
        return Trend {
            direction: TrendDirection::Stable,
            change_percent: 0.0,
        };
    }

    let change_percent = (recent - older) / older * 100.0;
    let direction = if change_percent.abs() < STABLE_BAND_PERCENT {
        TrendDirection::Stable
    } else if change_percent > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    Trend {
        direction,
        change_percent,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
