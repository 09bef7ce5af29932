//! # worktrack
//!
//! In-process ledger for asynchronous work: issue a unit of work, track
//! it in an in-flight map, record its settle outcome in a bounded rolling
//! history, and read derived statistics off that history.
//!
//! The tracker is pure bookkeeping. It never performs the asynchronous
//! work, never retries, and never interprets payloads or errors; callers
//! run their own calls between `start` and `settle`. An optional
//! best-effort persistence mirror (SQLite via rusqlite) survives process
//! restarts but is never relied on for correctness.

pub mod error;
pub mod event;
pub mod history;
pub mod model;
pub mod persist;
pub mod stats;
pub mod telemetry;
pub mod tracker;
