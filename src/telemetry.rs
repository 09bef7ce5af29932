//! Tracing initialization.
//!
//! Sets up an env-filtered fmt subscriber. The tracker logs transitions
//! at `debug` and swallowed persistence failures at `warn`; binaries and
//! tests that want to see those call this once at startup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::error::{Error, Result};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`, defaulting to `info`.
///
/// # Errors
///
/// Returns an error if a subscriber was already set.
pub fn init_tracing() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| Error::Other(format!("failed to init tracing subscriber: {e}")))
}
