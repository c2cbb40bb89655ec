//! Tracing subscriber initialization.

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Reads the filter from `RUST_LOG`, defaulting to `info`. With `json` set,
/// events are emitted as one JSON object per line. Calling this twice is a
/// no-op: the second registration attempt is logged and ignored.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    match installed {
        Ok(()) => info!(json, "Tracing initialized"),
        Err(e) => debug!(error = %e, "Tracing subscriber already installed"),
    }
}
