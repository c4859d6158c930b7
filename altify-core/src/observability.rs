//! Shared `tracing` initialization, matching `foiacquire::main`'s logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `default_filter` should name the binary's own crate at `info` (e.g.
/// `"altify_worker=info"`); it is overridden by `RUST_LOG` when set. When
/// `json` is true, logs are emitted as structured JSON lines, suitable for
/// container log collection; otherwise a human-readable format is used.
pub fn init_tracing(default_filter: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
