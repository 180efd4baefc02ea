//! Logging initialization.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Builds the filter: `RUST_LOG` if set and valid, otherwise `default`,
/// otherwise `info`.
fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a console subscriber.
///
/// Call once, before the server starts. Later calls are no-ops.
pub fn init(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter(default_filter))
        .try_init();
}
