//! Structured logging init, one call per process `main`, mirroring the
//! teacher's `tracing_subscriber::registry().with(EnvFilter).with(fmt::layer())` setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber. `default_filter` scopes the
/// default verbosity when `RUST_LOG` isn't set, e.g. `"league_manager=info,tower_http=debug"`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
