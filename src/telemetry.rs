//! Telemetry
//!
//! Tracing subscriber setup for applications embedding fieldstore.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "fieldstore=info";

/// Installs a global subscriber with an env filter and a fmt layer.
///
/// Reads `RUST_LOG`, falling back to `default_filter`. Returns false if a
/// global subscriber was already set, in which case nothing changes.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
