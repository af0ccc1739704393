//! Structured logging setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if json {
        tracing_subscriber::registry().with(filter).with(fmt::layer().json()).try_init()?;
    } else {
        tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(true)).try_init()?;
    }

    tracing::info!(json, "logging initialized");
    Ok(())
}
