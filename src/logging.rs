//! Tracing setup
//!
//! Diagnostics go to stderr through `tracing`. `RUST_LOG` wins over the
//! level picked from `--verbose`.

use anyhow::{Context, Result};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive used when `RUST_LOG` is unset
#[must_use]
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("gitlab_lint={level},gll={level}")
}

/// Install the global subscriber
///
/// Verbose runs also show targets and source locations.
pub fn init(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))
        .context("Failed to create tracing filter")?;

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Tracing initialized");
    Ok(())
}
