//! Log output for the Aurora server.
//!
//! The subscriber is installed once at boot with `info`; after the config is
//! loaded [`apply_logging_level`] swaps in `logging.level`. An explicit
//! `RUST_LOG` pins the filter for the whole process.

use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

static FILTER_HANDLE: OnceLock<FilterHandle> = OnceLock::new();

/// Directives for the active filter: a parseable `RUST_LOG` if present,
/// else the configured level.
fn filter_directives(level: &str, rust_log: Option<&str>) -> String {
    match rust_log {
        Some(directives) if EnvFilter::try_new(directives).is_ok() => directives.to_string(),
        _ => level.to_string(),
    }
}

fn rust_log() -> Option<String> {
    std::env::var("RUST_LOG").ok().filter(|v| !v.is_empty())
}

pub fn init_tracing() {
    init_tracing_with_level("info");
}

pub fn init_tracing_with_level(level: &str) {
    let directives = filter_directives(level, rust_log().as_deref());
    let (filter, handle) = reload::Layer::new(EnvFilter::new(directives));

    // A second init (tests, embedding) keeps the first subscriber.
    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok()
    {
        let _ = FILTER_HANDLE.set(handle);
    }
}

/// Swaps in `level` from config; a no-op when `RUST_LOG` is set.
pub fn apply_logging_level(level: &str) {
    if rust_log().is_some() {
        return;
    }
    let Some(handle) = FILTER_HANDLE.get() else {
        return;
    };
    if let Err(e) = handle.reload(EnvFilter::new(level)) {
        tracing::warn!(error = %e, level, "could not apply logging level");
    } else {
        tracing::debug!(level, "logging level applied");
    }
}

pub fn shutdown_tracing() {
    tracing::info!("tracing shut down");
}
