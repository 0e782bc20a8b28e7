//! Logging setup and structured outcome helpers.

use std::time::Duration;

use basket_domain::SyncError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,basket=debug";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]; `BASKET_LOG_FORMAT=json` switches
/// to JSON lines. Calling this twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("BASKET_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let result = if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Stable label for a `SyncError`, suitable for logs and metrics.
#[inline]
pub fn error_label(error: &SyncError) -> &'static str {
    error.kind().label()
}

/// Log the outcome of a top-level operation with its duration.
///
/// `operation` should be a stable identifier without sensitive data.
pub fn log_outcome<T>(operation: &str, elapsed: Duration, result: &Result<T, SyncError>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(_) => info!(operation, duration_ms, "operation_success"),
        Err(e) => warn!(
            operation,
            duration_ms,
            error_kind = error_label(e),
            error = %e,
            "operation_failure"
        ),
    }
}
