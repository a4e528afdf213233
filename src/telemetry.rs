//! Logging setup.
//!
//! Installs a compact `tracing` formatter with RFC 3339 UTC timestamps. The
//! level comes from the `LOG_LEVEL` environment variable.

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

/// Environment variable naming the log level.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Maps a `LOG_LEVEL` value to a filter.
///
/// Unset falls back to `TRACE` in debug builds and `INFO` in release
/// builds; unknown values mean `ERROR`.
#[must_use]
pub fn level_from(value: Option<&str>) -> LevelFilter {
    value.map_or(
        if cfg!(debug_assertions) {
            LevelFilter::TRACE
        } else {
            LevelFilter::INFO
        },
        |level| match level.trim().to_ascii_lowercase().as_str() {
            "off" => LevelFilter::OFF,
            "warn" => LevelFilter::WARN,
            "info" => LevelFilter::INFO,
            "debug" => LevelFilter::DEBUG,
            "trace" => LevelFilter::TRACE,
            _ => LevelFilter::ERROR,
        },
    )
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`TryInitError`] when a global subscriber is already set.
pub fn try_init() -> Result<(), TryInitError> {
    let level = level_from(std::env::var(LOG_LEVEL_ENV).ok().as_deref());

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    cfg!(debug_assertions) || metadata.target().starts_with("kalaya")
                })),
        )
        .try_init()
}

/// Installs the global subscriber, keeping any subscriber already set.
pub fn init() {
    if let Err(err) = try_init() {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
}
