//! Logging initialization.
//!
//! One `tracing-subscriber` fmt layer for every Passport process.
//! `RUST_LOG` wins over the configured default so a stuck client can be
//! inspected without touching its config file.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. Safe to call once per process;
/// a second call is a no-op rather than a panic.
pub fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Parse a log level string, defaulting to `info`.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
