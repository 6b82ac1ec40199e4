//! Log setup shared by both binaries.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Parse a `--log-level` value.
///
/// Accepts tracing's level names plus the `WARNING` and `CRITICAL` spellings
/// used by the web application's logging config. Returns `None` for anything
/// else.
pub fn parse_log_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "error" | "critical" | "fatal" => Some(LevelFilter::ERROR),
        "off" => Some(LevelFilter::OFF),
        _ => None,
    }
}

/// Install the global fmt subscriber.
///
/// Unknown levels fall back to INFO with a warning once logging is up.
/// `RUST_LOG` directives, when set, are layered on top of the level.
pub fn init_tracing(level: &str) {
    let parsed = parse_log_level(level);
    let filter = EnvFilter::builder()
        .with_default_directive(parsed.unwrap_or(LevelFilter::INFO).into())
        .from_env_lossy();

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed && parsed.is_none() {
        tracing::warn!("Unknown log level '{}', using INFO", level);
    }
}
