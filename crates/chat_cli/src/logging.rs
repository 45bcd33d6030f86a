//! stderr log backend for the `log` facade used by every crate.

use log::LevelFilter;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const LOG_LEVEL_ENV_VAR: &str = "AGENT_CHAT_LOG_LEVEL";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Warn;

pub fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" => Some(LevelFilter::Off),
        _ => None,
    }
}

/// Level from [`LOG_LEVEL_ENV_VAR`]; unset or unrecognized values fall back
/// to [`DEFAULT_LOG_LEVEL`].
pub fn level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_ENV_VAR)
        .ok()
        .and_then(|value| parse_log_level(&value))
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

/// Install the global logger. Fails if one is already installed.
pub fn init_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .level(level)
        .format(|out, message, record| {
            let timestamp = OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_else(|_| "-".to_string());
            out.finish(format_args!(
                "[{timestamp}][{}][{}] {message}",
                record.level(),
                record.target()
            ))
        })
        .chain(std::io::stderr())
        .apply()
}
