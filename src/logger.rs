//! Logging setup via tracing-subscriber.
//!
//! [`init`] installs the global stderr subscriber, once, after the effective
//! log level is resolved. [`parse_level`] validates level strings coming
//! from config before anything is installed.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Install the global tracing subscriber, writing to stderr.
///
/// `level` is a standard level string: `"error"`, `"warn"`, `"info"`,
/// `"debug"`, `"trace"`.
///
/// With `prefer_level` set (a CLI `-v` flag was given), `level` wins and
/// `RUST_LOG` is only consulted when `level` does not parse. Otherwise
/// `RUST_LOG` wins and `level` is the fallback.
pub fn init(level: &str, prefer_level: bool) -> Result<(), AppError> {
    let filter = if prefer_level {
        EnvFilter::try_new(level).or_else(|level_err| {
            EnvFilter::try_from_default_env().map_err(|env_err| {
                AppError::Logger(format!(
                    "level '{level}' invalid ({level_err}) and RUST_LOG unusable ({env_err})"
                ))
            })
        })?
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// Parse a log level string into a [`LevelFilter`], erroring on anything
/// unrecognised.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}
