//! Structured logging setup using tracing
//!
//! This module provides structured JSON logging with configurable log levels,
//! file rotation, and console output for development.
//!
//! # Example
//!
//! ```no_run
//! use deid_ledger::logging::init_logging;
//! use deid_ledger::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//! ```

use crate::config::{AppConfig, LoggingConfig};
use crate::domain::{DeidError, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "deid-ledger.log";

/// Guard that must be kept alive for the duration of the program
/// to ensure logs are flushed properly
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// Create a new logging guard
    fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self {
            _file_guard: file_guard,
        }
    }
}

/// Level used when neither the command line nor a config file names one
pub const CLI_DEFAULT_LOG_LEVEL: &str = "warn";

/// Pick the log level and sinks for a CLI run
///
/// `--log-level` wins over `application.log_level`. Without a loadable config
/// file, logging is console-only at [`CLI_DEFAULT_LOG_LEVEL`].
pub fn resolve_logging(cli_level: Option<&str>, config: Option<&AppConfig>) -> (String, LoggingConfig) {
    let (config_level, logging) = match config {
        Some(config) => (config.application.log_level.clone(), config.logging.clone()),
        None => (
            CLI_DEFAULT_LOG_LEVEL.to_string(),
            LoggingConfig {
                local_enabled: false,
                ..Default::default()
            },
        ),
    };
    let level = cli_level.map(str::to_string).unwrap_or(config_level);
    (level, logging)
}

/// Initialize the logging system based on configuration
///
/// Console output is always on and goes to stderr, keeping stdout for
/// command output. When `local_enabled` is set, JSON lines are
/// also written to `deid-ledger.log` under `local_path`.
///
/// # Arguments
///
/// * `log_level_str` - Log level as a string (trace, debug, info, warn, error)
/// * `config` - Logging configuration
///
/// # Returns
///
/// A `LoggingGuard` that must be kept alive for the duration of the program
///
/// # Example
///
/// ```no_run
/// use deid_ledger::logging::init_logging;
/// use deid_ledger::config::LoggingConfig;
///
/// let config = LoggingConfig::default();
/// let _guard = init_logging("info", &config).expect("Failed to initialize logging");
/// // Keep _guard alive for the duration of the program
/// ```
pub fn init_logging(log_level_str: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    // Parse log level from string
    let log_level = parse_log_level(log_level_str)?;

    // Create environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("deid_ledger={log_level}")));

    // Build the subscriber with layers
    let mut layers = Vec::new();

    // Console layer for development (always enabled)
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter.clone());

    layers.push(console_layer.boxed());

    // File logging layer (if enabled)
    let file_guard = if config.local_enabled {
        let rotation = parse_rotation(&config.local_rotation)?;

        std::fs::create_dir_all(&config.local_path).map_err(|e| {
            DeidError::Configuration(format!(
                "Failed to create log directory {}: {}",
                config.local_path, e
            ))
        })?;

        let file_appender =
            RollingFileAppender::new(rotation, &config.local_path, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(non_blocking)
            .with_filter(env_filter);

        layers.push(file_layer.boxed());
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry().with(layers).try_init().map_err(|e| {
        DeidError::Configuration(format!("Logging already initialized: {e}"))
    })?;

    tracing::info!(
        local_enabled = config.local_enabled,
        local_path = %config.local_path,
        rotation = %config.local_rotation,
        "Logging initialized"
    );

    Ok(LoggingGuard::new(file_guard))
}

fn parse_rotation(rotation: &str) -> Result<Rotation> {
    match rotation.to_lowercase().as_str() {
        "daily" => Ok(Rotation::DAILY),
        "hourly" => Ok(Rotation::HOURLY),
        "never" => Ok(Rotation::NEVER),
        other => Err(DeidError::Configuration(format!(
            "Invalid log rotation: {other}. Must be one of: daily, hourly, never"
        ))),
    }
}

/// Parse log level from string
fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(DeidError::Configuration(format!(
            "Invalid log level: {level_str}. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level_valid() {
        assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("warn").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("error").unwrap(), Level::ERROR);
    }

    #[test]
    fn test_parse_log_level_case_insensitive() {
        assert_eq!(parse_log_level("TRACE").unwrap(), Level::TRACE);
        assert_eq!(parse_log_level("Debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("INFO").unwrap(), Level::INFO);
    }

    #[test]
    fn test_parse_log_level_invalid() {
        assert!(parse_log_level("invalid").is_err());
        assert!(parse_log_level("").is_err());
    }

    #[test]
    fn test_parse_rotation() {
        assert_eq!(parse_rotation("daily").unwrap(), Rotation::DAILY);
        assert_eq!(parse_rotation("Hourly").unwrap(), Rotation::HOURLY);
        assert_eq!(parse_rotation("never").unwrap(), Rotation::NEVER);
        assert!(parse_rotation("size").is_err());
    }

    #[test]
    fn test_resolve_logging_without_config() {
        let (level, logging) = resolve_logging(None, None);
        assert_eq!(level, CLI_DEFAULT_LOG_LEVEL);
        assert!(!logging.local_enabled);

        let (level, _) = resolve_logging(Some("debug"), None);
        assert_eq!(level, "debug");
    }

    #[test]
    fn test_resolve_logging_uses_config_sections() {
        let mut config = AppConfig::default();
        config.application.log_level = "error".to_string();
        config.logging.local_enabled = true;
        config.logging.local_path = "/var/log/deid".to_string();
        config.logging.local_rotation = "hourly".to_string();

        let (level, logging) = resolve_logging(None, Some(&config));
        assert_eq!(level, "error");
        assert!(logging.local_enabled);
        assert_eq!(logging.local_path, "/var/log/deid");
        assert_eq!(logging.local_rotation, "hourly");

        let (level, _) = resolve_logging(Some("trace"), Some(&config));
        assert_eq!(level, "trace");
    }

    #[test]
    fn test_logging_guard_creation() {
        let guard = LoggingGuard::new(None);
        drop(guard);
    }
}
