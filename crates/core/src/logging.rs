//! Logging setup on top of the tracing ecosystem.
//!
//! # Environment Variables
//!
//! - `BOOKMARK_LOG`: Filter directive (like `RUST_LOG`), e.g., `bookmark_store=debug`
//! - `BOOKMARK_LOG_FORMAT`: Output format for stderr: `pretty`, `json`, `compact`
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [logging.file]
//! enabled = false
//! directory = "logs"
//! ```
//!
//! # Example
//!
//! ```no_run
//! use bookmark_core::config::LoggingConfig;
//! use bookmark_core::logging;
//!
//! // Keep the guard alive for as long as file output should be flushed
//! let _guard = logging::init_logging(&LoggingConfig::default())?;
//! # Ok::<(), bookmark_core::Error>(())
//! ```

use crate::Error;
use crate::config::LoggingConfig;
use std::env;
use std::io;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "bookmark-server.log";

/// How events are rendered on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line and colored, for terminals
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
    /// One line per event
    Compact,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(Error::Logging(format!("unknown log format {other:?}, expected pretty, json or compact"))),
        }
    }
}

/// Build an EnvFilter from `BOOKMARK_LOG`, then `RUST_LOG`, then the configured level.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let filter = env::var("BOOKMARK_LOG")
        .ok()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| config.level.clone());

    EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Determine the stderr format: env override, then config, then compact when not a TTY.
fn detect_format(config: &LoggingConfig) -> LogFormat {
    if let Ok(value) = env::var("BOOKMARK_LOG_FORMAT")
        && let Ok(format) = value.parse::<LogFormat>()
    {
        return format;
    }

    match config.format.parse::<LogFormat>() {
        Ok(LogFormat::Pretty) | Err(_) if !atty::is(atty::Stream::Stderr) => LogFormat::Compact,
        Ok(format) => format,
        Err(_) => LogFormat::Pretty,
    }
}

/// Initialize the global tracing subscriber.
///
/// Sets up the env filter, stderr output in the detected format and, when enabled,
/// a daily-rolling JSON log file. The returned guard flushes the file writer on drop
/// and must be held by the caller for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, Error> {
    let env_filter = build_env_filter(config);
    let format = detect_format(config);

    let registry = Registry::default().with(env_filter);

    if config.file.enabled {
        std::fs::create_dir_all(&config.file.directory)
            .map_err(|e| Error::Logging(format!("Failed to create log directory: {}", e)))?;

        let file_appender = tracing_appender::rolling::daily(&config.file.directory, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let result = match format {
            LogFormat::Pretty => registry
                .with(fmt::layer().pretty().with_writer(io::stderr).with_ansi(true))
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(io::stderr))
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init(),
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init(),
        };
        result.map_err(|e| Error::Logging(e.to_string()))?;

        return Ok(Some(guard));
    }

    let result = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(io::stderr).with_ansi(true))
            .try_init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(io::stderr)).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact().with_writer(io::stderr)).try_init(),
    };
    result.map_err(|e| Error::Logging(e.to_string()))?;

    Ok(None)
}
