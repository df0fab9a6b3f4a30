//! Centralized logging configuration for the portal binaries
//!
//! Provides consistent logging setup with support for:
//! - Text, JSON, and pretty-printed output
//! - Environment variable configuration
//! - Per-module log level filtering
//!
//! # Examples
//!
//! ```no_run
//! use libportal::logging::{LoggingConfig, LogFormat};
//!
//! let config = LoggingConfig::new(LogFormat::Json, "info".to_string(), false);
//! config.init();
//! ```

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text output (no colors, for piping)
    Text,
    /// Machine-parseable JSON (one JSON object per line)
    Json,
    /// Pretty-printed with colors (for development)
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Configuration for logging initialization
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    /// Create a new logging configuration
    ///
    /// `verbose` forces the `debug` level unless `RUST_LOG` says otherwise.
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Build from `PORTAL_LOG_FORMAT` / `PORTAL_LOG_LEVEL`, defaulting to
    /// text output at `warn`
    pub fn from_env(verbose: bool) -> Self {
        let format = std::env::var("PORTAL_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(LogFormat::Text);

        let level = std::env::var("PORTAL_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());

        Self::new(format, level, verbose)
    }

    /// Install the global subscriber
    ///
    /// A second call is a no-op rather than a panic, so tests and binaries
    /// can both call it.
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let level = if self.verbose { "debug" } else { self.level.as_str() };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let result = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .flatten_event(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .try_init(),
        };

        if result.is_err() {
            tracing::debug!("Logging subscriber already installed");
        }
    }
}

/// Initialize logging with default settings
pub fn init_default() {
    LoggingConfig::from_env(false).init();
}
