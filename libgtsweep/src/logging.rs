//! Logging setup for the gtsweep binaries
//!
//! Diagnostics go to stderr through `tracing`, leaving stdout for the sweep
//! output itself. Supported formats:
//! - Text (default, no target, suited to terminals and pipes)
//! - JSON (one object per line)
//! - Pretty (colors, file and line numbers)
//!
//! # Examples
//!
//! ```no_run
//! use libgtsweep::logging::{LoggingConfig, LogFormat};
//!
//! LoggingConfig::new(LogFormat::Json, "info".to_string(), false).init();
//! ```

use std::str::FromStr;

/// Environment variable selecting the log format
pub const LOG_FORMAT_ENV_VAR: &str = "GTSWEEP_LOG_FORMAT";

/// Environment variable selecting the default log level
pub const LOG_LEVEL_ENV_VAR: &str = "GTSWEEP_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
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
    /// * `level` - Minimum log level (error, warn, info, debug, trace)
    /// * `verbose` - If true, defaults to debug level
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Build from `GTSWEEP_LOG_FORMAT` / `GTSWEEP_LOG_LEVEL`
    ///
    /// Falls back to text output at `warn`, so a normal run only shows the
    /// sweep output itself.
    pub fn from_env(verbose: bool) -> Self {
        let format = std::env::var(LOG_FORMAT_ENV_VAR)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(LogFormat::Text);

        let level = std::env::var(LOG_LEVEL_ENV_VAR).unwrap_or_else(|_| "warn".to_string());

        Self::new(format, level, verbose)
    }

    /// The filter directive used when `RUST_LOG` is not set
    pub fn default_directive(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.level
        }
    }

    /// Install the global subscriber
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber has already been installed
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()));

        match self.format {
            LogFormat::Json => {
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_target(true)
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::fmt()
                    .pretty()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .init();
            }
            LogFormat::Text => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_level(true)
                    .init();
            }
        }
    }
}
