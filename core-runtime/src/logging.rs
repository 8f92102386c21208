//! # Logging Infrastructure
//!
//! Sets up `tracing` for the dashboard core. Hosts call [`init_logging`]
//! once at startup; every core crate then logs through the `tracing`
//! macros.
//!
//! Token values must never reach the logs. Token-bearing types redact
//! their `Debug` output, and log statements carry scope keys or subjects
//! instead of raw credentials.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line output for development
    Pretty,
    /// Structured JSON for log aggregation
    Json,
    /// Single-line output
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Explicit filter directive; overrides `RUST_LOG` when set
    pub filter: Option<String>,
    /// Fallback directive when neither `filter` nor `RUST_LOG` is set
    pub default_directive: String,
    /// Include the event target (module path) in output
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: None,
            default_directive: "info".to_string(),
            display_target: true,
        }
    }
}

/// Initializes the global tracing subscriber.
///
/// # Errors
///
/// Returns `Error::Config` for an unparsable filter directive and
/// `Error::Internal` when a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match &config.filter {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", directive, e)))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.default_directive)),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.display_target);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    result.map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))
}
