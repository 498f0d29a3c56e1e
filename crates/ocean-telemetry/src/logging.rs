//! Structured logging initialization.
//!
//! `RUST_LOG` selects the filter (default `info,ocean=debug`). `RUST_ENV=production`
//! switches to JSON lines; anything else gets the pretty formatter.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "info,ocean=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn for_environment(rust_env: Option<&str>) -> Self {
        match rust_env {
            Some("production") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

impl LogSettings {
    pub fn from_env() -> Self {
        let filter = std::env::var(EnvFilter::DEFAULT_ENV)
            .ok()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let format = LogFormat::for_environment(std::env::var("RUST_ENV").ok().as_deref());
        Self { filter, format }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Initialize logging from the environment.
pub fn init_logging() -> TelemetryResult<()> {
    init_logging_with(&LogSettings::from_env())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging_with(settings: &LogSettings) -> TelemetryResult<()> {
    let env_filter = EnvFilter::try_new(&settings.filter)
        .map_err(|e| TelemetryError::InvalidFilter(format!("{}: {e}", settings.filter)))?;

    let result = match settings.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(true))
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
