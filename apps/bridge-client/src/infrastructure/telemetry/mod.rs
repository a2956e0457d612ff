//! Tracing Subscriber Setup
//!
//! Installs a `tracing-subscriber` fmt layer filtered by `RUST_LOG`, with
//! defaults that keep this crate at `info` and quiet the HTTP stack.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: extra filter directives (default: `info`)
//! - `LOG_FORMAT`: `json` for JSON lines, anything else for human-readable output

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Default directives applied on top of `RUST_LOG`.
const DEFAULT_DIRECTIVES: [&str; 4] = [
    "bridge_client=info",
    "bridge_stub=info",
    "reqwest=warn",
    "hyper=warn",
];

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parse format from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Output format.
    pub format: LogFormat,
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let format = std::env::var("LOG_FORMAT")
            .map(|s| LogFormat::from_str_case_insensitive(&s))
            .unwrap_or_default();
        Self { format }
    }
}

/// Telemetry initialization error.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A filter directive did not parse.
    #[error("invalid log directive: {0}")]
    Directive(#[from] ParseError),
    /// A global subscriber was already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}

/// Initialize logging with configuration from the environment.
pub fn init() -> Result<(), TelemetryError> {
    init_with_config(&TelemetryConfig::from_env())
}

/// Initialize logging with custom configuration.
pub fn init_with_config(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter()?;

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false),
            )
            .try_init()?,
    }

    Ok(())
}

fn build_filter() -> Result<EnvFilter, ParseError> {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in DEFAULT_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::from_str_case_insensitive("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_case_insensitive(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::from_str_case_insensitive("text"), LogFormat::Pretty);
    }

    #[test]
    fn default_directives_parse() {
        assert!(build_filter().is_ok());
    }

    #[test]
    fn second_init_reports_error() {
        let config = TelemetryConfig::default();
        let _ = init_with_config(&config);
        assert!(matches!(
            init_with_config(&config),
            Err(TelemetryError::AlreadyInstalled(_))
        ));
    }
}
