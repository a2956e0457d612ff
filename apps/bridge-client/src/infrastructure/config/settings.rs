//! Bridge Configuration Settings
//!
//! Configuration types for the bridge client, loaded from environment variables.

use std::time::Duration;

use crate::application::ports::Endpoint;
use crate::domain::{DomainError, Granularity};
use crate::infrastructure::retry::RetryConfig;

/// Bridge endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    /// Bridge host.
    pub host: String,
    /// Bridge port.
    pub port: u16,
    /// Use https.
    pub tls: bool,
    /// Per-call timeout, also used for the handshake.
    pub timeout: Duration,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            tls: false,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Settings for the `bridge-probe` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Symbol to quote and fetch bars for.
    pub symbol: String,
    /// Bar granularity.
    pub granularity: Granularity,
    /// Number of bars to fetch.
    pub bars: usize,
    /// Render Prometheus metrics to stderr on exit.
    pub render_metrics: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            symbol: "BTCUSD".to_string(),
            granularity: Granularity::H1,
            bars: 100,
            render_metrics: false,
        }
    }
}

/// Complete bridge client configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BridgeConfig {
    /// Endpoint settings.
    pub endpoint: EndpointSettings,
    /// Handshake retry policy.
    pub retry: RetryConfig,
    /// Probe binary settings.
    pub probe: ProbeSettings,
}

impl BridgeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `BRIDGE_HOST` is set but blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = match var("BRIDGE_HOST") {
            Some(host) if host.trim().is_empty() => {
                return Err(ConfigError::EmptyValue("BRIDGE_HOST".to_string()));
            }
            Some(host) => host.trim().to_string(),
            None => defaults.endpoint.host,
        };

        let endpoint = EndpointSettings {
            host,
            port: parse_var(&var, "BRIDGE_PORT").unwrap_or(defaults.endpoint.port),
            tls: parse_bool(&var, "BRIDGE_TLS").unwrap_or(defaults.endpoint.tls),
            timeout: parse_var(&var, "BRIDGE_TIMEOUT_SECS")
                .map_or(defaults.endpoint.timeout, Duration::from_secs),
        };

        let retry = RetryConfig::new(
            parse_var(&var, "BRIDGE_CONNECT_MAX_ATTEMPTS")
                .unwrap_or(defaults.retry.max_attempts)
                .max(1),
            parse_var(&var, "BRIDGE_CONNECT_BACKOFF_STEP_MS")
                .map_or(defaults.retry.backoff_step, Duration::from_millis),
            parse_var::<f64, _>(&var, "BRIDGE_CONNECT_JITTER")
                .filter(|j| (0.0..=1.0).contains(j))
                .unwrap_or(defaults.retry.jitter_factor),
        );

        let probe = ProbeSettings {
            symbol: var("BRIDGE_PROBE_SYMBOL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.probe.symbol),
            granularity: parse_var(&var, "BRIDGE_PROBE_GRANULARITY")
                .unwrap_or(defaults.probe.granularity),
            bars: parse_var(&var, "BRIDGE_PROBE_BARS").unwrap_or(defaults.probe.bars),
            render_metrics: parse_bool(&var, "BRIDGE_PROBE_METRICS")
                .unwrap_or(defaults.probe.render_metrics),
        };

        Ok(Self {
            endpoint,
            retry,
            probe,
        })
    }

    /// Build the validated endpoint.
    pub fn endpoint(&self) -> Result<Endpoint, DomainError> {
        Ok(Endpoint::new(&self.endpoint.host, self.endpoint.port)?.with_tls(self.endpoint.tls))
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn parse_var<T, F>(var: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    var(key).and_then(|v| v.trim().parse().ok())
}

fn parse_bool<F>(var: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    var(key).and_then(|v| match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<BridgeConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        BridgeConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.endpoint.host, "127.0.0.1");
        assert_eq!(config.endpoint.port, 5000);
        assert_eq!(config.endpoint.timeout, Duration::from_secs(10));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.backoff_step, Duration::from_secs(2));
        assert_eq!(config.probe.granularity, Granularity::H1);
    }

    #[test]
    fn overrides_apply() {
        let config = config_from(&[
            ("BRIDGE_HOST", " bridge.local "),
            ("BRIDGE_PORT", "8443"),
            ("BRIDGE_TLS", "true"),
            ("BRIDGE_TIMEOUT_SECS", "3"),
            ("BRIDGE_CONNECT_MAX_ATTEMPTS", "5"),
            ("BRIDGE_CONNECT_BACKOFF_STEP_MS", "250"),
            ("BRIDGE_CONNECT_JITTER", "0.2"),
            ("BRIDGE_PROBE_SYMBOL", "EURUSD"),
            ("BRIDGE_PROBE_GRANULARITY", "m15"),
            ("BRIDGE_PROBE_BARS", "20"),
            ("BRIDGE_PROBE_METRICS", "yes"),
        ])
        .unwrap();

        assert_eq!(config.endpoint.host, "bridge.local");
        assert_eq!(config.endpoint.port, 8443);
        assert!(config.endpoint.tls);
        assert_eq!(config.endpoint.timeout, Duration::from_secs(3));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.backoff_step, Duration::from_millis(250));
        assert!((config.retry.jitter_factor - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.probe.symbol, "EURUSD");
        assert_eq!(config.probe.granularity, Granularity::M15);
        assert_eq!(config.probe.bars, 20);
        assert!(config.probe.render_metrics);

        let endpoint = config.endpoint().unwrap();
        assert_eq!(endpoint.base_url(), "https://bridge.local:8443");
    }

    #[test]
    fn blank_host_rejected() {
        let result = config_from(&[("BRIDGE_HOST", "   ")]);
        assert!(matches!(result, Err(ConfigError::EmptyValue(key)) if key == "BRIDGE_HOST"));
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let config = config_from(&[
            ("BRIDGE_PORT", "not-a-port"),
            ("BRIDGE_TLS", "maybe"),
            ("BRIDGE_CONNECT_JITTER", "7"),
            ("BRIDGE_PROBE_GRANULARITY", "H2"),
        ])
        .unwrap();
        assert_eq!(config.endpoint.port, 5000);
        assert!(!config.endpoint.tls);
        assert!(config.retry.jitter_factor.abs() < f64::EPSILON);
        assert_eq!(config.probe.granularity, Granularity::H1);
    }

    #[test]
    fn attempts_clamped_to_one() {
        let config = config_from(&[("BRIDGE_CONNECT_MAX_ATTEMPTS", "0")]).unwrap();
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn zero_port_fails_endpoint_validation() {
        let config = config_from(&[("BRIDGE_PORT", "0")]).unwrap();
        assert!(config.endpoint().is_err());
    }
}
