//! Stub Server Configuration
//!
//! Loaded from environment variables; unparseable values fall back to defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use bridge_client::Symbol;

/// Stub server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubServerConfig {
    /// Bind address.
    pub host: IpAddr,
    /// Bind port.
    pub port: u16,
    /// Symbols the stub offers.
    pub symbols: Vec<Symbol>,
    /// Seed for the random-walk data set.
    pub seed: u64,
}

impl Default for StubServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            symbols: default_symbols(),
            seed: 42,
        }
    }
}

impl StubServerConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let symbols = var("BRIDGE_STUB_SYMBOLS")
            .map(|list| parse_symbols(&list))
            .filter(|symbols| !symbols.is_empty())
            .unwrap_or(defaults.symbols);

        Self {
            host: var("BRIDGE_STUB_HOST")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.host),
            port: var("BRIDGE_STUB_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            symbols,
            seed: var("BRIDGE_STUB_SEED")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.seed),
        }
    }

    /// Socket address to bind.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Parse a comma-separated symbol list, skipping invalid entries.
fn parse_symbols(list: &str) -> Vec<Symbol> {
    let mut symbols: Vec<Symbol> = list
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| match Symbol::new(s) {
            Ok(symbol) => Some(symbol),
            Err(e) => {
                tracing::warn!(symbol = s, error = %e, "Ignoring invalid stub symbol");
                None
            }
        })
        .collect();
    symbols.sort();
    symbols.dedup();
    symbols
}

fn default_symbols() -> Vec<Symbol> {
    parse_symbols("BTCUSD,EURUSD")
}
