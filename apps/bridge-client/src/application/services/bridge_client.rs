//! Bridge Client Service
//!
//! Synchronous facade over a [`BridgeTransport`]: owns the session, drives
//! the connection state machine, validates arguments, and maps transport
//! faults onto [`ClientError`].
//!
//! # Retry Policy
//!
//! Only `connect` retries, with linear backoff from [`RetryConfig`]. Data
//! accessors make exactly one attempt; a transport fault moves the client to
//! `Failed` and the caller must `connect` again. A restarted bridge is never
//! masked by a hidden retry.

use std::time::{Duration, Instant};

use crate::application::error::ClientError;
use crate::application::ports::{BridgeTransport, Endpoint, Operation, TransportError};
use crate::domain::{
    AccountSnapshot, Bar, ConnectionState, Granularity, Quote, Symbol, SymbolInfo, most_recent,
};
use crate::infrastructure::metrics::{self, Outcome};
use crate::infrastructure::retry::{LinearBackoff, RetryConfig};

/// Largest bar count the bridge serves in one request.
pub const MAX_BAR_COUNT: usize = 10_000;

/// Client for one bridge session.
///
/// Every operation takes `&mut self`: one instance serves one caller at a
/// time. Share across threads only behind a mutex.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use bridge_client::{BridgeClient, ConnectionState, Granularity, StubBridge};
///
/// let stub = StubBridge::new();
/// stub.seed_bars("BTCUSD", Granularity::H1, StubBridge::sample_bars(24, Granularity::H1));
/// let mut client = BridgeClient::new(stub.clone());
///
/// let state = client.connect("127.0.0.1", 5000, Duration::from_secs(5)).unwrap();
/// assert_eq!(state, ConnectionState::Connected);
///
/// let bars = client.historical_bars("BTCUSD", Granularity::H1, 100).unwrap();
/// assert_eq!(bars.len(), 24);
///
/// client.disconnect();
/// assert_eq!(client.state(), ConnectionState::Disconnected);
/// ```
#[derive(Debug)]
pub struct BridgeClient<T: BridgeTransport> {
    transport: T,
    state: ConnectionState,
    retry: RetryConfig,
    last_target: Option<(Endpoint, Duration)>,
}

impl<T: BridgeTransport> BridgeClient<T> {
    /// Create a disconnected client with the default retry policy.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_retry(transport, RetryConfig::default())
    }

    /// Create a disconnected client with a custom retry policy.
    #[must_use]
    pub fn with_retry(transport: T, retry: RetryConfig) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            retry,
            last_target: None,
        }
    }

    /// Current session state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Endpoint of the last `connect` call, if any.
    #[must_use]
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.last_target.as_ref().map(|(endpoint, _)| endpoint)
    }

    /// Retry policy used by `connect`.
    #[must_use]
    pub const fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Handshake with the bridge at `host:port` over plain HTTP.
    ///
    /// See [`BridgeClient::connect_endpoint`].
    pub fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<ConnectionState, ClientError> {
        if self.state.is_connected() {
            tracing::debug!(endpoint = ?self.endpoint(), "Already connected, ignoring connect");
            return Ok(self.state);
        }
        let endpoint = Endpoint::new(host, port)?;
        self.connect_endpoint(endpoint, timeout)
    }

    /// Handshake with the bridge at `endpoint`.
    ///
    /// No-op returning `Connected` if a session is already open. Otherwise
    /// makes up to `max_attempts` handshakes with linear backoff between
    /// them; on exhaustion the client is `Failed` and the last cause is
    /// returned inside [`ClientError::Connection`].
    pub fn connect_endpoint(
        &mut self,
        endpoint: Endpoint,
        timeout: Duration,
    ) -> Result<ConnectionState, ClientError> {
        if self.state.is_connected() {
            tracing::debug!(endpoint = %endpoint, "Already connected, ignoring connect");
            return Ok(self.state);
        }

        if timeout.is_zero() {
            return Err(ClientError::InvalidArgument(
                "timeout must be non-zero".to_string(),
            ));
        }

        // A failed session may still hold a handle.
        self.transport.close();
        self.last_target = Some((endpoint.clone(), timeout));

        let mut backoff = LinearBackoff::new(self.retry.clone());

        loop {
            tracing::info!(
                endpoint = %endpoint,
                attempt = backoff.attempt_count() + 1,
                max_attempts = self.retry.max_attempts,
                "Connecting to bridge"
            );

            match self.transport.handshake(&endpoint, timeout) {
                Ok(()) => {
                    metrics::record_connect_attempt(Outcome::Success);
                    self.transition(ConnectionState::Connected);
                    return Ok(self.state);
                }
                Err(err) => {
                    metrics::record_connect_attempt(Outcome::Failure);

                    if let Some(delay) = backoff.next_delay() {
                        tracing::warn!(
                            endpoint = %endpoint,
                            error = %err,
                            attempt = backoff.attempt_count(),
                            delay_ms = delay.as_millis(),
                            "Bridge handshake failed, retrying"
                        );
                        std::thread::sleep(delay);
                        continue;
                    }

                    tracing::error!(
                        endpoint = %endpoint,
                        error = %err,
                        attempts = backoff.attempt_count(),
                        "Bridge handshake failed, giving up"
                    );
                    self.transport.close();
                    self.transition(ConnectionState::Failed);
                    return Err(ClientError::Connection {
                        endpoint: endpoint.to_string(),
                        attempts: backoff.attempt_count(),
                        source: err,
                    });
                }
            }
        }
    }

    /// `connect` again to the endpoint and timeout of the last `connect` call.
    pub fn reconnect(&mut self) -> Result<ConnectionState, ClientError> {
        let Some((endpoint, timeout)) = self.last_target.clone() else {
            return Err(ClientError::NotConnected { state: self.state });
        };
        self.connect_endpoint(endpoint, timeout)
    }

    /// Release the session. Idempotent; never fails.
    pub fn disconnect(&mut self) {
        self.transport.close();
        if self.state != ConnectionState::Disconnected {
            tracing::info!(from = %self.state, "Disconnected from bridge");
            self.transition(ConnectionState::Disconnected);
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Fetch a fresh account snapshot.
    pub fn account_info(&mut self) -> Result<AccountSnapshot, ClientError> {
        self.request(Operation::AccountInfo, T::account_info)
    }

    /// Fetch the last tick for `symbol`.
    pub fn quote(&mut self, symbol: &str) -> Result<Quote, ClientError> {
        let symbol = Symbol::new(symbol)?;
        self.request(Operation::Quote, |transport| transport.tick(&symbol))
    }

    /// Fetch up to `count` most recent bars, ascending by timestamp.
    ///
    /// `count` must be in `1..=MAX_BAR_COUNT`; this is checked before the
    /// connection state. Fewer bars are returned if less history exists.
    pub fn historical_bars(
        &mut self,
        symbol: &str,
        granularity: Granularity,
        count: usize,
    ) -> Result<Vec<Bar>, ClientError> {
        if count == 0 || count > MAX_BAR_COUNT {
            return Err(ClientError::InvalidArgument(format!(
                "count must be between 1 and {MAX_BAR_COUNT}, got {count}"
            )));
        }
        let symbol = Symbol::new(symbol)?;

        let bars = self.request(Operation::HistoricalBars, |transport| {
            transport.rates(&symbol, granularity, count)
        })?;

        tracing::debug!(
            symbol = %symbol,
            granularity = %granularity,
            requested = count,
            received = bars.len(),
            "Historical bars received"
        );
        Ok(most_recent(bars, count))
    }

    /// Fetch the contract specification of `symbol`.
    pub fn symbol_info(&mut self, symbol: &str) -> Result<SymbolInfo, ClientError> {
        let symbol = Symbol::new(symbol)?;
        self.request(Operation::SymbolInfo, |transport| {
            transport.symbol_info(&symbol)
        })
    }

    /// List all symbols offered by the terminal.
    pub fn symbols(&mut self) -> Result<Vec<Symbol>, ClientError> {
        self.request(Operation::Symbols, T::symbols)
    }

    /// Symbols whose name contains `pattern`, case-insensitively.
    pub fn search_symbols(&mut self, pattern: &str) -> Result<Vec<Symbol>, ClientError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(ClientError::InvalidArgument(
                "search pattern cannot be empty".to_string(),
            ));
        }
        let symbols = self.symbols()?;
        Ok(symbols.into_iter().filter(|s| s.matches(pattern)).collect())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Issue one request. Unknown symbols leave the session intact; any other
    /// fault fails the session.
    fn request<R>(
        &mut self,
        operation: Operation,
        call: impl FnOnce(&mut T) -> Result<R, TransportError>,
    ) -> Result<R, ClientError> {
        if !self.state.is_connected() {
            return Err(ClientError::NotConnected { state: self.state });
        }

        let started = Instant::now();
        let result = call(&mut self.transport);
        let elapsed = started.elapsed();

        match result {
            Ok(value) => {
                metrics::record_request(operation, Outcome::Success, elapsed);
                Ok(value)
            }
            Err(TransportError::SymbolNotFound { symbol }) => {
                metrics::record_request(operation, Outcome::Rejected, elapsed);
                tracing::warn!(operation = %operation, symbol = %symbol, "Symbol not found");
                Err(ClientError::SymbolNotFound { symbol })
            }
            Err(source) => {
                metrics::record_request(operation, Outcome::Failure, elapsed);
                tracing::error!(
                    operation = %operation,
                    error = %source,
                    "Bridge request failed, session marked failed"
                );
                self.transport.close();
                self.transition(ConnectionState::Failed);
                Err(ClientError::Bridge { operation, source })
            }
        }
    }

    fn transition(&mut self, to: ConnectionState) {
        if self.state != to {
            tracing::info!(from = %self.state, to = %to, "Bridge connection state changed");
        }
        self.state = to;
        if let Some((endpoint, _)) = &self.last_target {
            metrics::set_connection_state(endpoint, to);
        }
    }
}

impl<T: BridgeTransport> Drop for BridgeClient<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
