//! Bridge Transport Port (Driven Port)
//!
//! Request/response interface to the remote terminal process. A transport
//! holds at most one open session; `handshake` opens it and `close`
//! releases it.

use std::fmt;
use std::time::Duration;

use crate::domain::{AccountSnapshot, Bar, DomainError, Granularity, Quote, Symbol, SymbolInfo};

// =============================================================================
// Endpoint
// =============================================================================

/// Network address of a bridge process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
    tls: bool,
}

impl Endpoint {
    /// Create a plain-HTTP endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the host is blank or the port is zero.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, DomainError> {
        let host = host.into().trim().to_string();
        if host.is_empty() {
            return Err(DomainError::invalid("host", "host cannot be empty"));
        }
        if port == 0 {
            return Err(DomainError::invalid("port", "port must be non-zero"));
        }
        Ok(Self {
            host,
            port,
            tls: false,
        })
    }

    /// Use HTTPS (tunnelled bridges).
    #[must_use]
    pub const fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Whether the endpoint uses HTTPS.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        self.tls
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Named remote operation, used for logs, metrics and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Session handshake.
    Handshake,
    /// Account snapshot.
    AccountInfo,
    /// Last tick for a symbol.
    Quote,
    /// Historical bars.
    HistoricalBars,
    /// Symbol contract specification.
    SymbolInfo,
    /// Symbol list.
    Symbols,
}

impl Operation {
    /// Snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Handshake => "handshake",
            Self::AccountInfo => "account_info",
            Self::Quote => "quote",
            Self::HistoricalBars => "historical_bars",
            Self::SymbolInfo => "symbol_info",
            Self::Symbols => "symbols",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Transport-level failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The remote could not be reached (refused, DNS, reset).
    #[error("bridge unreachable at {endpoint}: {message}")]
    Unreachable {
        /// Target endpoint.
        endpoint: String,
        /// Underlying cause.
        message: String,
    },

    /// The call did not complete within its timeout.
    #[error("bridge call timed out: {0}")]
    Timeout(String),

    /// The remote answered the handshake but is not ready to serve.
    #[error("bridge not ready: {0}")]
    Unhealthy(String),

    /// The remote returned an error response.
    #[error("bridge returned {status}: {message}")]
    Remote {
        /// HTTP status (or transport-specific code).
        status: u16,
        /// Error message from the remote.
        message: String,
    },

    /// The response could not be decoded.
    #[error("malformed bridge response: {0}")]
    Decode(String),

    /// The remote reports the symbol as unknown.
    #[error("symbol not found: {symbol}")]
    SymbolNotFound {
        /// The unknown symbol.
        symbol: String,
    },

    /// No session is open on this transport.
    #[error("no open bridge session")]
    NoSession,
}

// =============================================================================
// Port
// =============================================================================

/// Driven port to the remote terminal process.
///
/// All calls block. Implementations must not retry internally; retry policy
/// belongs to the caller.
pub trait BridgeTransport {
    /// Open a session with the remote. On error no session is held.
    fn handshake(&mut self, endpoint: &Endpoint, timeout: Duration) -> Result<(), TransportError>;

    /// Fetch the account snapshot.
    fn account_info(&mut self) -> Result<AccountSnapshot, TransportError>;

    /// Fetch the last tick for `symbol`.
    fn tick(&mut self, symbol: &Symbol) -> Result<Quote, TransportError>;

    /// Fetch up to `count` most recent bars, in any order.
    fn rates(
        &mut self,
        symbol: &Symbol,
        granularity: Granularity,
        count: usize,
    ) -> Result<Vec<Bar>, TransportError>;

    /// Fetch the contract specification of `symbol`.
    fn symbol_info(&mut self, symbol: &Symbol) -> Result<SymbolInfo, TransportError>;

    /// List the symbols offered by the terminal.
    fn symbols(&mut self) -> Result<Vec<Symbol>, TransportError>;

    /// Release the session. Idempotent.
    fn close(&mut self);
}
