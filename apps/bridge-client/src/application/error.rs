//! Client error taxonomy.

use crate::application::ports::{Operation, TransportError};
use crate::domain::{ConnectionState, DomainError};

/// Errors surfaced by `BridgeClient`.
///
/// Variants are deliberately distinct so callers can decide what to do:
/// connectivity failures may justify a demo-data fallback, caller bugs
/// (`InvalidArgument`) and unknown symbols never should.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// A request was issued without a connected session.
    #[error("not connected to bridge (state: {state})")]
    NotConnected {
        /// State at the time of the call.
        state: ConnectionState,
    },

    /// The handshake failed on every attempt.
    #[error("connection to bridge at {endpoint} failed after {attempts} attempt(s): {source}")]
    Connection {
        /// Target endpoint.
        endpoint: String,
        /// Attempts made.
        attempts: u32,
        /// Cause of the last failed attempt.
        #[source]
        source: TransportError,
    },

    /// Transport failure during an established session.
    #[error("bridge failure during {operation}: {source}")]
    Bridge {
        /// Operation that failed.
        operation: Operation,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },

    /// The remote reports the symbol as unknown.
    #[error("symbol not found: {symbol}")]
    SymbolNotFound {
        /// The unknown symbol.
        symbol: String,
    },

    /// A caller-supplied argument is out of contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// Whether the failure is about reaching the bridge at all.
    ///
    /// True for `NotConnected`, `Connection` and `Bridge`.
    #[must_use]
    pub const fn is_connectivity_failure(&self) -> bool {
        matches!(
            self,
            Self::NotConnected { .. } | Self::Connection { .. } | Self::Bridge { .. }
        )
    }
}

impl From<DomainError> for ClientError {
    fn from(err: DomainError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
