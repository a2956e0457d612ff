//! Domain Layer
//!
//! Value types for the bridge session: connection state, instruments,
//! granularities and the records returned by the remote terminal.

/// Session lifecycle state.
pub mod connection;

/// Domain validation errors.
pub mod errors;

/// Bar granularity (timeframe).
pub mod granularity;

/// Account, quote, bar and symbol records.
pub mod records;

/// Instrument symbol value object.
pub mod symbol;

pub use connection::ConnectionState;
pub use errors::DomainError;
pub use granularity::Granularity;
pub use records::{AccountSnapshot, Bar, Quote, SymbolInfo, most_recent};
pub use symbol::Symbol;
