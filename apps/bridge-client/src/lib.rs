#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Bridge Client - Trading Terminal Bridge Facade
//!
//! A synchronous client for the bridge process that fronts a trading
//! terminal. It owns one session at a time, tracks an explicit connection
//! state, retries only the connect handshake, and exposes typed accessors
//! for account snapshots, quotes and historical bars.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Value types with no I/O
//!   - `connection`: Connection state machine states
//!   - `records`: Account snapshots, quotes, bars, symbol specs
//!   - `symbol`, `granularity`: Validated identifiers
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: The `BridgeTransport` port and its error type
//!   - `services`: `BridgeClient`, the state machine facade
//!
//! - **Infrastructure**: Adapters and ambient stack
//!   - `http`: Blocking JSON-over-HTTP transport
//!   - `stub`: In-memory transport with failure injection
//!   - `retry`, `config`, `telemetry`, `metrics`
//!
//! # State Machine
//!
//! ```text
//! from          event                       to
//! Disconnected  connect ok                  Connected
//! Disconnected  retries exhausted           Failed
//! Connected     transport error on a call   Failed
//! Failed        connect / reconnect ok      Connected
//! any           disconnect                  Disconnected
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Value types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::{
    AccountSnapshot, Bar, ConnectionState, DomainError, Granularity, Quote, Symbol, SymbolInfo,
};

// Application
pub use application::ports::{BridgeTransport, Endpoint, Operation, TransportError};
pub use application::services::MAX_BAR_COUNT;
pub use application::{BridgeClient, ClientError};

// Infrastructure
pub use infrastructure::config::{BridgeConfig, ConfigError};
pub use infrastructure::http::HttpBridgeTransport;
pub use infrastructure::metrics::{get_metrics_handle, init_metrics};
pub use infrastructure::retry::RetryConfig;
pub use infrastructure::stub::StubBridge;
