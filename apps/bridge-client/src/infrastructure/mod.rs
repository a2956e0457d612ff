//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations of the transport port plus the ambient stack
//! (configuration, retry policy, logging, metrics).

/// Configuration loaded from the environment.
pub mod config;

/// JSON-over-HTTP transport for the bridge process.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Linear handshake backoff.
pub mod retry;

/// In-memory bridge for tests and offline development.
pub mod stub;

/// Tracing subscriber setup.
pub mod telemetry;
