#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::too_many_lines)
)]

//! Bridge Stub - Development Bridge Server
//!
//! Serves the bridge's JSON-over-HTTP protocol from a deterministic data
//! set so `bridge-client` can run end to end without a trading terminal.
//!
//! - `config`: Environment-driven server settings
//! - `market`: Seeded random-walk quotes, bars and symbol specs
//! - `server`: Axum router, handlers and the serve loop

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Environment-driven server settings.
pub mod config;

/// Deterministic market data.
pub mod market;

/// HTTP router and serve loop.
pub mod server;

pub use config::StubServerConfig;
pub use market::StubMarket;
pub use server::{SharedMarket, StubServerError, create_router, serve, serve_on};
