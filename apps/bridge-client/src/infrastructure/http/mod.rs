//! HTTP Bridge Transport
//!
//! Talks to the bridge process over its JSON-over-HTTP protocol:
//! - `GET /health` as the handshake
//! - `GET /account_info`, `GET /symbols`
//! - `POST /get_tick`, `POST /get_rates`, `POST /symbol_info`
//!
//! Unknown symbols are reported as HTTP 404 with code `SYMBOL_NOT_FOUND`.

pub mod api_types;
mod http_client;

pub use http_client::HttpBridgeTransport;
