//! Application Services
//!
//! - `bridge_client`: connection lifecycle and typed accessors over a transport.

mod bridge_client;

pub use bridge_client::{BridgeClient, MAX_BAR_COUNT};
