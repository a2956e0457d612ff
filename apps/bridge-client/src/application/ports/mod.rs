//! Application Ports
//!
//! The bridge transport is the single driven port: how the client talks to
//! the remote terminal process. The HTTP adapter and the in-memory stub both
//! implement it.

mod transport;

pub use transport::{BridgeTransport, Endpoint, Operation, TransportError};
