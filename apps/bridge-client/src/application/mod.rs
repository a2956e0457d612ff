//! Application Layer
//!
//! The `BridgeClient` service, its error taxonomy, and the transport port it
//! drives.

/// Client error taxonomy.
pub mod error;

/// Port definitions (interfaces to the remote terminal).
pub mod ports;

/// Application services.
pub mod services;

pub use error::ClientError;
pub use services::BridgeClient;
