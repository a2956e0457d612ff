//! Configuration Module
//!
//! Environment-driven configuration for the bridge client and probe binary.

mod settings;

pub use settings::{BridgeConfig, ConfigError, EndpointSettings, ProbeSettings};
