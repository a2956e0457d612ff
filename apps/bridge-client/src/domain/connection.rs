//! Connection state of a bridge session.

use std::fmt;

use serde::Serialize;

/// Lifecycle state of a `BridgeClient` session.
///
/// ```text
/// Disconnected --connect ok--> Connected --request failure--> Failed
///      ^                          |                             |
///      +-------- disconnect ------+------- disconnect ----------+
///                                 ^                             |
///                                 +------- connect ok ----------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// No session. Initial state, and the state after `disconnect`.
    #[default]
    Disconnected,
    /// Handshake succeeded; requests may be issued.
    Connected,
    /// A handshake exhausted its retries or a request hit a transport fault.
    Failed,
}

impl ConnectionState {
    /// Whether data requests are permitted in this state.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Lowercase name, used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }

    /// Numeric encoding for the connection-state gauge.
    #[must_use]
    pub const fn gauge_value(self) -> f64 {
        match self {
            Self::Disconnected => 0.0,
            Self::Connected => 1.0,
            Self::Failed => 2.0,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn only_connected_permits_requests() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(!ConnectionState::Failed.is_connected());
    }

    #[test]
    fn serializes_screaming_case() {
        assert_eq!(
            serde_json::to_string(&ConnectionState::Failed).unwrap(),
            "\"FAILED\""
        );
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }
}
