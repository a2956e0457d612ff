//! Prometheus Metrics Module
//!
//! Client-side instrumentation for the bridge session.
//!
//! # Metrics
//!
//! - `bridge_client_connect_attempts_total{outcome}`: handshake attempts
//! - `bridge_client_requests_total{operation,outcome}`: data requests
//! - `bridge_client_request_seconds{operation}`: request latency
//! - `bridge_client_connection_state{endpoint}`: 0 disconnected, 1 connected, 2 failed
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::application::ports::{Endpoint, Operation};
use crate::domain::ConnectionState;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder (once per process) and return its handle.
///
/// Subsequent calls return the handle installed by the first.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

fn register_metrics() {
    describe_counter!(
        "bridge_client_connect_attempts_total",
        "Bridge handshake attempts by outcome"
    );
    describe_counter!(
        "bridge_client_requests_total",
        "Bridge data requests by operation and outcome"
    );
    describe_histogram!(
        "bridge_client_request_seconds",
        "Bridge data request latency"
    );
    describe_gauge!(
        "bridge_client_connection_state",
        "Bridge session state per endpoint (0 disconnected, 1 connected, 2 failed)"
    );
}

/// Outcome label for attempts and requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Call succeeded.
    Success,
    /// Remote rejected the call semantically (e.g., unknown symbol).
    Rejected,
    /// Transport failure.
    Failure,
}

impl Outcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Rejected => "rejected",
            Self::Failure => "failure",
        }
    }
}

/// Record one handshake attempt.
pub fn record_connect_attempt(outcome: Outcome) {
    counter!(
        "bridge_client_connect_attempts_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record one data request and its latency.
pub fn record_request(operation: Operation, outcome: Outcome, elapsed: Duration) {
    counter!(
        "bridge_client_requests_total",
        "operation" => operation.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!(
        "bridge_client_request_seconds",
        "operation" => operation.as_str()
    )
    .record(elapsed.as_secs_f64());
}

/// Publish the session state of the client bound to `endpoint`.
pub fn set_connection_state(endpoint: &Endpoint, state: ConnectionState) {
    gauge!(
        "bridge_client_connection_state",
        "endpoint" => endpoint.to_string()
    )
    .set(state.gauge_value());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_as_str() {
        assert_eq!(Outcome::Success.as_str(), "success");
        assert_eq!(Outcome::Rejected.as_str(), "rejected");
        assert_eq!(Outcome::Failure.as_str(), "failure");
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_connect_attempt(Outcome::Failure);
        record_request(Operation::Quote, Outcome::Success, Duration::from_millis(3));
        let endpoint = Endpoint::new("localhost", 5000).unwrap();
        set_connection_state(&endpoint, ConnectionState::Connected);
    }
}
