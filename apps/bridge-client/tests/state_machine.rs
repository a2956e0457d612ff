//! Connection State Machine Integration Tests
//!
//! Drives `BridgeClient` against the in-memory `StubBridge` through every
//! lifecycle transition.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use proptest::prelude::*;
use rust_decimal::Decimal;

use bridge_client::{
    BridgeClient, ClientError, ConnectionState, Granularity, Operation, RetryConfig, StubBridge,
    Symbol, TransportError,
};

const TIMEOUT: Duration = Duration::from_secs(1);

fn connected_client(stub: &StubBridge) -> BridgeClient<StubBridge> {
    let mut client = BridgeClient::with_retry(stub.clone(), RetryConfig::immediate(3));
    client.connect("127.0.0.1", 5000, TIMEOUT).unwrap();
    client
}

fn seed_quote(stub: &StubBridge, symbol: &str, bid: i64) {
    stub.seed_quote(StubBridge::sample_quote(
        Symbol::new(symbol).unwrap(),
        Decimal::new(bid, 0),
    ));
}

// =============================================================================
// Connect
// =============================================================================

#[test]
fn connect_to_reachable_stub_is_idempotent() {
    let stub = StubBridge::new();
    let mut client = BridgeClient::with_retry(stub.clone(), RetryConfig::immediate(3));
    assert_eq!(client.state(), ConnectionState::Disconnected);

    let state = client.connect("127.0.0.1", 5000, TIMEOUT).unwrap();
    assert_eq!(state, ConnectionState::Connected);
    assert_eq!(stub.handshake_count(), 1);

    let again = client.connect("127.0.0.1", 5000, TIMEOUT).unwrap();
    assert_eq!(again, ConnectionState::Connected);
    assert_eq!(stub.handshake_count(), 1, "no second handshake");
}

#[test]
fn unreachable_stub_makes_exactly_configured_attempts() {
    for max_attempts in 1..=4 {
        let stub = StubBridge::new();
        stub.set_reachable(false);
        let mut client =
            BridgeClient::with_retry(stub.clone(), RetryConfig::immediate(max_attempts));

        let err = client.connect("127.0.0.1", 5000, TIMEOUT).unwrap_err();

        match err {
            ClientError::Connection {
                attempts, source, ..
            } => {
                assert_eq!(attempts, max_attempts);
                assert!(matches!(source, TransportError::Unreachable { .. }));
            }
            other => panic!("expected Connection error, got {other:?}"),
        }
        assert_eq!(stub.handshake_count(), max_attempts);
        assert_eq!(client.state(), ConnectionState::Failed);
        assert!(!stub.session_open());
    }
}

#[test]
fn backoff_waits_between_attempts() {
    let stub = StubBridge::new();
    stub.refuse_next_handshakes(2);
    let retry = RetryConfig::new(3, Duration::from_millis(20), 0.0);
    let mut client = BridgeClient::with_retry(stub.clone(), retry);

    let started = std::time::Instant::now();
    client.connect("127.0.0.1", 5000, TIMEOUT).unwrap();

    // 20ms after the first failure, 40ms after the second.
    assert!(started.elapsed() >= Duration::from_millis(60));
    assert_eq!(stub.handshake_count(), 3);
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[test]
fn failed_client_can_connect_again() {
    let stub = StubBridge::new();
    stub.set_reachable(false);
    let mut client = BridgeClient::with_retry(stub.clone(), RetryConfig::immediate(2));
    assert!(client.connect("127.0.0.1", 5000, TIMEOUT).is_err());
    assert_eq!(client.state(), ConnectionState::Failed);

    stub.set_reachable(true);
    assert_eq!(
        client.connect("127.0.0.1", 5000, TIMEOUT).unwrap(),
        ConnectionState::Connected
    );
}

#[test]
fn every_connect_gets_a_full_attempt_budget() {
    let stub = StubBridge::new();
    stub.set_reachable(false);
    let mut client = BridgeClient::with_retry(stub.clone(), RetryConfig::immediate(3));

    assert!(client.connect("127.0.0.1", 5000, TIMEOUT).is_err());
    assert_eq!(stub.handshake_count(), 3);

    let err = client.reconnect().unwrap_err();
    assert!(matches!(err, ClientError::Connection { attempts: 3, .. }));
    assert_eq!(stub.handshake_count(), 6);
}

// =============================================================================
// Preconditions and arguments
// =============================================================================

#[test]
fn accessors_require_connection() {
    let stub = StubBridge::new();
    seed_quote(&stub, "EURUSD", 1);
    let mut client = BridgeClient::with_retry(stub.clone(), RetryConfig::immediate(3));

    assert!(matches!(
        client.account_info(),
        Err(ClientError::NotConnected {
            state: ConnectionState::Disconnected
        })
    ));
    assert!(matches!(
        client.quote("EURUSD"),
        Err(ClientError::NotConnected { .. })
    ));
    assert!(matches!(
        client.historical_bars("EURUSD", Granularity::M1, 10),
        Err(ClientError::NotConnected { .. })
    ));
    assert!(matches!(
        client.symbols(),
        Err(ClientError::NotConnected { .. })
    ));
    assert_eq!(stub.call_count(Operation::Quote), 0);
}

#[test]
fn zero_count_is_invalid_in_every_state() {
    let stub = StubBridge::new();
    let mut client = BridgeClient::with_retry(stub.clone(), RetryConfig::immediate(1));

    let check = |client: &mut BridgeClient<StubBridge>| {
        assert!(matches!(
            client.historical_bars("X", Granularity::M1, 0),
            Err(ClientError::InvalidArgument(_))
        ));
    };

    check(&mut client);

    client.connect("127.0.0.1", 5000, TIMEOUT).unwrap();
    check(&mut client);

    stub.set_reachable(false);
    client.disconnect();
    let _ = client.connect("127.0.0.1", 5000, TIMEOUT);
    assert_eq!(client.state(), ConnectionState::Failed);
    check(&mut client);

    assert_eq!(stub.call_count(Operation::HistoricalBars), 0);
}

proptest! {
    #[test]
    fn count_outside_range_never_reaches_transport(count in prop_oneof![Just(0usize), 10_001usize..1_000_000]) {
        let stub = StubBridge::new();
        let mut client = connected_client(&stub);

        let result = client.historical_bars("X", Granularity::H1, count);

        prop_assert!(matches!(result, Err(ClientError::InvalidArgument(_))));
        prop_assert_eq!(stub.call_count(Operation::HistoricalBars), 0);
        prop_assert_eq!(client.state(), ConnectionState::Connected);
    }

    #[test]
    fn bars_never_exceed_count(seeded in 0usize..200, count in 1usize..300) {
        let stub = StubBridge::new();
        stub.seed_bars("X", Granularity::M5, StubBridge::sample_bars(seeded, Granularity::M5));
        let mut client = connected_client(&stub);

        let bars = client.historical_bars("X", Granularity::M5, count).unwrap();

        prop_assert_eq!(bars.len(), seeded.min(count));
        prop_assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}

// =============================================================================
// Data round trips
// =============================================================================

#[test]
fn fifty_seeded_bars_round_trip() {
    let stub = StubBridge::new();
    let seed = StubBridge::sample_bars(50, Granularity::M1);
    stub.seed_bars("X", Granularity::M1, seed.clone());
    let mut client = connected_client(&stub);

    let bars = client.historical_bars("X", Granularity::M1, 100).unwrap();

    assert_eq!(bars.len(), 50);
    assert_eq!(bars, seed);
    assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[test]
fn descending_history_is_returned_ascending() {
    let stub = StubBridge::new();
    let mut seed = StubBridge::sample_bars(10, Granularity::H1);
    seed.reverse();
    stub.seed_bars("X", Granularity::H1, seed);
    let mut client = connected_client(&stub);

    let bars = client.historical_bars("X", Granularity::H1, 3).unwrap();

    assert_eq!(bars.len(), 3);
    assert_eq!(bars[0].open, Decimal::new(107, 0));
    assert_eq!(bars[2].open, Decimal::new(109, 0));
}

#[test]
fn sequential_quotes_are_not_cached() {
    let stub = StubBridge::new();
    seed_quote(&stub, "EURUSD", 1);
    let mut client = connected_client(&stub);

    let first = client.quote("EURUSD").unwrap();
    seed_quote(&stub, "EURUSD", 2);
    let second = client.quote("EURUSD").unwrap();

    assert_eq!(first.bid, Decimal::new(1, 0));
    assert_eq!(second.bid, Decimal::new(2, 0));
    assert_eq!(stub.call_count(Operation::Quote), 2);
}

#[test]
fn account_snapshot_matches_seed() {
    let stub = StubBridge::new();
    let mut client = connected_client(&stub);

    let account = client.account_info().unwrap();

    assert_eq!(account, StubBridge::sample_account());
}

// =============================================================================
// Failures during a session
// =============================================================================

#[test]
fn third_quote_failure_fails_session_until_reconnect() {
    let stub = StubBridge::new();
    seed_quote(&stub, "EURUSD", 1);
    stub.fail_call(
        Operation::Quote,
        3,
        TransportError::Timeout("injected".to_string()),
    );
    let mut client = connected_client(&stub);

    client.quote("EURUSD").unwrap();
    client.quote("EURUSD").unwrap();

    let err = client.quote("EURUSD").unwrap_err();
    assert!(matches!(
        err,
        ClientError::Bridge {
            operation: Operation::Quote,
            source: TransportError::Timeout(_),
        }
    ));
    assert!(err.is_connectivity_failure());
    assert_eq!(client.state(), ConnectionState::Failed);
    assert!(!stub.session_open());

    // No transparent reconnection.
    assert!(matches!(
        client.quote("EURUSD"),
        Err(ClientError::NotConnected {
            state: ConnectionState::Failed
        })
    ));
    assert_eq!(stub.call_count(Operation::Quote), 3);

    assert_eq!(client.reconnect().unwrap(), ConnectionState::Connected);
    assert!(client.quote("EURUSD").is_ok());
}

#[test]
fn unknown_symbol_keeps_session() {
    let stub = StubBridge::new();
    seed_quote(&stub, "EURUSD", 1);
    let mut client = connected_client(&stub);

    let err = client.quote("NOPE").unwrap_err();

    assert_eq!(
        err,
        ClientError::SymbolNotFound {
            symbol: "NOPE".to_string()
        }
    );
    assert!(!err.is_connectivity_failure());
    assert_eq!(client.state(), ConnectionState::Connected);
    assert!(client.quote("EURUSD").is_ok());
}

#[test]
fn account_failure_is_not_retried() {
    let stub = StubBridge::new();
    stub.fail_call(
        Operation::AccountInfo,
        1,
        TransportError::Remote {
            status: 500,
            message: "terminal error".to_string(),
        },
    );
    let mut client = connected_client(&stub);

    assert!(matches!(
        client.account_info(),
        Err(ClientError::Bridge { .. })
    ));
    assert_eq!(stub.call_count(Operation::AccountInfo), 1);
    assert_eq!(stub.handshake_count(), 1);
}

// =============================================================================
// Disconnect
// =============================================================================

#[test]
fn disconnect_from_every_state_ends_disconnected() {
    let stub = StubBridge::new();
    let mut client = BridgeClient::with_retry(stub.clone(), RetryConfig::immediate(1));

    // Disconnected
    client.disconnect();
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // Connected
    client.connect("127.0.0.1", 5000, TIMEOUT).unwrap();
    client.disconnect();
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(!stub.session_open());

    // Failed
    stub.set_reachable(false);
    let _ = client.connect("127.0.0.1", 5000, TIMEOUT);
    assert_eq!(client.state(), ConnectionState::Failed);
    client.disconnect();
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // Repeated
    client.disconnect();
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[test]
fn symbol_search_over_seeded_universe() {
    let stub = StubBridge::new();
    for name in ["EURUSD", "GBPUSD", "BTCUSD", "XAUEUR"] {
        stub.add_symbol_info(StubBridge::sample_symbol_info(Symbol::new(name).unwrap()));
    }
    let mut client = connected_client(&stub);

    let usd = client.search_symbols("usd").unwrap();
    let names: Vec<&str> = usd.iter().map(Symbol::as_str).collect();
    assert_eq!(names, ["BTCUSD", "EURUSD", "GBPUSD"]);

    let info = client.symbol_info("xaueur").unwrap();
    assert_eq!(info.symbol.as_str(), "XAUEUR");
}
