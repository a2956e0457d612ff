//! In-memory stub bridge for testing.
//!
//! `StubBridge` implements [`BridgeTransport`] over seeded data. Clones share
//! state, so a test can hand one clone to a `BridgeClient` and keep another
//! to seed data, inject failures and inspect call counts.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::application::ports::{BridgeTransport, Endpoint, Operation, TransportError};
use crate::domain::{AccountSnapshot, Bar, Granularity, Quote, Symbol, SymbolInfo, most_recent};

/// Epoch of the first sample bar (2023-11-14T22:13:20Z).
const SAMPLE_EPOCH_SECS: i64 = 1_700_000_000;

#[derive(Debug)]
struct StubState {
    reachable: bool,
    refuse_handshakes: u32,
    session_open: bool,
    handshakes: u32,
    account: AccountSnapshot,
    quotes: HashMap<String, Quote>,
    bars: HashMap<(String, Granularity), Vec<Bar>>,
    infos: HashMap<String, SymbolInfo>,
    calls: HashMap<Operation, u32>,
    failures: HashMap<(Operation, u32), TransportError>,
}

impl StubState {
    fn known_symbols(&self) -> BTreeSet<String> {
        self.quotes
            .keys()
            .chain(self.infos.keys())
            .chain(self.bars.keys().map(|(symbol, _)| symbol))
            .cloned()
            .collect()
    }

    /// Count a call and return an injected failure for it, if any.
    fn begin(&mut self, operation: Operation) -> Result<(), TransportError> {
        if !self.session_open {
            return Err(TransportError::NoSession);
        }
        let count = self.calls.entry(operation).or_insert(0);
        *count += 1;
        match self.failures.remove(&(operation, *count)) {
            Some(err) => {
                self.session_open = false;
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn require_known(&self, symbol: &Symbol) -> Result<(), TransportError> {
        if self.known_symbols().contains(symbol.as_str()) {
            Ok(())
        } else {
            Err(TransportError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    }
}

/// Seeded in-memory remote with failure injection.
#[derive(Debug, Clone)]
pub struct StubBridge {
    state: Arc<Mutex<StubState>>,
}

impl Default for StubBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl StubBridge {
    /// Create a reachable stub with a sample account and no symbols.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StubState {
                reachable: true,
                refuse_handshakes: 0,
                session_open: false,
                handshakes: 0,
                account: Self::sample_account(),
                quotes: HashMap::new(),
                bars: HashMap::new(),
                infos: HashMap::new(),
                calls: HashMap::new(),
                failures: HashMap::new(),
            })),
        }
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Replace the account snapshot.
    pub fn set_account(&self, account: AccountSnapshot) {
        self.state.lock().account = account;
    }

    /// Set the quote returned for `quote.symbol`.
    pub fn seed_quote(&self, quote: Quote) {
        self.state
            .lock()
            .quotes
            .insert(quote.symbol.as_str().to_string(), quote);
    }

    /// Set the bar history for `(symbol, granularity)`.
    pub fn seed_bars(&self, symbol: &str, granularity: Granularity, bars: Vec<Bar>) {
        self.state
            .lock()
            .bars
            .insert((symbol.trim().to_uppercase(), granularity), bars);
    }

    /// Register a symbol's contract specification.
    pub fn add_symbol_info(&self, info: SymbolInfo) {
        self.state
            .lock()
            .infos
            .insert(info.symbol.as_str().to_string(), info);
    }

    // =========================================================================
    // Failure injection
    // =========================================================================

    /// Make every handshake fail as unreachable (or succeed again).
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    /// Refuse the next `n` handshakes, then accept.
    pub fn refuse_next_handshakes(&self, n: u32) {
        self.state.lock().refuse_handshakes = n;
    }

    /// Fail the `nth` (1-based, counted over the stub's lifetime) call of
    /// `operation` with `error`. The failure also drops the session.
    pub fn fail_call(&self, operation: Operation, nth: u32, error: TransportError) {
        self.state.lock().failures.insert((operation, nth), error);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Handshakes attempted so far.
    #[must_use]
    pub fn handshake_count(&self) -> u32 {
        self.state.lock().handshakes
    }

    /// Calls of `operation` made so far (including failed ones).
    #[must_use]
    pub fn call_count(&self, operation: Operation) -> u32 {
        self.state
            .lock()
            .calls
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    /// Whether a session is currently open.
    #[must_use]
    pub fn session_open(&self) -> bool {
        self.state.lock().session_open
    }

    // =========================================================================
    // Sample data
    // =========================================================================

    /// A demo account: 10 000 USD, 1:100, no open positions.
    #[must_use]
    pub fn sample_account() -> AccountSnapshot {
        AccountSnapshot {
            login: 5_000_001,
            balance: Decimal::new(10_000, 0),
            equity: Decimal::new(10_000, 0),
            currency: "USD".to_string(),
            leverage: 100,
            margin: Decimal::ZERO,
            free_margin: Decimal::new(10_000, 0),
            margin_level: None,
            profit: Decimal::ZERO,
        }
    }

    /// A quote with a one-cent spread above `bid`.
    #[must_use]
    pub fn sample_quote(symbol: Symbol, bid: Decimal) -> Quote {
        Quote {
            symbol,
            bid,
            ask: bid + Decimal::new(1, 2),
            last: bid,
            volume: 1,
            timestamp: sample_time(0),
        }
    }

    /// `count` contiguous ascending bars at `granularity`, prices rising by one.
    #[must_use]
    pub fn sample_bars(count: usize, granularity: Granularity) -> Vec<Bar> {
        let step = i64::try_from(granularity.duration().as_secs()).unwrap_or(i64::MAX);
        (0..count)
            .map(|i| {
                let i = i64::try_from(i).unwrap_or(i64::MAX);
                let open = Decimal::new(100, 0) + Decimal::from(i);
                Bar {
                    open,
                    high: open + Decimal::new(5, 1),
                    low: open - Decimal::new(5, 1),
                    close: open + Decimal::new(25, 2),
                    volume: 100 + u64::try_from(i).unwrap_or(0),
                    timestamp: sample_time(i.saturating_mul(step)),
                }
            })
            .collect()
    }

    /// A forex-style contract specification.
    #[must_use]
    pub fn sample_symbol_info(symbol: Symbol) -> SymbolInfo {
        SymbolInfo {
            description: format!("{symbol} sample instrument"),
            symbol,
            currency_base: "USD".to_string(),
            currency_profit: "USD".to_string(),
            currency_margin: "USD".to_string(),
            digits: 2,
            point: Decimal::new(1, 2),
            spread: 1,
            volume_min: Decimal::new(1, 2),
            volume_max: Decimal::new(100, 0),
            volume_step: Decimal::new(1, 2),
        }
    }
}

fn sample_time(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(SAMPLE_EPOCH_SECS.saturating_add(offset_secs), 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl BridgeTransport for StubBridge {
    fn handshake(&mut self, endpoint: &Endpoint, _timeout: Duration) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.handshakes += 1;

        if !state.reachable {
            return Err(TransportError::Unreachable {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            });
        }

        if state.refuse_handshakes > 0 {
            state.refuse_handshakes -= 1;
            return Err(TransportError::Unreachable {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            });
        }

        state.session_open = true;
        Ok(())
    }

    fn account_info(&mut self) -> Result<AccountSnapshot, TransportError> {
        let mut state = self.state.lock();
        state.begin(Operation::AccountInfo)?;
        Ok(state.account.clone())
    }

    fn tick(&mut self, symbol: &Symbol) -> Result<Quote, TransportError> {
        let mut state = self.state.lock();
        state.begin(Operation::Quote)?;
        state
            .quotes
            .get(symbol.as_str())
            .cloned()
            .ok_or_else(|| TransportError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }

    fn rates(
        &mut self,
        symbol: &Symbol,
        granularity: Granularity,
        count: usize,
    ) -> Result<Vec<Bar>, TransportError> {
        let mut state = self.state.lock();
        state.begin(Operation::HistoricalBars)?;
        state.require_known(symbol)?;

        let bars = state
            .bars
            .get(&(symbol.as_str().to_string(), granularity))
            .map(|bars| {
                // Newest-first seeds are answered newest-first.
                let descending = matches!(
                    (bars.first(), bars.last()),
                    (Some(first), Some(last)) if first.timestamp > last.timestamp
                );
                let mut recent = most_recent(bars.clone(), count);
                if descending {
                    recent.reverse();
                }
                recent
            })
            .unwrap_or_default();
        Ok(bars)
    }

    fn symbol_info(&mut self, symbol: &Symbol) -> Result<SymbolInfo, TransportError> {
        let mut state = self.state.lock();
        state.begin(Operation::SymbolInfo)?;
        state
            .infos
            .get(symbol.as_str())
            .cloned()
            .ok_or_else(|| TransportError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }

    fn symbols(&mut self) -> Result<Vec<Symbol>, TransportError> {
        let mut state = self.state.lock();
        state.begin(Operation::Symbols)?;
        Ok(state
            .known_symbols()
            .into_iter()
            .filter_map(|s| Symbol::new(s).ok())
            .collect())
    }

    fn close(&mut self) {
        self.state.lock().session_open = false;
    }
}
