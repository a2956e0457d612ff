//! Deterministic Market Data
//!
//! Each `(symbol, granularity)` series is a random walk seeded from the
//! server seed, the symbol and the granularity. The walk runs backwards from
//! the anchor time, so the newest bars are identical whatever `count` is
//! requested.

use std::collections::BTreeMap;

use bridge_client::{AccountSnapshot, Bar, Granularity, Quote, StubBridge, Symbol, SymbolInfo};
use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

/// Largest per-bar move, in basis points.
const MAX_MOVE_BPS: i64 = 25;

#[derive(Debug, Clone)]
struct Instrument {
    info: SymbolInfo,
    base_price: Decimal,
}

impl Instrument {
    fn for_symbol(symbol: &Symbol) -> Self {
        let name = symbol.as_str();
        let (base_price, digits, description) = match name {
            "BTCUSD" => (Decimal::new(35_000, 0), 2, "Bitcoin vs US Dollar"),
            "ETHUSD" => (Decimal::new(2_000, 0), 2, "Ethereum vs US Dollar"),
            "EURUSD" => (Decimal::new(10_850, 4), 5, "Euro vs US Dollar"),
            "GBPUSD" => (Decimal::new(12_650, 4), 5, "Pound Sterling vs US Dollar"),
            "USDJPY" => (Decimal::new(14_850, 2), 3, "US Dollar vs Japanese Yen"),
            "XAUUSD" => (Decimal::new(2_000, 0), 2, "Gold vs US Dollar"),
            _ => (Decimal::new(100, 0), 2, "Synthetic instrument"),
        };

        let (currency_base, currency_profit) = if name.len() == 6 && name.is_ascii() {
            (name[..3].to_string(), name[3..].to_string())
        } else {
            ("USD".to_string(), "USD".to_string())
        };

        let info = SymbolInfo {
            symbol: symbol.clone(),
            description: description.to_string(),
            currency_margin: currency_base.clone(),
            currency_base,
            currency_profit,
            digits,
            point: Decimal::new(1, digits),
            spread: 10,
            volume_min: Decimal::new(1, 2),
            volume_max: Decimal::new(100, 0),
            volume_step: Decimal::new(1, 2),
        };

        Self { info, base_price }
    }

    fn spread(&self) -> Decimal {
        self.info.point * Decimal::from(self.info.spread)
    }
}

/// Read-only data set served by the stub.
#[derive(Debug, Clone)]
pub struct StubMarket {
    instruments: BTreeMap<Symbol, Instrument>,
    account: AccountSnapshot,
    seed: u64,
    anchor: DateTime<Utc>,
}

impl StubMarket {
    /// Build a data set for `symbols`, with the newest bar opening at or
    /// before `anchor`.
    #[must_use]
    pub fn new(symbols: &[Symbol], seed: u64, anchor: DateTime<Utc>) -> Self {
        let instruments = symbols
            .iter()
            .map(|symbol| (symbol.clone(), Instrument::for_symbol(symbol)))
            .collect();

        Self {
            instruments,
            account: StubBridge::sample_account(),
            seed,
            anchor,
        }
    }

    /// The demo account.
    #[must_use]
    pub const fn account(&self) -> &AccountSnapshot {
        &self.account
    }

    /// Offered symbols, sorted.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.instruments.keys().cloned().collect()
    }

    /// Contract specification, if `symbol` is offered.
    #[must_use]
    pub fn symbol_info(&self, symbol: &Symbol) -> Option<SymbolInfo> {
        self.instruments.get(symbol).map(|i| i.info.clone())
    }

    /// Last tick, derived from the newest one-minute close.
    #[must_use]
    pub fn quote(&self, symbol: &Symbol) -> Option<Quote> {
        let instrument = self.instruments.get(symbol)?;
        let newest = self.bars(symbol, Granularity::M1, 1)?.pop()?;

        Some(Quote {
            symbol: symbol.clone(),
            bid: newest.close,
            ask: newest.close + instrument.spread(),
            last: newest.close,
            volume: newest.volume,
            timestamp: self.anchor,
        })
    }

    /// The `count` newest bars, ascending by timestamp.
    #[must_use]
    pub fn bars(&self, symbol: &Symbol, granularity: Granularity, count: usize) -> Option<Vec<Bar>> {
        let instrument = self.instruments.get(symbol)?;
        let digits = instrument.info.digits;
        let step = i64::try_from(granularity.duration().as_secs()).unwrap_or(i64::MAX);
        let newest_open = self.anchor.timestamp() - self.anchor.timestamp().rem_euclid(step);

        let mut rng = StdRng::seed_from_u64(series_seed(self.seed, symbol, granularity));
        let mut close = instrument.base_price;
        let mut bars = Vec::with_capacity(count);

        for age in 0..count {
            let move_bps = rng.random_range(-MAX_MOVE_BPS..=MAX_MOVE_BPS);
            let open = (close - close * Decimal::new(move_bps, 4)).round_dp(digits);
            let wick_up = close * Decimal::new(rng.random_range(0..=MAX_MOVE_BPS / 2), 4);
            let wick_down = close * Decimal::new(rng.random_range(0..=MAX_MOVE_BPS / 2), 4);
            let age = i64::try_from(age).unwrap_or(i64::MAX);

            bars.push(Bar {
                open,
                high: (open.max(close) + wick_up).round_dp(digits),
                low: (open.min(close) - wick_down).round_dp(digits),
                close,
                volume: rng.random_range(50..=500),
                timestamp: timestamp(newest_open.saturating_sub(age.saturating_mul(step)), self.anchor),
            });

            close = open;
        }

        bars.reverse();
        Some(bars)
    }
}

fn timestamp(secs: i64, fallback: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or(fallback)
}

/// FNV-1a over the symbol and granularity, mixed with the server seed.
fn series_seed(seed: u64, symbol: &Symbol, granularity: Granularity) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    symbol
        .as_str()
        .bytes()
        .chain(granularity.as_str().bytes())
        .fold(FNV_OFFSET ^ seed, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
}
