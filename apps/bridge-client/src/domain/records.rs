//! Value records returned by the bridge.
//!
//! Every record is an immutable snapshot of one response. Nothing here is
//! cached: callers get a fresh value per request.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::symbol::Symbol;

// =============================================================================
// Account
// =============================================================================

/// Trading account snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Terminal login id.
    pub login: u64,
    /// Account balance.
    pub balance: Decimal,
    /// Balance plus floating profit.
    pub equity: Decimal,
    /// Account currency (e.g., "USD").
    pub currency: String,
    /// Account leverage (e.g., 100 for 1:100).
    pub leverage: u32,
    /// Margin in use.
    pub margin: Decimal,
    /// Margin available for new positions.
    pub free_margin: Decimal,
    /// Equity / margin in percent. Absent when no margin is used.
    pub margin_level: Option<Decimal>,
    /// Floating profit of open positions.
    pub profit: Decimal,
}

// =============================================================================
// Quote
// =============================================================================

/// Last tick for a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument.
    pub symbol: Symbol,
    /// Best bid.
    pub bid: Decimal,
    /// Best ask.
    pub ask: Decimal,
    /// Last deal price (zero on instruments without exchange deals).
    pub last: Decimal,
    /// Tick volume.
    pub volume: u64,
    /// Tick time.
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Ask minus bid.
    #[must_use]
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    /// Midpoint of bid and ask.
    #[must_use]
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::from(2)
    }
}

// =============================================================================
// Bars
// =============================================================================

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Open price.
    pub open: Decimal,
    /// High price.
    pub high: Decimal,
    /// Low price.
    pub low: Decimal,
    /// Close price.
    pub close: Decimal,
    /// Tick volume.
    pub volume: u64,
    /// Bar open time.
    pub timestamp: DateTime<Utc>,
}

/// Order `bars` ascending by timestamp and keep at most the `count` most recent.
///
/// Missing intervals stay missing; nothing is padded or interpolated.
#[must_use]
pub fn most_recent(mut bars: Vec<Bar>, count: usize) -> Vec<Bar> {
    bars.sort_by_key(|bar| bar.timestamp);
    if bars.len() > count {
        bars.drain(..bars.len() - count);
    }
    bars
}

// =============================================================================
// Symbol metadata
// =============================================================================

/// Contract specification of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Instrument.
    pub symbol: Symbol,
    /// Human-readable description.
    pub description: String,
    /// Base currency.
    pub currency_base: String,
    /// Profit currency.
    pub currency_profit: String,
    /// Margin currency.
    pub currency_margin: String,
    /// Price digits after the decimal point.
    pub digits: u32,
    /// Smallest price change.
    pub point: Decimal,
    /// Current spread in points.
    pub spread: u32,
    /// Minimum deal volume.
    pub volume_min: Decimal,
    /// Maximum deal volume.
    pub volume_max: Decimal,
    /// Volume step.
    pub volume_step: Decimal,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn bar_at(secs: i64) -> Bar {
        Bar {
            open: Decimal::new(100, 0),
            high: Decimal::new(101, 0),
            low: Decimal::new(99, 0),
            close: Decimal::new(100, 0),
            volume: 10,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn quote_spread_and_mid() {
        let quote = Quote {
            symbol: Symbol::new("EURUSD").unwrap(),
            bid: Decimal::new(10850, 4),
            ask: Decimal::new(10852, 4),
            last: Decimal::ZERO,
            volume: 0,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };
        assert_eq!(quote.spread(), Decimal::new(2, 4));
        assert_eq!(quote.mid(), Decimal::new(10851, 4));
    }

    #[test]
    fn most_recent_sorts_ascending() {
        let bars = vec![bar_at(300), bar_at(100), bar_at(200)];
        let out = most_recent(bars, 10);
        let times: Vec<_> = out.iter().map(|b| b.timestamp.timestamp()).collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[test]
    fn most_recent_keeps_tail() {
        let bars = (0..10).map(|i| bar_at(i * 60)).collect();
        let out = most_recent(bars, 3);
        let times: Vec<_> = out.iter().map(|b| b.timestamp.timestamp()).collect();
        assert_eq!(times, vec![420, 480, 540]);
    }

    #[test]
    fn most_recent_does_not_pad_gaps() {
        let bars = vec![bar_at(0), bar_at(600)];
        let out = most_recent(bars, 100);
        assert_eq!(out.len(), 2);
    }
}
