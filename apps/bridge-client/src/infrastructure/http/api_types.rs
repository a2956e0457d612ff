//! Bridge wire types.
//!
//! These types map directly to the bridge server's JSON format. Prices travel
//! as JSON numbers and are converted to `Decimal` at this boundary.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::application::ports::TransportError;
use crate::domain::{AccountSnapshot, Bar, Quote, Symbol, SymbolInfo};

/// Error code sent (with HTTP 404) for unknown symbols.
pub const SYMBOL_NOT_FOUND_CODE: &str = "SYMBOL_NOT_FOUND";

/// Request paths.
pub mod paths {
    /// Handshake / health check (GET).
    pub const HEALTH: &str = "/health";
    /// Account snapshot (GET).
    pub const ACCOUNT_INFO: &str = "/account_info";
    /// Last tick (POST).
    pub const GET_TICK: &str = "/get_tick";
    /// Historical bars (POST).
    pub const GET_RATES: &str = "/get_rates";
    /// Symbol specification (POST).
    pub const SYMBOL_INFO: &str = "/symbol_info";
    /// Symbol list (GET).
    pub const SYMBOLS: &str = "/symbols";
}

// ============================================================================
// Time
// ============================================================================

/// Naive layouts accepted for text timestamps, interpreted as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A timestamp as sent by the bridge: Unix seconds or a date string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireTime {
    /// Seconds since the Unix epoch.
    Unix(i64),
    /// RFC 3339, RFC 2822 (`Tue, 14 Nov 2023 22:13:20 GMT`, as Flask's
    /// `jsonify` writes datetimes), or a naive timestamp interpreted as UTC.
    Text(String),
}

impl WireTime {
    /// Parse into a UTC timestamp.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, TransportError> {
        match self {
            Self::Unix(secs) => Utc
                .timestamp_opt(*secs, 0)
                .single()
                .ok_or_else(|| TransportError::Decode(format!("timestamp out of range: {secs}"))),
            Self::Text(text) => parse_text_time(text.trim()).ok_or_else(|| {
                TransportError::Decode(format!("invalid timestamp {text:?}"))
            }),
        }
    }
}

fn parse_text_time(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

impl From<DateTime<Utc>> for WireTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Unix(value.timestamp())
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Body of single-symbol requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRequest {
    /// Symbol.
    pub symbol: String,
}

/// Body of a historical bars request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesRequest {
    /// Symbol.
    pub symbol: String,
    /// Timeframe code (e.g., "M1").
    pub timeframe: String,
    /// Number of most recent bars.
    pub count: usize,
}

// ============================================================================
// Responses
// ============================================================================

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
    /// Machine-readable code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Whether the error reports `symbol` as unknown, either by
    /// [`SYMBOL_NOT_FOUND_CODE`] or by the bridge's `Symbol <name> not found`
    /// message.
    #[must_use]
    pub fn names_unknown_symbol(&self, symbol: &Symbol) -> bool {
        if self.code.as_deref() == Some(SYMBOL_NOT_FOUND_CODE) {
            return true;
        }
        self.error
            .trim()
            .eq_ignore_ascii_case(&format!("Symbol {symbol} not found"))
    }
}

/// Health check body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy".
    pub status: String,
    /// Whether the bridge holds a live terminal session.
    #[serde(rename = "mt5_connected")]
    pub terminal_connected: bool,
    /// Server time.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Server name and version.
    #[serde(default)]
    pub server: Option<String>,
}

impl HealthResponse {
    /// Whether the bridge is ready to serve data.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") && self.terminal_connected
    }
}

/// Account snapshot body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfoResponse {
    /// Login id.
    pub login: u64,
    /// Balance.
    pub balance: f64,
    /// Equity.
    pub equity: f64,
    /// Margin in use.
    #[serde(default)]
    pub margin: f64,
    /// Free margin.
    #[serde(default)]
    pub free_margin: f64,
    /// Margin level in percent (0 when no margin is used).
    #[serde(default)]
    pub margin_level: f64,
    /// Account currency.
    pub currency: String,
    /// Leverage.
    pub leverage: u32,
    /// Floating profit.
    #[serde(default)]
    pub profit: f64,
}

impl AccountInfoResponse {
    /// Convert to `AccountSnapshot`.
    pub fn into_domain(self) -> Result<AccountSnapshot, TransportError> {
        let margin_level = if self.margin_level > 0.0 {
            Some(to_decimal("margin_level", self.margin_level)?)
        } else {
            None
        };
        Ok(AccountSnapshot {
            login: self.login,
            balance: to_decimal("balance", self.balance)?,
            equity: to_decimal("equity", self.equity)?,
            currency: self.currency,
            leverage: self.leverage,
            margin: to_decimal("margin", self.margin)?,
            free_margin: to_decimal("free_margin", self.free_margin)?,
            margin_level,
            profit: to_decimal("profit", self.profit)?,
        })
    }

    /// Build from an `AccountSnapshot`.
    #[must_use]
    pub fn from_domain(account: &AccountSnapshot) -> Self {
        Self {
            login: account.login,
            balance: to_wire(account.balance),
            equity: to_wire(account.equity),
            margin: to_wire(account.margin),
            free_margin: to_wire(account.free_margin),
            margin_level: account.margin_level.map_or(0.0, to_wire),
            currency: account.currency.clone(),
            leverage: account.leverage,
            profit: to_wire(account.profit),
        }
    }
}

/// Tick body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickResponse {
    /// Symbol.
    pub symbol: String,
    /// Tick time.
    pub time: WireTime,
    /// Bid.
    pub bid: f64,
    /// Ask.
    pub ask: f64,
    /// Last deal price.
    #[serde(default)]
    pub last: f64,
    /// Tick volume.
    #[serde(default)]
    pub volume: u64,
    /// Terminal tick flags.
    #[serde(default)]
    pub flags: u32,
}

impl TickResponse {
    /// Convert to `Quote` for the requested symbol.
    pub fn into_domain(self, symbol: &Symbol) -> Result<Quote, TransportError> {
        Ok(Quote {
            symbol: symbol.clone(),
            bid: to_decimal("bid", self.bid)?,
            ask: to_decimal("ask", self.ask)?,
            last: to_decimal("last", self.last)?,
            volume: self.volume,
            timestamp: self.time.to_datetime()?,
        })
    }

    /// Build from a `Quote`.
    #[must_use]
    pub fn from_domain(quote: &Quote) -> Self {
        Self {
            symbol: quote.symbol.to_string(),
            time: quote.timestamp.into(),
            bid: to_wire(quote.bid),
            ask: to_wire(quote.ask),
            last: to_wire(quote.last),
            volume: quote.volume,
            flags: 0,
        }
    }
}

/// One bar row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRow {
    /// Bar open time.
    pub time: WireTime,
    /// Open.
    pub open: f64,
    /// High.
    pub high: f64,
    /// Low.
    pub low: f64,
    /// Close.
    pub close: f64,
    /// Tick volume.
    pub tick_volume: u64,
    /// Spread in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<i64>,
    /// Exchange volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_volume: Option<u64>,
}

impl RateRow {
    /// Convert to `Bar`.
    pub fn into_domain(self) -> Result<Bar, TransportError> {
        Ok(Bar {
            open: to_decimal("open", self.open)?,
            high: to_decimal("high", self.high)?,
            low: to_decimal("low", self.low)?,
            close: to_decimal("close", self.close)?,
            volume: self.tick_volume,
            timestamp: self.time.to_datetime()?,
        })
    }

    /// Build from a `Bar`.
    #[must_use]
    pub fn from_domain(bar: &Bar) -> Self {
        Self {
            time: bar.timestamp.into(),
            open: to_wire(bar.open),
            high: to_wire(bar.high),
            low: to_wire(bar.low),
            close: to_wire(bar.close),
            tick_volume: bar.volume,
            spread: None,
            real_volume: None,
        }
    }
}

/// Historical bars body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesResponse {
    /// Symbol.
    pub symbol: String,
    /// Timeframe code.
    pub timeframe: String,
    /// Number of rows.
    pub count: usize,
    /// Bar rows.
    pub data: Vec<RateRow>,
}

impl RatesResponse {
    /// Convert rows to `Bar`s, preserving order.
    pub fn into_domain(self) -> Result<Vec<Bar>, TransportError> {
        self.data.into_iter().map(RateRow::into_domain).collect()
    }
}

/// Symbol specification body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolInfoResponse {
    /// Symbol.
    pub symbol: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Base currency.
    #[serde(default)]
    pub currency_base: String,
    /// Profit currency.
    #[serde(default)]
    pub currency_profit: String,
    /// Margin currency.
    #[serde(default)]
    pub currency_margin: String,
    /// Price digits.
    pub digits: u32,
    /// Point size.
    pub point: f64,
    /// Spread in points.
    #[serde(default)]
    pub spread: u32,
    /// Minimum volume.
    pub volume_min: f64,
    /// Maximum volume.
    pub volume_max: f64,
    /// Volume step.
    pub volume_step: f64,
}

impl SymbolInfoResponse {
    /// Convert to `SymbolInfo` for the requested symbol.
    pub fn into_domain(self, symbol: &Symbol) -> Result<SymbolInfo, TransportError> {
        Ok(SymbolInfo {
            symbol: symbol.clone(),
            description: self.description,
            currency_base: self.currency_base,
            currency_profit: self.currency_profit,
            currency_margin: self.currency_margin,
            digits: self.digits,
            point: to_decimal("point", self.point)?,
            spread: self.spread,
            volume_min: to_decimal("volume_min", self.volume_min)?,
            volume_max: to_decimal("volume_max", self.volume_max)?,
            volume_step: to_decimal("volume_step", self.volume_step)?,
        })
    }

    /// Build from a `SymbolInfo`.
    #[must_use]
    pub fn from_domain(info: &SymbolInfo) -> Self {
        Self {
            symbol: info.symbol.to_string(),
            description: info.description.clone(),
            currency_base: info.currency_base.clone(),
            currency_profit: info.currency_profit.clone(),
            currency_margin: info.currency_margin.clone(),
            digits: info.digits,
            point: to_wire(info.point),
            spread: info.spread,
            volume_min: to_wire(info.volume_min),
            volume_max: to_wire(info.volume_max),
            volume_step: to_wire(info.volume_step),
        }
    }
}

/// Symbol list body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolsResponse {
    /// Symbol names.
    pub symbols: Vec<String>,
    /// Number of symbols.
    pub count: usize,
}

impl SymbolsResponse {
    /// Convert to validated `Symbol`s.
    pub fn into_domain(self) -> Result<Vec<Symbol>, TransportError> {
        self.symbols
            .into_iter()
            .map(|name| Symbol::new(&name).map_err(|e| TransportError::Decode(e.to_string())))
            .collect()
    }
}

fn to_decimal(field: &str, value: f64) -> Result<Decimal, TransportError> {
    Decimal::try_from(value)
        .map_err(|e| TransportError::Decode(format!("{field} = {value} is not a decimal: {e}")))
}

fn to_wire(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
