//! Symbol value object for terminal instruments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Maximum symbol length accepted by the terminal.
pub const MAX_SYMBOL_LEN: usize = 32;

/// A terminal instrument name.
///
/// Examples: "BTCUSD", "EURUSD", "US30.cash" (stored as "US30.CASH").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Create a validated symbol, normalized to uppercase.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol is empty, too long, or contains
    /// characters outside `[A-Z0-9._#-]`.
    pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let normalized = value.as_ref().trim().to_uppercase();

        if normalized.is_empty() {
            return Err(DomainError::invalid("symbol", "symbol cannot be empty"));
        }

        if normalized.len() > MAX_SYMBOL_LEN {
            return Err(DomainError::invalid(
                "symbol",
                format!("symbol exceeds {MAX_SYMBOL_LEN} characters"),
            ));
        }

        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '#' | '-'))
        {
            return Err(DomainError::invalid(
                "symbol",
                format!("symbol {normalized} contains invalid characters"),
            ));
        }

        Ok(Self(normalized))
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive substring match.
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        self.0.contains(&pattern.to_uppercase())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
