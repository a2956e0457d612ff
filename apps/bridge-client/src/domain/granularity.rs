//! Bar granularity (terminal timeframe).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Time-bucket width of a bar sequence.
///
/// Codes follow the terminal's timeframe names (`M1`, `H4`, `MN1`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Granularity {
    /// One minute.
    M1,
    /// Five minutes.
    M5,
    /// Fifteen minutes.
    M15,
    /// Thirty minutes.
    M30,
    /// One hour.
    H1,
    /// Four hours.
    H4,
    /// One day.
    D1,
    /// One week.
    W1,
    /// One month (nominal 30 days).
    MN1,
}

impl Granularity {
    /// All granularities, finest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::M1,
            Self::M5,
            Self::M15,
            Self::M30,
            Self::H1,
            Self::H4,
            Self::D1,
            Self::W1,
            Self::MN1,
        ]
    }

    /// Timeframe code as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "M1",
            Self::M5 => "M5",
            Self::M15 => "M15",
            Self::M30 => "M30",
            Self::H1 => "H1",
            Self::H4 => "H4",
            Self::D1 => "D1",
            Self::W1 => "W1",
            Self::MN1 => "MN1",
        }
    }

    /// Nominal bucket width.
    #[must_use]
    pub const fn duration(self) -> Duration {
        const MINUTE: u64 = 60;
        const HOUR: u64 = 60 * MINUTE;
        const DAY: u64 = 24 * HOUR;
        Duration::from_secs(match self {
            Self::M1 => MINUTE,
            Self::M5 => 5 * MINUTE,
            Self::M15 => 15 * MINUTE,
            Self::M30 => 30 * MINUTE,
            Self::H1 => HOUR,
            Self::H4 => 4 * HOUR,
            Self::D1 => DAY,
            Self::W1 => 7 * DAY,
            Self::MN1 => 30 * DAY,
        })
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        Self::all()
            .iter()
            .copied()
            .find(|g| g.as_str() == code)
            .ok_or_else(|| DomainError::invalid("granularity", format!("unknown timeframe {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("M1", Granularity::M1)]
    #[test_case("m5", Granularity::M5)]
    #[test_case("M15", Granularity::M15)]
    #[test_case("m30", Granularity::M30)]
    #[test_case("H1", Granularity::H1)]
    #[test_case("h4", Granularity::H4)]
    #[test_case(" D1 ", Granularity::D1)]
    #[test_case("W1", Granularity::W1)]
    #[test_case("mn1", Granularity::MN1)]
    fn parses_timeframe_codes(input: &str, expected: Granularity) {
        assert_eq!(input.parse::<Granularity>().unwrap(), expected);
    }

    #[test_case("")]
    #[test_case("M2")]
    #[test_case("1H")]
    #[test_case("MN")]
    fn rejects_unknown_codes(input: &str) {
        assert!(input.parse::<Granularity>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for g in Granularity::all() {
            assert_eq!(g.to_string().parse::<Granularity>().unwrap(), *g);
        }
    }

    #[test]
    fn durations_are_strictly_increasing() {
        let durations: Vec<_> = Granularity::all().iter().map(|g| g.duration()).collect();
        assert!(durations.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Granularity::H4.duration(), Duration::from_secs(4 * 3600));
    }
}
