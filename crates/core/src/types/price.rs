//! Decimal product prices.
//!
//! Spreadsheet cells are typed by hand, so prices show up as JSON numbers,
//! plain numeric strings, or strings with currency signs and thousands
//! separators. Anything that does not yield a number becomes zero.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product price in the store's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// The zero price (also the fallback for unparseable input).
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Sum of two prices, clamped at the decimal range instead of overflowing.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Returns true if the price is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse a price from a JSON cell value.
    ///
    /// Numbers are taken as-is, strings go through [`Price::parse_lenient`],
    /// everything else is zero.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => parse_decimal(&n.to_string()).map_or(Self::ZERO, Self),
            serde_json::Value::String(s) => Self::parse_lenient(s),
            _ => Self::ZERO,
        }
    }

    /// Parse the first number found in `raw`.
    ///
    /// Whitespace is removed first (so `"1 500"` is 1500), leading
    /// non-numeric characters such as currency signs are skipped, and the
    /// numeric run ends at the first character that cannot belong to it.
    /// Commas are thousands separators when a `.` is present, when there is
    /// more than one comma, or when the only comma is followed by exactly
    /// three digits (`"1,500"` is 1500). Any other lone comma is the decimal
    /// separator (`"250,50"` is 250.5).
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let Some(start) = compact.find(|c: char| c.is_ascii_digit() || c == '-') else {
            return Self::ZERO;
        };

        let run: String = compact
            .get(start..)
            .unwrap_or_default()
            .chars()
            .enumerate()
            .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || *c == ',' || (*i == 0 && *c == '-'))
            .map(|(_, c)| c)
            .collect();

        let number = if run.contains('.') || is_thousands_grouped(&run) {
            run.replace(',', "")
        } else {
            run.replace(',', ".")
        };

        parse_decimal(&number).map_or(Self::ZERO, Self)
    }
}

fn is_thousands_grouped(run: &str) -> bool {
    match run.matches(',').count() {
        0 => false,
        1 => run
            .split_once(',')
            .is_some_and(|(_, tail)| tail.len() == 3 && tail.bytes().all(|b| b.is_ascii_digit())),
        _ => true,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
        .map(|d| d.normalize())
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}
