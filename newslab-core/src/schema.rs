//! Field vocabulary for the financial wide table, and the raw per-field
//! series shape returned by market-data providers.
//!
//! Snapshot columns are keyed by `(symbol, field)` pairs; the field names
//! here are exactly the strings that appear in the CSV header.

use std::fmt;
use std::str::FromStr;

/// A named numeric field of the financial table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    SharesOutstanding,
    Pe,
    PriceToBook,
    Volume,
    Open,
    High,
    Low,
    Close,
    /// Derived: CLOSE × forward-filled SHARES_OUTSTANDING. Never fetched.
    MarketCap,
}

impl Field {
    /// All fields, fetched and derived, in canonical column order.
    pub const ALL: [Field; 9] = [
        Field::SharesOutstanding,
        Field::Pe,
        Field::PriceToBook,
        Field::Volume,
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
        Field::MarketCap,
    ];

    /// Fields requested from a provider (everything except the derived one).
    pub const FETCHED: [Field; 8] = [
        Field::SharesOutstanding,
        Field::Pe,
        Field::PriceToBook,
        Field::Volume,
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
    ];

    /// The pricing fields. A date with none of these is considered empty
    /// and dropped when assembling a symbol.
    pub const PRICING: [Field; 4] = [Field::Open, Field::High, Field::Low, Field::Close];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::SharesOutstanding => "SHARES_OUTSTANDING",
            Field::Pe => "PE",
            Field::PriceToBook => "PRICE_TO_BOOK",
            Field::Volume => "VOLUME",
            Field::Open => "OPEN",
            Field::High => "HIGH",
            Field::Low => "LOW",
            Field::Close => "CLOSE",
            Field::MarketCap => "MARKET_CAP",
        }
    }

    pub fn is_pricing(&self) -> bool {
        Field::PRICING.contains(self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .find(|f| f.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

/// One raw observation as a provider hands it over: a timestamp string and
/// an optional value. Timestamps may carry a sub-day component; assembly
/// truncates them to calendar days.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: String,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(timestamp: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }
}

/// All raw observations of one field for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSeries {
    pub field: Field,
    pub points: Vec<Observation>,
}

impl FieldSeries {
    pub fn new(field: Field, points: Vec<Observation>) -> Self {
        Self { field, points }
    }
}
