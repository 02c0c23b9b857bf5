//! Market-data provider trait and its structured error types.
//!
//! The concrete vendor client (API session, request shaping, response
//! parsing) lives outside the core; the refresh driver only needs the
//! three-way error split below to decide between retrying, skipping a
//! range, and giving up on it.

use crate::schema::FieldSeries;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors from a time-series fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider has nothing for this symbol in this range. Not retried;
    /// the range is skipped and processing continues.
    #[error("no data available for {symbol} between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// The symbol itself is unknown to the provider. Not retried.
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Timeouts, rate limits, flaky transport. Retried up to the configured
    /// attempt bound.
    #[error("transient provider error: {0}")]
    Transient(String),
}

/// A source of per-field time series for one symbol at a time.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch all available field series for a symbol over a date range.
    fn fetch_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FieldSeries>, FetchError>;
}
