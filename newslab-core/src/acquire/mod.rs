//! Acquisition drivers: batch refresh against a market-data provider and
//! local series import.

pub mod import;
pub mod provider;
pub mod refresh;

pub use import::{import_dir, read_field_series_csv};
pub use provider::{FetchError, MarketDataProvider};
pub use refresh::{
    date_chunks, refresh_financial, FetchFailure, RefreshConfig, RefreshOutcome, RefreshProgress,
    SilentProgress, StdoutProgress,
};
