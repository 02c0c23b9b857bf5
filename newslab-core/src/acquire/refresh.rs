//! Batch refresh driver: decade-chunked fetches with bounded retry.
//!
//! Providers cap how much history one call may return, so the requested
//! range is split into multi-year chunks fetched independently. Transient
//! errors are retried up to a bound; an exhausted budget records the
//! `(symbol, range)` pair in a single batch-wide failure list and the run
//! continues — a batch of 500 symbols with 3 unfetchable ranges is a
//! partial success, not a failure.

use super::provider::{FetchError, MarketDataProvider};
use crate::schema::{Field, FieldSeries, Observation};
use crate::store::assemble::assemble_symbol;
use crate::store::wide::WideFrame;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Retry and chunking knobs for a refresh run.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Attempts per (symbol, range) before it is declared unrecoverable.
    pub max_attempts: u32,
    /// Width of one fetch chunk, in years.
    pub chunk_years: i32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            chunk_years: 10,
        }
    }
}

/// One unrecoverable (symbol, range) pair, with the error that exhausted
/// the retry budget.
#[derive(Debug)]
pub struct FetchFailure {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub last_error: FetchError,
}

/// Result of a batch refresh: the assembled wide frame plus everything
/// that could not be fetched.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub batch: WideFrame,
    pub failures: Vec<FetchFailure>,
}

impl RefreshOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Progress callback for multi-symbol refresh runs.
pub trait RefreshProgress: Send {
    /// Called when starting to fetch a symbol.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol is done; `failed_ranges` counts its exhausted
    /// date ranges (zero for a clean symbol).
    fn on_complete(&self, symbol: &str, index: usize, total: usize, failed_ranges: usize);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl RefreshProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {symbol}...", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, _index: usize, _total: usize, failed_ranges: usize) {
        if failed_ranges == 0 {
            println!("  OK: {symbol}");
        } else {
            println!("  PARTIAL: {symbol}: {failed_ranges} range(s) unrecoverable");
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nRefresh complete: {succeeded}/{total} clean, {failed} with failures");
    }
}

/// No-op reporter for tests and embedding callers.
pub struct SilentProgress;

impl RefreshProgress for SilentProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}
    fn on_complete(&self, _symbol: &str, _index: usize, _total: usize, _failed_ranges: usize) {}
    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}

/// Split `[start, end]` into consecutive spans of at most `years` years.
pub fn date_chunks(start: NaiveDate, end: NaiveDate, years: i32) -> Vec<(NaiveDate, NaiveDate)> {
    let mut chunks = Vec::new();
    if start > end || years <= 0 {
        return chunks;
    }
    let mut lo = start;
    loop {
        let next = NaiveDate::from_ymd_opt(lo.year() + years, lo.month(), lo.day())
            .or_else(|| NaiveDate::from_ymd_opt(lo.year() + years, 3, 1))
            .unwrap_or(end);
        if next > lo {
            if let Some(hi) = next.pred_opt() {
                if hi < end {
                    chunks.push((lo, hi));
                    lo = next;
                    continue;
                }
            }
        }
        chunks.push((lo, end));
        return chunks;
    }
}

enum RangeResult {
    Data(Vec<FieldSeries>),
    Skip,
    Exhausted(FetchError),
}

fn fetch_range(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    max_attempts: u32,
) -> RangeResult {
    let mut last_error = None;
    for _attempt in 0..max_attempts {
        match provider.fetch_series(symbol, start, end) {
            Ok(series) => return RangeResult::Data(series),
            Err(FetchError::NoData { .. } | FetchError::InvalidSymbol(_)) => {
                return RangeResult::Skip;
            }
            Err(e) => last_error = Some(e),
        }
    }
    RangeResult::Exhausted(
        last_error.unwrap_or_else(|| FetchError::Transient("no attempts made".into())),
    )
}

/// Fetch every symbol over the chunked range, assemble the results, and
/// return the batch frame plus the accumulated failure list. The caller
/// reconciles the batch into a
/// [`FinancialStore`](crate::store::financial::FinancialStore).
pub fn refresh_financial(
    provider: &dyn MarketDataProvider,
    symbols: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    config: &RefreshConfig,
    progress: &dyn RefreshProgress,
) -> RefreshOutcome {
    let chunks = date_chunks(start, end, config.chunk_years);
    let total = symbols.len();
    let mut batch = WideFrame::new();
    let mut failures: Vec<FetchFailure> = Vec::new();
    let mut failed_symbols = 0;

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        let mut collected: BTreeMap<Field, Vec<Observation>> = BTreeMap::new();
        let mut failed_ranges = 0;
        for (lo, hi) in &chunks {
            match fetch_range(provider, symbol, *lo, *hi, config.max_attempts) {
                RangeResult::Data(series) => {
                    for field_series in series {
                        collected
                            .entry(field_series.field)
                            .or_default()
                            .extend(field_series.points);
                    }
                }
                RangeResult::Skip => {}
                RangeResult::Exhausted(last_error) => {
                    failures.push(FetchFailure {
                        symbol: symbol.to_string(),
                        start: *lo,
                        end: *hi,
                        last_error,
                    });
                    failed_ranges += 1;
                }
            }
        }

        let series: Vec<FieldSeries> = collected
            .into_iter()
            .map(|(field, points)| FieldSeries::new(field, points))
            .collect();
        batch.union(assemble_symbol(symbol, &series));

        if failed_ranges > 0 {
            failed_symbols += 1;
        }
        progress.on_complete(symbol, i, total, failed_ranges);
    }

    progress.on_batch_complete(total - failed_symbols, failed_symbols, total);

    RefreshOutcome { batch, failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use std::sync::Mutex;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn chunks_cover_range_without_overlap() {
        let chunks = date_chunks(d("2000-01-01"), d("2024-06-30"), 10);

        assert_eq!(
            chunks,
            vec![
                (d("2000-01-01"), d("2009-12-31")),
                (d("2010-01-01"), d("2019-12-31")),
                (d("2020-01-01"), d("2024-06-30")),
            ]
        );
    }

    #[test]
    fn short_range_is_one_chunk() {
        let chunks = date_chunks(d("2020-03-01"), d("2020-06-30"), 10);
        assert_eq!(chunks, vec![(d("2020-03-01"), d("2020-06-30"))]);
    }

    #[test]
    fn inverted_range_yields_no_chunks() {
        assert!(date_chunks(d("2020-06-30"), d("2020-03-01"), 10).is_empty());
    }

    /// Provider that fails transiently a scripted number of times per call
    /// site, then succeeds (or fails forever with `attempts_to_succeed`
    /// set high).
    struct FlakyProvider {
        attempts_to_succeed: u32,
        calls: Mutex<u32>,
    }

    impl MarketDataProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch_series(
            &self,
            _symbol: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<FieldSeries>, FetchError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls < self.attempts_to_succeed {
                return Err(FetchError::Transient("timeout".into()));
            }
            Ok(vec![FieldSeries::new(
                Field::Close,
                vec![Observation::new(start.format("%Y-%m-%d").to_string(), Some(8.5))],
            )])
        }
    }

    #[test]
    fn transient_errors_are_retried_until_success() {
        let provider = FlakyProvider {
            attempts_to_succeed: 3,
            calls: Mutex::new(0),
        };
        let config = RefreshConfig {
            max_attempts: 5,
            chunk_years: 10,
        };

        let outcome = refresh_financial(
            &provider,
            &["MBBM.KL"],
            d("2020-01-01"),
            d("2020-12-31"),
            &config,
            &SilentProgress,
        );

        assert!(outcome.all_succeeded());
        assert!(outcome.batch.contains_symbol("MBBM.KL"));
    }

    #[test]
    fn exhausted_budget_records_failure_and_continues() {
        struct AlwaysTransient {
            calls: Mutex<Vec<String>>,
        }
        impl MarketDataProvider for AlwaysTransient {
            fn name(&self) -> &str {
                "down"
            }
            fn fetch_series(
                &self,
                symbol: &str,
                _start: NaiveDate,
                _end: NaiveDate,
            ) -> Result<Vec<FieldSeries>, FetchError> {
                self.calls.lock().unwrap().push(symbol.to_string());
                Err(FetchError::Transient("connection refused".into()))
            }
        }

        let provider = AlwaysTransient {
            calls: Mutex::new(Vec::new()),
        };
        let config = RefreshConfig {
            max_attempts: 4,
            chunk_years: 10,
        };

        let outcome = refresh_financial(
            &provider,
            &["MBBM.KL", "PUBM.KL"],
            d("2020-01-01"),
            d("2020-12-31"),
            &config,
            &SilentProgress,
        );

        // One range per symbol, each tried exactly max_attempts times.
        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|s| *s == "MBBM.KL").count(), 4);
        assert_eq!(calls.iter().filter(|s| *s == "PUBM.KL").count(), 4);

        // Both failures land in the single batch-wide list; the run
        // completed instead of aborting.
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].symbol, "MBBM.KL");
        assert_eq!(outcome.failures[1].symbol, "PUBM.KL");
        assert!(outcome.batch.is_empty());
    }

    #[test]
    fn no_data_skips_range_without_retry() {
        struct NoDataProvider {
            calls: Mutex<u32>,
        }
        impl MarketDataProvider for NoDataProvider {
            fn name(&self) -> &str {
                "empty"
            }
            fn fetch_series(
                &self,
                symbol: &str,
                start: NaiveDate,
                end: NaiveDate,
            ) -> Result<Vec<FieldSeries>, FetchError> {
                *self.calls.lock().unwrap() += 1;
                Err(FetchError::NoData {
                    symbol: symbol.to_string(),
                    start,
                    end,
                })
            }
        }

        let provider = NoDataProvider {
            calls: Mutex::new(0),
        };
        let outcome = refresh_financial(
            &provider,
            &["MBBM.KL"],
            d("2000-01-01"),
            d("2019-12-31"),
            &RefreshConfig::default(),
            &SilentProgress,
        );

        // Two decade chunks, one call each — NoData is never retried and
        // is not a failure.
        assert_eq!(*provider.calls.lock().unwrap(), 2);
        assert!(outcome.all_succeeded());
        assert!(outcome.batch.is_empty());
    }

    #[test]
    fn chunked_series_are_concatenated_before_assembly() {
        struct DecadeProvider;
        impl MarketDataProvider for DecadeProvider {
            fn name(&self) -> &str {
                "decade"
            }
            fn fetch_series(
                &self,
                _symbol: &str,
                start: NaiveDate,
                _end: NaiveDate,
            ) -> Result<Vec<FieldSeries>, FetchError> {
                Ok(vec![FieldSeries::new(
                    Field::Close,
                    vec![Observation::new(
                        start.format("%Y-%m-%d").to_string(),
                        Some(start.year() as f64),
                    )],
                )])
            }
        }

        let outcome = refresh_financial(
            &DecadeProvider,
            &["MBBM.KL"],
            d("2000-01-01"),
            d("2019-12-31"),
            &RefreshConfig::default(),
            &SilentProgress,
        );

        let close = outcome.batch.series("MBBM.KL", Field::Close).unwrap();
        assert_eq!(close.len(), 2);
        assert_eq!(close.get(&d("2000-01-01")), Some(&2000.0));
        assert_eq!(close.get(&d("2010-01-01")), Some(&2010.0));
    }
}
