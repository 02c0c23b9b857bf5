//! Exchange listing records: one row per instrument with its static
//! descriptive and classification attributes. Dual-listed counters appear
//! as separate symbols. Refreshed wholesale per exchange set.

use super::StoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Static listing attributes of one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub symbol: String,
    pub common_name: Option<String>,
    pub isin: Option<String>,
    pub exchange_mic: Option<String>,
    pub exchange_ticker: Option<String>,
    pub economic_sector: Option<String>,
    pub business_sector: Option<String>,
    pub industry: Option<String>,
    pub ipo_date: Option<NaiveDate>,
    pub shares_outstanding: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Store for listing records, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct ListingStore {
    rows: Vec<Listing>,
}

impl ListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let mut rdr = csv::Reader::from_path(path)
            .map_err(|e| StoreError::Read(format!("{}: {e}", path.display())))?;
        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            let row: Listing = result.map_err(|e| StoreError::Parse(format!("listing row: {e}")))?;
            rows.push(row);
        }
        Ok(Self { rows })
    }

    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => store,
            Err(e) => {
                eprintln!(
                    "WARNING: listing snapshot unavailable, starting empty ({}): {e}",
                    path.display()
                );
                Self::new()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            wtr.serialize(row)
                .map_err(|e| StoreError::Write(format!("listing row: {e}")))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| StoreError::Write(format!("flush: {e}")))?;

        // Atomic replace: a torn write must never destroy the snapshot.
        let tmp = path.with_extension("csv.tmp");
        fs::write(&tmp, bytes)
            .map_err(|e| StoreError::Write(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Write(format!("atomic rename failed: {e}"))
        })?;
        Ok(())
    }

    /// Replace the table wholesale with a fresh exchange screen.
    pub fn refresh(&mut self, rows: Vec<Listing>) {
        self.rows = rows;
    }

    pub fn rows(&self) -> &[Listing] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&Listing> {
        self.rows.iter().find(|r| r.symbol == symbol)
    }

    pub fn symbol_count(&self) -> usize {
        let mut symbols: Vec<&str> = self.rows.iter().map(|r| r.symbol.as_str()).collect();
        symbols.sort_unstable();
        symbols.dedup();
        symbols.len()
    }

    /// Distinct exchange MICs present in the table.
    pub fn exchanges(&self) -> Vec<&str> {
        let mut mics: Vec<&str> = self
            .rows
            .iter()
            .filter_map(|r| r.exchange_mic.as_deref())
            .collect();
        mics.sort_unstable();
        mics.dedup();
        mics
    }
}
