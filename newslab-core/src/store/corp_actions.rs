//! Corporate-action records: splits, dividends, rights issues and their
//! adjustment factors.
//!
//! Unlike the financial table there is no incremental merge — a refresh
//! replaces the table wholesale with whatever the provider returned, and row
//! ids are reassigned sequentially.

use super::StoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One corporate-action event for an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporateAction {
    pub id: u64,
    pub symbol: String,
    pub action_date: Option<NaiveDate>,
    pub ex_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub adjustment_type: Option<String>,
    pub adjustment_factor: Option<f64>,
    pub terms_old_shares: Option<f64>,
    pub terms_new_shares: Option<f64>,
    pub offer_price: Option<f64>,
}

/// Store for corporate-action records, keyed by sequential row id.
#[derive(Debug, Clone, Default)]
pub struct CorpActionStore {
    records: Vec<CorporateAction>,
}

impl CorpActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let mut rdr = csv::Reader::from_path(path)
            .map_err(|e| StoreError::Read(format!("{}: {e}", path.display())))?;
        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let record: CorporateAction =
                result.map_err(|e| StoreError::Parse(format!("corp action row: {e}")))?;
            records.push(record);
        }
        Ok(Self { records })
    }

    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => store,
            Err(e) => {
                eprintln!(
                    "WARNING: corporate-action snapshot unavailable, starting empty ({}): {e}",
                    path.display()
                );
                Self::new()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for record in &self.records {
            wtr.serialize(record)
                .map_err(|e| StoreError::Write(format!("corp action row: {e}")))?;
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

    /// Replace the table wholesale with a freshly fetched batch, reassigning
    /// row ids in arrival order.
    pub fn refresh(&mut self, batch: Vec<CorporateAction>) {
        self.records = batch;
        for (i, record) in self.records.iter_mut().enumerate() {
            record.id = i as u64;
        }
    }

    pub fn records(&self) -> &[CorporateAction] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records for the given symbols, in stored order.
    pub fn query(&self, symbols: &[&str]) -> Vec<&CorporateAction> {
        self.records
            .iter()
            .filter(|r| symbols.contains(&r.symbol.as_str()))
            .collect()
    }

    /// Distinct symbols with at least one record.
    pub fn symbol_count(&self) -> usize {
        let mut symbols: Vec<&str> = self.records.iter().map(|r| r.symbol.as_str()).collect();
        symbols.sort_unstable();
        symbols.dedup();
        symbols.len()
    }

    /// First and last known action date.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates: Vec<NaiveDate> = self.records.iter().filter_map(|r| r.action_date).collect();
        Some((*dates.iter().min()?, *dates.iter().max()?))
    }
}
