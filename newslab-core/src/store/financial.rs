//! Financial snapshot store: the multi-symbol wide table and its CSV snapshot.
//!
//! Snapshot layout: one header row with a leading `DATE` column followed by
//! `SYMBOL:FIELD` pairs, one row per date, empty cells for missing values.
//! A colon separates the pair because a RIC may legally contain a dot
//! (`MBBM.KL`) but never a colon.
//!
//! Writes are atomic (write to .tmp, rename into place) and leave a metadata
//! sidecar (`{name}.meta.json`) with a content hash and the covered range.

use super::wide::{Series, WideFrame};
use super::StoreError;
use crate::schema::Field;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata sidecar for a financial snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub symbol_count: usize,
    pub column_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub data_hash: String,
    pub saved_at: chrono::NaiveDateTime,
}

/// The financial record store. Exclusively owns its in-memory frame; callers
/// mutate it only through [`merge_symbols`](Self::merge_symbols) and persist
/// it only through an explicit [`save`](Self::save).
#[derive(Debug, Clone, Default)]
pub struct FinancialStore {
    frame: WideFrame,
}

/// A query result: a date axis plus `(symbol, field)` columns in the order
/// the caller asked for. `values[c][r]` is column `c` at date index `r`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSlice {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<(String, Field)>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl TableSlice {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.dates.is_empty()
    }

    pub fn get(&self, symbol: &str, field: Field, date: NaiveDate) -> Option<f64> {
        let col = self
            .columns
            .iter()
            .position(|(s, f)| s == symbol && *f == field)?;
        let row = self.dates.iter().position(|d| *d == date)?;
        self.values[col][row]
    }
}

impl FinancialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frame(frame: WideFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &WideFrame {
        &self.frame
    }

    pub fn symbols(&self) -> Vec<String> {
        self.frame.symbols().iter().map(|s| s.to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    /// Load a snapshot. Any read or parse failure is an error — the caller
    /// decides whether an empty universe is an acceptable fallback.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| StoreError::Read(format!("{}: {e}", path.display())))?;

        let headers = rdr
            .headers()
            .map_err(|e| StoreError::Parse(format!("header: {e}")))?
            .clone();

        let mut columns: Vec<(String, Field)> = Vec::new();
        for header in headers.iter().skip(1) {
            let (symbol, field) = header
                .rsplit_once(':')
                .ok_or_else(|| StoreError::Parse(format!("bad column header '{header}'")))?;
            let field: Field = field.parse().map_err(StoreError::Parse)?;
            columns.push((symbol.to_string(), field));
        }

        let mut series: Vec<Series> = vec![Series::new(); columns.len()];
        for record in rdr.records() {
            let record = record.map_err(|e| StoreError::Parse(format!("row: {e}")))?;
            let date_cell = record.get(0).unwrap_or("");
            let date = NaiveDate::parse_from_str(date_cell, "%Y-%m-%d")
                .map_err(|e| StoreError::Parse(format!("date '{date_cell}': {e}")))?;

            for (i, column) in series.iter_mut().enumerate() {
                let cell = record.get(i + 1).unwrap_or("");
                if cell.is_empty() {
                    continue;
                }
                let value: f64 = cell
                    .parse()
                    .map_err(|e| StoreError::Parse(format!("value '{cell}': {e}")))?;
                column.insert(date, value);
            }
        }

        let mut frame = WideFrame::new();
        for ((symbol, field), column) in columns.into_iter().zip(series) {
            frame.insert_series(&symbol, field, column);
        }
        Ok(Self { frame })
    }

    /// Bootstrap helper: load the snapshot, or start from an empty universe
    /// with a warning. A first run has no file on disk yet.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => store,
            Err(e) => {
                eprintln!(
                    "WARNING: financial snapshot unavailable, starting empty ({}): {e}",
                    path.display()
                );
                Self::new()
            }
        }
    }

    /// Query columns in symbol-major order.
    ///
    /// `symbols`/`fields` default to everything known; when an order is
    /// given, the result keeps it and silently intersects with what exists.
    /// Dates with no value in any selected column do not appear.
    pub fn query(
        &self,
        symbols: Option<&[&str]>,
        fields: Option<&[Field]>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> TableSlice {
        let (symbol_order, field_order) = self.orders(symbols, fields);
        let mut columns = Vec::new();
        for symbol in &symbol_order {
            for field in &field_order {
                if self.frame.series(symbol, *field).is_some() {
                    columns.push((symbol.clone(), *field));
                }
            }
        }
        self.slice(columns, from, to)
    }

    /// Same slice as [`query`](Self::query) but with the key order swapped:
    /// columns come out field-major, for consumers whose primary axis is the
    /// field rather than the symbol.
    pub fn query_transposed(
        &self,
        symbols: Option<&[&str]>,
        fields: Option<&[Field]>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> TableSlice {
        let (symbol_order, field_order) = self.orders(symbols, fields);
        let mut columns = Vec::new();
        for field in &field_order {
            for symbol in &symbol_order {
                if self.frame.series(symbol, *field).is_some() {
                    columns.push((symbol.clone(), *field));
                }
            }
        }
        self.slice(columns, from, to)
    }

    fn orders(
        &self,
        symbols: Option<&[&str]>,
        fields: Option<&[Field]>,
    ) -> (Vec<String>, Vec<Field>) {
        let symbol_order = match symbols {
            Some(list) => list
                .iter()
                .filter(|s| self.frame.contains_symbol(s))
                .map(|s| s.to_string())
                .collect(),
            None => self.symbols(),
        };
        let field_order = match fields {
            Some(list) => list.to_vec(),
            None => Field::ALL.to_vec(),
        };
        (symbol_order, field_order)
    }

    fn slice(&self, columns: Vec<(String, Field)>, from: NaiveDate, to: NaiveDate) -> TableSlice {
        // The axis is the union of the selected columns' dates, so every
        // surviving row has at least one value by construction.
        let mut dates = BTreeSet::new();
        for (symbol, field) in &columns {
            if let Some(series) = self.frame.series(symbol, *field) {
                dates.extend(series.range(from..=to).map(|(d, _)| *d));
            }
        }
        let dates: Vec<NaiveDate> = dates.into_iter().collect();

        let values = columns
            .iter()
            .map(|(symbol, field)| {
                let series = self.frame.series(symbol, *field);
                dates
                    .iter()
                    .map(|d| series.and_then(|s| s.get(d).copied()))
                    .collect()
            })
            .collect();

        TableSlice {
            dates,
            columns,
            values,
        }
    }

    /// Reconcile a freshly assembled batch into the store.
    ///
    /// `overwrite` discards the entire existing table and keeps only the
    /// batch. Otherwise, columns of symbols present in the batch are dropped
    /// first and the batch is outer-joined in — at most one column set per
    /// symbol ever survives a merge.
    pub fn merge_symbols(&mut self, batch: WideFrame, overwrite: bool) {
        if overwrite {
            self.frame = batch;
            return;
        }
        let incoming: Vec<String> = batch.symbols().iter().map(|s| s.to_string()).collect();
        for symbol in &incoming {
            self.frame.drop_symbol(symbol);
        }
        self.frame.union(batch);
    }

    /// Serialize the full table to `path`, atomically, with a meta sidecar.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let columns: Vec<(String, Field)> = self
            .frame
            .iter()
            .map(|(symbol, field, _)| (symbol.to_string(), field))
            .collect();

        let mut wtr = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["DATE".to_string()];
        header.extend(columns.iter().map(|(s, f)| format!("{s}:{f}")));
        wtr.write_record(&header)
            .map_err(|e| StoreError::Write(format!("header: {e}")))?;

        for date in self.frame.dates() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            for (symbol, field) in &columns {
                let cell = self
                    .frame
                    .series(symbol, *field)
                    .and_then(|s| s.get(&date))
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                record.push(cell);
            }
            wtr.write_record(&record)
                .map_err(|e| StoreError::Write(format!("row {date}: {e}")))?;
        }

        let bytes = wtr
            .into_inner()
            .map_err(|e| StoreError::Write(format!("flush: {e}")))?;

        let tmp = path.with_extension("csv.tmp");
        fs::write(&tmp, &bytes).map_err(|e| StoreError::Write(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Write(format!("atomic rename failed: {e}"))
        })?;

        let range = self.frame.date_range();
        let meta = SnapshotMeta {
            symbol_count: self.frame.symbols().len(),
            column_count: self.frame.column_count(),
            start_date: range.map(|(s, _)| s),
            end_date: range.map(|(_, e)| e),
            data_hash: blake3::hash(&bytes).to_hex().to_string(),
            saved_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| StoreError::Write(format!("meta serialization: {e}")))?;
        fs::write(meta_path(path), meta_json)
            .map_err(|e| StoreError::Write(format!("meta write: {e}")))?;

        Ok(())
    }

    /// Read the metadata sidecar of a snapshot, if present and parseable.
    pub fn read_meta(path: &Path) -> Option<SnapshotMeta> {
        let content = fs::read_to_string(meta_path(path)).ok()?;
        serde_json::from_str(&content).ok()
    }
}

fn meta_path(snapshot: &Path) -> PathBuf {
    snapshot.with_extension("meta.json")
}
