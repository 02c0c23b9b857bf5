//! The two-level wide table: `(symbol, field)` columns over a date axis.
//!
//! Columns are stored column-major as sparse date→value series, so an outer
//! join on date is just a column union — rows never have to be materialized
//! until a query or a snapshot write asks for them.

use crate::schema::Field;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// A single column: sparse values keyed by date.
pub type Series = BTreeMap<NaiveDate, f64>;

/// Multi-symbol wide frame. Symbols and fields iterate in sorted order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideFrame {
    columns: BTreeMap<String, BTreeMap<Field, Series>>,
}

impl WideFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Known symbols, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        self.columns.keys().map(|s| s.as_str()).collect()
    }

    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.columns.contains_key(symbol)
    }

    /// Fields present for a symbol, sorted in `Field` order.
    pub fn fields(&self, symbol: &str) -> Vec<Field> {
        self.columns
            .get(symbol)
            .map(|cols| cols.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn series(&self, symbol: &str, field: Field) -> Option<&Series> {
        self.columns.get(symbol)?.get(&field)
    }

    /// Total number of `(symbol, field)` columns.
    pub fn column_count(&self) -> usize {
        self.columns.values().map(|cols| cols.len()).sum()
    }

    /// Insert one column. An empty series is ignored: a field that
    /// contributed no values must not appear as a column.
    pub fn insert_series(&mut self, symbol: &str, field: Field, series: Series) {
        if series.is_empty() {
            return;
        }
        self.columns
            .entry(symbol.to_string())
            .or_default()
            .insert(field, series);
    }

    /// Remove every column of a symbol. Returns true if anything was removed.
    pub fn drop_symbol(&mut self, symbol: &str) -> bool {
        self.columns.remove(symbol).is_some()
    }

    /// Column-union another frame into this one (outer join on date).
    /// On a `(symbol, field)` collision the incoming column wins.
    pub fn union(&mut self, other: WideFrame) {
        for (symbol, cols) in other.columns {
            let entry = self.columns.entry(symbol).or_default();
            for (field, series) in cols {
                entry.insert(field, series);
            }
        }
    }

    /// Union of all dates across all columns.
    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.columns
            .values()
            .flat_map(|cols| cols.values())
            .flat_map(|series| series.keys().copied())
            .collect()
    }

    /// First and last date over the whole frame, if any column has data.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.dates();
        Some((*dates.first()?, *dates.last()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Field, &Series)> {
        self.columns.iter().flat_map(|(symbol, cols)| {
            cols.iter()
                .map(move |(field, series)| (symbol.as_str(), *field, series))
        })
    }
}
