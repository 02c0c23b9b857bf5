//! Assembles one acquisition batch into a [`WideFrame`].
//!
//! Each symbol arrives as a set of raw per-field series that may cover
//! disjoint fields and disjoint dates. Per symbol, the engine outer-joins
//! the fields on date, drops fields that contributed nothing, drops dates
//! that carry no pricing at all, forward-fills shares outstanding and
//! derives market capitalization. Per-symbol frames are then column-unioned
//! into the batch result handed to
//! [`FinancialStore::merge_symbols`](super::financial::FinancialStore::merge_symbols).

use super::wide::{Series, WideFrame};
use crate::schema::{Field, FieldSeries};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Assemble the per-field series of a single symbol.
///
/// Rules:
/// - timestamps are truncated to calendar days before grouping; duplicate
///   same-day observations keep the first
/// - a field with zero non-null values contributes no column
/// - when any pricing field is present, every date without a single pricing
///   value is dropped
/// - SHARES_OUTSTANDING is forward-filled over the symbol's date axis, and
///   MARKET_CAP = CLOSE × filled shares is derived; with no shares
///   outstanding the field is simply absent
/// - a symbol with zero usable fields contributes nothing at all
pub fn assemble_symbol(symbol: &str, series: &[FieldSeries]) -> WideFrame {
    let mut fields: BTreeMap<Field, Series> = BTreeMap::new();
    for field_series in series {
        // Derived, never taken from a provider.
        if field_series.field == Field::MarketCap {
            continue;
        }
        let column = fields.entry(field_series.field).or_default();
        for obs in &field_series.points {
            let Some(value) = obs.value else { continue };
            let Some(day) = obs.timestamp.get(..10) else { continue };
            let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") else {
                continue;
            };
            // First same-day observation wins.
            column.entry(date).or_insert(value);
        }
    }
    fields.retain(|_, column| !column.is_empty());
    if fields.is_empty() {
        return WideFrame::new();
    }

    drop_unpriced_rows(&mut fields);
    fill_shares_and_derive_market_cap(&mut fields);

    let mut frame = WideFrame::new();
    for (field, column) in fields {
        frame.insert_series(symbol, field, column);
    }
    frame
}

/// Assemble a whole batch: per-symbol frames column-unioned together.
pub fn assemble_batch<I>(symbols: I) -> WideFrame
where
    I: IntoIterator<Item = (String, Vec<FieldSeries>)>,
{
    let mut batch = WideFrame::new();
    for (symbol, series) in symbols {
        batch.union(assemble_symbol(&symbol, &series));
    }
    batch
}

/// Drop every date that has no pricing value in any column. A symbol with
/// no pricing fields at all (say, volume only) is left alone.
fn drop_unpriced_rows(fields: &mut BTreeMap<Field, Series>) {
    let priced: BTreeSet<NaiveDate> = fields
        .iter()
        .filter(|(field, _)| field.is_pricing())
        .flat_map(|(_, column)| column.keys().copied())
        .collect();
    if priced.is_empty() {
        return;
    }
    for column in fields.values_mut() {
        column.retain(|date, _| priced.contains(date));
    }
    fields.retain(|_, column| !column.is_empty());
}

fn fill_shares_and_derive_market_cap(fields: &mut BTreeMap<Field, Series>) {
    let Some(observed) = fields.remove(&Field::SharesOutstanding) else {
        return;
    };

    let axis: BTreeSet<NaiveDate> = fields
        .values()
        .flat_map(|column| column.keys().copied())
        .chain(observed.keys().copied())
        .collect();

    let mut filled = Series::new();
    let mut carried = None;
    for date in axis {
        if let Some(value) = observed.get(&date) {
            carried = Some(*value);
        }
        if let Some(value) = carried {
            filled.insert(date, value);
        }
    }

    if let Some(close) = fields.get(&Field::Close) {
        let market_cap: Series = close
            .iter()
            .filter_map(|(date, close)| filled.get(date).map(|shares| (*date, close * shares)))
            .collect();
        if !market_cap.is_empty() {
            fields.insert(Field::MarketCap, market_cap);
        }
    }

    if !filled.is_empty() {
        fields.insert(Field::SharesOutstanding, filled);
    }
}
