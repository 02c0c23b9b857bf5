//! Status and coverage summaries over the on-disk stores.

use crate::news::store::NewsStore;
use crate::schema::Field;
use crate::store::corp_actions::CorpActionStore;
use crate::store::financial::FinancialStore;
use crate::store::listing::ListingStore;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// Snapshot-level counts and date ranges across every store. An empty
/// store reports explicit zeros rather than being omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseStatus {
    pub financial_symbols: usize,
    pub financial_columns: usize,
    pub financial_range: Option<(NaiveDate, NaiveDate)>,
    pub corp_action_records: usize,
    pub corp_action_symbols: usize,
    pub corp_action_range: Option<(NaiveDate, NaiveDate)>,
    pub listings: usize,
    pub pending_links: usize,
    pub articles: usize,
}

impl fmt::Display for DatabaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Financial:    {} symbols, {} columns{}",
            self.financial_symbols,
            self.financial_columns,
            range_suffix(self.financial_range)
        )?;
        writeln!(
            f,
            "Corp actions: {} records, {} symbols{}",
            self.corp_action_records,
            self.corp_action_symbols,
            range_suffix(self.corp_action_range)
        )?;
        writeln!(f, "Listings:     {}", self.listings)?;
        write!(
            f,
            "News:         {} articles, {} links pending",
            self.articles, self.pending_links
        )
    }
}

fn range_suffix(range: Option<(NaiveDate, NaiveDate)>) -> String {
    match range {
        Some((start, end)) => format!(", {start} to {end}"),
        None => String::new(),
    }
}

pub fn database_status(
    financial: &FinancialStore,
    corp_actions: &CorpActionStore,
    listings: &ListingStore,
    news: &NewsStore,
) -> DatabaseStatus {
    DatabaseStatus {
        financial_symbols: financial.symbols().len(),
        financial_columns: financial.frame().column_count(),
        financial_range: financial.frame().date_range(),
        corp_action_records: corp_actions.records().len(),
        corp_action_symbols: corp_actions.symbol_count(),
        corp_action_range: corp_actions.date_range(),
        listings: listings.symbol_count(),
        pending_links: news.link_count(),
        articles: news.article_count(),
    }
}

/// Per-symbol coverage of the financial table: the observed date span and
/// how many non-null values each field carries.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolCoverage {
    pub symbol: String,
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub non_null: BTreeMap<Field, usize>,
}

pub fn financial_coverage(store: &FinancialStore) -> Vec<SymbolCoverage> {
    let frame = store.frame();
    let mut out = Vec::new();
    for symbol in frame.symbols() {
        let mut first: Option<NaiveDate> = None;
        let mut last: Option<NaiveDate> = None;
        let mut non_null = BTreeMap::new();
        for field in frame.fields(symbol) {
            let Some(series) = frame.series(symbol, field) else {
                continue;
            };
            non_null.insert(field, series.len());
            if let Some((lo, _)) = series.first_key_value() {
                first = Some(first.map_or(*lo, |f| f.min(*lo)));
            }
            if let Some((hi, _)) = series.last_key_value() {
                last = Some(last.map_or(*hi, |l| l.max(*hi)));
            }
        }
        if let (Some(first), Some(last)) = (first, last) {
            out.push(SymbolCoverage {
                symbol: symbol.to_string(),
                first,
                last,
                non_null,
            });
        }
    }
    out
}
