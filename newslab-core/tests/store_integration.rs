//! End-to-end pipeline tests: refresh against a scripted provider, merge
//! into the financial store, persist, reload, query, and report. The news
//! side runs the discover → fetch → reconcile → save loop the same way.

use chrono::NaiveDate;
use newslab_core::acquire::{
    refresh_financial, FetchError, MarketDataProvider, RefreshConfig, SilentProgress,
};
use newslab_core::news::fetch::{discover_links, fetch_articles, ArticleFetcher, LinkSearchProvider};
use newslab_core::news::article::Article;
use newslab_core::news::store::NewsStore;
use newslab_core::report::{database_status, financial_coverage};
use newslab_core::schema::{Field, FieldSeries, Observation};
use newslab_core::store::corp_actions::CorpActionStore;
use newslab_core::store::financial::FinancialStore;
use newslab_core::store::listing::ListingStore;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = env::temp_dir().join(format!("newslab_e2e_{}_{id}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Scripted provider keyed by symbol. Unknown symbols return InvalidSymbol;
/// symbols listed in `flaky` fail transiently on their first call.
struct TableProvider {
    series: HashMap<String, Vec<FieldSeries>>,
    flaky: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl TableProvider {
    fn new(series: HashMap<String, Vec<FieldSeries>>) -> Self {
        Self {
            series,
            flaky: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MarketDataProvider for TableProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch_series(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<FieldSeries>, FetchError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(symbol.to_string());
        let first_call = calls.iter().filter(|s| *s == symbol).count() == 1;
        if first_call && self.flaky.iter().any(|s| s == symbol) {
            return Err(FetchError::Transient("rate limited".into()));
        }
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| FetchError::InvalidSymbol(symbol.to_string()))
    }
}

fn obs(points: &[(&str, f64)]) -> Vec<Observation> {
    points
        .iter()
        .map(|(ts, v)| Observation::new(ts.to_string(), Some(*v)))
        .collect()
}

fn maybank_series() -> Vec<FieldSeries> {
    vec![
        FieldSeries::new(
            Field::Close,
            obs(&[("2020-01-02", 8.5), ("2020-01-03", 8.6)]),
        ),
        FieldSeries::new(Field::Volume, obs(&[("2020-01-02", 12_000.0)])),
        FieldSeries::new(
            Field::SharesOutstanding,
            obs(&[("2020-01-02", 1_000.0)]),
        ),
    ]
}

#[test]
fn refresh_merge_save_reload_query() {
    let dir = temp_dir();
    let db = dir.join("financial.csv");

    let mut table = HashMap::new();
    table.insert("MBBM.KL".to_string(), maybank_series());
    table.insert(
        "PUBM.KL".to_string(),
        vec![FieldSeries::new(
            Field::Close,
            obs(&[("2020-01-03", 19.8)]),
        )],
    );
    let mut provider = TableProvider::new(table);
    provider.flaky.push("PUBM.KL".to_string());

    let outcome = refresh_financial(
        &provider,
        &["MBBM.KL", "PUBM.KL", "BOGUS.KL"],
        d("2020-01-01"),
        d("2020-12-31"),
        &RefreshConfig::default(),
        &SilentProgress,
    );

    // The invalid symbol is skipped, the flaky one recovered on retry.
    assert!(outcome.all_succeeded());
    assert_eq!(outcome.batch.symbols(), vec!["MBBM.KL", "PUBM.KL"]);

    let mut store = FinancialStore::new();
    store.merge_symbols(outcome.batch, false);
    store.save(&db).unwrap();

    let reloaded = FinancialStore::load(&db).unwrap();
    let slice = reloaded.query(None, None, d("2020-01-01"), d("2020-12-31"));

    // Derived market cap survived the snapshot roundtrip.
    assert_eq!(
        slice.get("MBBM.KL", Field::MarketCap, d("2020-01-03")),
        Some(8_600.0)
    );
    assert_eq!(slice.get("PUBM.KL", Field::Close, d("2020-01-03")), Some(19.8));
    // Sparse cell: PUBM.KL has no value on the 2nd.
    assert_eq!(slice.get("PUBM.KL", Field::Close, d("2020-01-02")), None);

    let coverage = financial_coverage(&reloaded);
    assert_eq!(coverage.len(), 2);
    assert_eq!(coverage[0].symbol, "MBBM.KL");
    assert_eq!(coverage[0].non_null.get(&Field::Close), Some(&2));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn incremental_refresh_replaces_only_refetched_symbols() {
    let dir = temp_dir();
    let db = dir.join("financial.csv");

    let mut table = HashMap::new();
    table.insert("MBBM.KL".to_string(), maybank_series());
    table.insert(
        "PUBM.KL".to_string(),
        vec![FieldSeries::new(
            Field::Close,
            obs(&[("2020-01-03", 19.8)]),
        )],
    );
    let provider = TableProvider::new(table);

    let outcome = refresh_financial(
        &provider,
        &["MBBM.KL", "PUBM.KL"],
        d("2020-01-01"),
        d("2020-12-31"),
        &RefreshConfig::default(),
        &SilentProgress,
    );
    let mut store = FinancialStore::new();
    store.merge_symbols(outcome.batch, false);
    store.save(&db).unwrap();

    // A later, corrected history for one symbol only.
    let mut table = HashMap::new();
    table.insert(
        "MBBM.KL".to_string(),
        vec![FieldSeries::new(
            Field::Close,
            obs(&[("2020-02-03", 9.0)]),
        )],
    );
    let provider = TableProvider::new(table);
    let outcome = refresh_financial(
        &provider,
        &["MBBM.KL"],
        d("2020-01-01"),
        d("2020-12-31"),
        &RefreshConfig::default(),
        &SilentProgress,
    );

    let mut store = FinancialStore::load(&db).unwrap();
    store.merge_symbols(outcome.batch, false);

    // The refetched symbol carries only its new history; the other symbol
    // is untouched.
    let close = store.frame().series("MBBM.KL", Field::Close).unwrap();
    assert_eq!(close.len(), 1);
    assert_eq!(close.get(&d("2020-02-03")), Some(&9.0));
    assert!(store.frame().series("MBBM.KL", Field::Volume).is_none());
    assert_eq!(
        store.frame().series("PUBM.KL", Field::Close).unwrap().len(),
        1
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn status_aggregates_every_store() {
    let mut table = HashMap::new();
    table.insert("MBBM.KL".to_string(), maybank_series());
    let provider = TableProvider::new(table);

    let outcome = refresh_financial(
        &provider,
        &["MBBM.KL"],
        d("2020-01-01"),
        d("2020-12-31"),
        &RefreshConfig::default(),
        &SilentProgress,
    );
    let mut financial = FinancialStore::new();
    financial.merge_symbols(outcome.batch, false);

    let mut news = NewsStore::new();
    news.add_links(vec![("https://example.com/a", "TheStar")]);

    let status = database_status(
        &financial,
        &CorpActionStore::new(),
        &ListingStore::new(),
        &news,
    );

    assert_eq!(status.financial_symbols, 1);
    assert_eq!(status.financial_range, Some((d("2020-01-02"), d("2020-01-03"))));
    assert_eq!(status.pending_links, 1);
    assert_eq!(status.corp_action_records, 0);
}

struct OutletFixture {
    broken: Vec<String>,
}

impl LinkSearchProvider for OutletFixture {
    fn name(&self) -> &str {
        "outlet"
    }

    fn search_page(
        &self,
        _keyword: &str,
        _start: NaiveDate,
        _end: NaiveDate,
        page: u32,
    ) -> Result<Vec<(String, String)>, FetchError> {
        match page {
            0 => Ok(vec![
                ("https://outlet.example/a".to_string(), "TheStar".to_string()),
                ("https://outlet.example/b".to_string(), "TheStar".to_string()),
            ]),
            _ => Ok(Vec::new()),
        }
    }
}

impl ArticleFetcher for OutletFixture {
    fn name(&self) -> &str {
        "outlet"
    }

    fn fetch_article(&self, url: &str) -> Option<Article> {
        if self.broken.iter().any(|u| u == url) {
            return None;
        }
        Some(Article::new(
            url,
            "TheStar",
            d("2020-01-05").and_hms_opt(9, 30, 0),
            "Maybank quarterly earnings",
            "Body text.",
            "Business",
        ))
    }
}

#[test]
fn news_discover_fetch_save_reload_retry() {
    let dir = temp_dir();
    let links_db = dir.join("links.csv");
    let news_db = dir.join("news.csv");

    let outlet = OutletFixture {
        broken: vec!["https://outlet.example/b".to_string()],
    };

    let mut store = NewsStore::new();
    let added = discover_links(&mut store, &outlet, "maybank", d("2020-01-01"), d("2020-01-31"), 50)
        .unwrap();
    assert_eq!(added, 2);

    let report = fetch_articles(&mut store, &outlet, 100);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.failed, 1);

    store.save(&links_db, &news_db).unwrap();

    // Across a process restart, the failed link is still pending and the
    // recovered outlet fills it in without touching the stored article.
    let mut store = NewsStore::load(&links_db, &news_db).unwrap();
    assert_eq!(store.article_count(), 1);
    assert_eq!(store.pending_links().len(), 1);

    let outlet = OutletFixture { broken: Vec::new() };
    let report = fetch_articles(&mut store, &outlet, 100);
    assert_eq!(report.fetched, 1);
    assert_eq!(store.article_count(), 2);
    assert!(store.pending_links().is_empty());

    // Re-discovered links re-enter the frontier (the frontier only dedupes
    // against itself), and reconcile retires them against the articles.
    let added = discover_links(&mut store, &outlet, "maybank", d("2020-01-01"), d("2020-01-31"), 50)
        .unwrap();
    assert_eq!(added, 2);
    let retired = store.reconcile();
    assert_eq!(retired, 2);
    assert!(store.pending_links().is_empty());
    assert_eq!(store.article_count(), 2);

    let _ = fs::remove_dir_all(&dir);
}
