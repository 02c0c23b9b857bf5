//! Drivers for link discovery and article fetching.
//!
//! The outlets themselves sit behind two traits so the scraping specifics
//! (HTTP sessions, HTML parsing, outlet-specific selectors) stay out of the
//! core and tests can script them.

use super::article::Article;
use super::store::NewsStore;
use crate::acquire::provider::FetchError;
use chrono::{NaiveDate, NaiveDateTime};

/// Fetches one article from its URL. `None` means the fetch or parse
/// failed: no partial record is ever produced, and the driver leaves the
/// link pending for a later run.
pub trait ArticleFetcher {
    /// Human-readable name of the outlet this fetcher understands.
    fn name(&self) -> &str;

    fn fetch_article(&self, url: &str) -> Option<Article>;
}

/// Searches an outlet for article links matching a keyword, one result page
/// at a time. Paging stops at the first empty page.
pub trait LinkSearchProvider {
    fn name(&self) -> &str;

    /// Returns `(url, source)` pairs for one result page (zero-based).
    fn search_page(
        &self,
        keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
        page: u32,
    ) -> Result<Vec<(String, String)>, FetchError>;
}

/// Outcome of one article-fetch pass.
#[derive(Debug, Default, PartialEq)]
pub struct FetchReport {
    pub fetched: usize,
    pub failed: usize,
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
}

/// Fetch up to `limit` pending articles and append them to the store.
///
/// The frontier is reconciled first so already-fetched links are never
/// re-fetched; links whose fetch fails stay in the frontier.
pub fn fetch_articles(
    store: &mut NewsStore,
    fetcher: &dyn ArticleFetcher,
    limit: usize,
) -> FetchReport {
    store.reconcile();

    let pending: Vec<String> = store
        .pending_links()
        .iter()
        .take(limit)
        .map(|link| link.url.clone())
        .collect();

    let mut report = FetchReport::default();
    let mut articles = Vec::new();
    for url in &pending {
        match fetcher.fetch_article(url) {
            Some(article) => {
                if let Some(ts) = article.published_at {
                    report.earliest = Some(report.earliest.map_or(ts, |e| e.min(ts)));
                    report.latest = Some(report.latest.map_or(ts, |l| l.max(ts)));
                }
                articles.push(article);
                report.fetched += 1;
            }
            None => report.failed += 1,
        }
    }

    store.insert_articles(articles);
    store.reconcile();
    report
}

/// Page a search provider until it returns an empty page (or `max_pages`),
/// feeding every discovered link into the frontier. Returns the number of
/// new links added.
pub fn discover_links(
    store: &mut NewsStore,
    search: &dyn LinkSearchProvider,
    keyword: &str,
    start: NaiveDate,
    end: NaiveDate,
    max_pages: u32,
) -> Result<usize, FetchError> {
    let mut added = 0;
    for page in 0..max_pages {
        let links = search.search_page(keyword, start, end, page)?;
        if links.is_empty() {
            break;
        }
        added += store.add_links(links);
    }
    Ok(added)
}
