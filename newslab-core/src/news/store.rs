//! The news store: the pending-link frontier and the fetched-article table.
//!
//! Both tables are keyed by the same content hash (see
//! [`link_id`](super::article::link_id)). A link is retired from the
//! frontier only once an article with its id exists; a failed fetch leaves
//! the link pending, so it is retried on a later run.

use super::article::{link_id, Article, ArticleLink};
use crate::store::StoreError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Durable store for links and articles. Owns both tables; the only
/// externally observable checkpoint is an explicit [`save`](Self::save).
#[derive(Debug, Clone, Default)]
pub struct NewsStore {
    links: Vec<ArticleLink>,
    articles: Vec<Article>,
}

impl NewsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load both snapshots. Either file failing to read or parse is an
    /// error; use [`load_or_empty`](Self::load_or_empty) for bootstrap.
    pub fn load(links_path: &Path, articles_path: &Path) -> Result<Self, StoreError> {
        let links = read_csv(links_path)?;
        let articles = read_csv(articles_path)?;
        Ok(Self { links, articles })
    }

    pub fn load_or_empty(links_path: &Path, articles_path: &Path) -> Self {
        match Self::load(links_path, articles_path) {
            Ok(store) => store,
            Err(e) => {
                eprintln!("WARNING: news snapshots unavailable, starting empty: {e}");
                Self::new()
            }
        }
    }

    /// Add discovered `(url, source)` pairs to the frontier, hashing each
    /// URL to its id and deduplicating — the first occurrence wins.
    /// Returns how many links were actually new.
    pub fn add_links<I, U, S>(&mut self, discovered: I) -> usize
    where
        I: IntoIterator<Item = (U, S)>,
        U: Into<String>,
        S: Into<String>,
    {
        let mut seen: HashSet<String> = self.links.iter().map(|l| l.id.clone()).collect();
        let mut added = 0;
        for (url, source) in discovered {
            let link = ArticleLink::new(url, source);
            if seen.insert(link.id.clone()) {
                self.links.push(link);
                added += 1;
            }
        }
        added
    }

    /// The deduplicated frontier, in discovery order.
    pub fn pending_links(&self) -> &[ArticleLink] {
        &self.links
    }

    /// Drop from the frontier every link whose article already exists.
    /// Returns the number of links retired.
    pub fn reconcile(&mut self) -> usize {
        let fetched: HashSet<&str> = self.articles.iter().map(|a| a.id.as_str()).collect();
        let before = self.links.len();
        self.links.retain(|link| !fetched.contains(link.id.as_str()));
        before - self.links.len()
    }

    /// Append fetched articles, skipping ids already present. Returns the
    /// number actually inserted.
    pub fn insert_articles(&mut self, fetched: Vec<Article>) -> usize {
        let mut seen: HashSet<String> = self.articles.iter().map(|a| a.id.clone()).collect();
        let mut inserted = 0;
        for article in fetched {
            if seen.insert(article.id.clone()) {
                self.articles.push(article);
                inserted += 1;
            }
        }
        inserted
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn contains_article(&self, url: &str) -> bool {
        let id = link_id(url);
        self.articles.iter().any(|a| a.id == id)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    /// Reconcile, then persist both tables. A write failure is surfaced:
    /// it means freshly fetched articles would be lost.
    pub fn save(&mut self, links_path: &Path, articles_path: &Path) -> Result<(), StoreError> {
        self.reconcile();
        write_csv(articles_path, &self.articles)?;
        write_csv(links_path, &self.links)?;
        Ok(())
    }
}

fn read_csv<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|e| StoreError::Read(format!("{}: {e}", path.display())))?;
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result.map_err(|e| StoreError::Parse(format!("{}: {e}", path.display())))?);
    }
    Ok(rows)
}

fn write_csv<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| StoreError::Write(format!("{}: {e}", path.display())))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| StoreError::Write(format!("flush: {e}")))?;

    // Atomic replace: a torn write must never destroy the existing snapshot.
    let tmp = path.with_extension("csv.tmp");
    fs::write(&tmp, bytes).map_err(|e| StoreError::Write(format!("{}: {e}", tmp.display())))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::Write(format!("atomic rename failed: {e}"))
    })?;
    Ok(())
}
