//! Article and link records, keyed by a content hash of the URL.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Stable identifier for a URL: order-independent, the same URL always
/// hashes to the same id. Sixteen hex chars of blake3 is plenty for a
/// frontier of article links.
pub fn link_id(url: &str) -> String {
    blake3::hash(url.as_bytes()).to_hex()[..16].to_string()
}

/// A discovered-but-not-yet-fetched article link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleLink {
    pub id: String,
    pub url: String,
    pub source: String,
}

impl ArticleLink {
    pub fn new(url: impl Into<String>, source: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: link_id(&url),
            url,
            source: source.into(),
        }
    }
}

/// A fetched article. Shares its id with the link it came from. A failed
/// fetch produces no `Article` at all — never a row of empty fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub url: String,
    pub source: String,
    /// None when the outlet page carried no parseable timestamp.
    pub published_at: Option<NaiveDateTime>,
    pub headline: String,
    pub body: String,
    pub category: String,
}

impl Article {
    pub fn new(
        url: impl Into<String>,
        source: impl Into<String>,
        published_at: Option<NaiveDateTime>,
        headline: impl Into<String>,
        body: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let url = url.into();
        Self {
            id: link_id(&url),
            url,
            source: source.into(),
            published_at,
            headline: headline.into(),
            body: body.into(),
            category: category.into(),
        }
    }
}
