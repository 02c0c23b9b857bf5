//! News link frontier and article storage.

pub mod article;
pub mod fetch;
pub mod store;

pub use article::{link_id, Article, ArticleLink};
pub use fetch::{discover_links, fetch_articles, ArticleFetcher, FetchReport, LinkSearchProvider};
pub use store::NewsStore;
