//! NewsLab Core — incremental market-data and news synchronization engine.
//!
//! This crate contains the heart of the pipeline:
//! - The sparse wide table keyed by `(symbol, field)` columns
//! - Per-symbol assembly: day truncation, unpriced-row dropping, market-cap derivation
//! - Incremental merge of refreshed batches into the durable financial store
//! - Corporate-action and listing snapshots, refreshed wholesale
//! - The news link frontier and article table, reconciled by content hash
//! - Chunked, bounded-retry batch refresh against pluggable providers

pub mod acquire;
pub mod news;
pub mod report;
pub mod schema;
pub mod settings;
pub mod store;
pub mod universe;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the types crossing the CLI's worker boundary
    /// are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<schema::Field>();
        require_sync::<schema::Field>();
        require_send::<schema::FieldSeries>();
        require_sync::<schema::FieldSeries>();

        require_send::<store::wide::WideFrame>();
        require_sync::<store::wide::WideFrame>();
        require_send::<store::financial::FinancialStore>();
        require_sync::<store::financial::FinancialStore>();
        require_send::<store::corp_actions::CorpActionStore>();
        require_sync::<store::corp_actions::CorpActionStore>();
        require_send::<store::listing::ListingStore>();
        require_sync::<store::listing::ListingStore>();

        require_send::<news::store::NewsStore>();
        require_sync::<news::store::NewsStore>();
        require_send::<news::article::Article>();
        require_sync::<news::article::Article>();

        require_send::<acquire::RefreshOutcome>();
        require_sync::<acquire::RefreshOutcome>();
        require_send::<acquire::FetchError>();
        require_sync::<acquire::FetchError>();
    }
}
