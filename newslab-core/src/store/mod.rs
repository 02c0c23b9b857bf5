//! Durable keyed tables and the merge engine that reconciles them with
//! freshly acquired batches.

pub mod assemble;
pub mod corp_actions;
pub mod financial;
pub mod listing;
pub mod wide;

pub use assemble::{assemble_batch, assemble_symbol};
pub use corp_actions::{CorpActionStore, CorporateAction};
pub use financial::{FinancialStore, SnapshotMeta, TableSlice};
pub use listing::{Listing, ListingStore};
pub use wide::{Series, WideFrame};

use thiserror::Error;

/// Errors from snapshot I/O.
///
/// Load failures are recoverable at the caller's discretion (a first run has
/// no snapshot to load); save failures mean newly acquired data is at risk
/// and must never be swallowed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot read failed: {0}")]
    Read(String),

    #[error("snapshot parse failed: {0}")]
    Parse(String),

    #[error("snapshot write failed: {0}")]
    Write(String),
}
