//! Block ingestion and projection pipeline: classifies the operation
//! stream, applies each block's effects in one transaction, keeps the
//! feed and post caches consistent, and drives checkpoint replay, range
//! backfill and the live tail.

use hivemind_chain::AdapterError;
use hivemind_types::BlockIdError;
use thiserror::Error;

pub mod cache;
pub mod checkpoints;
pub mod community;
pub mod ops;
pub mod projector;
pub mod sync;

pub use community::{CommunityPolicy, PermissivePolicy};
pub use sync::{SyncConfig, SyncDriver};

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("upstream error: {0}")]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    BadBlockId(#[from] BlockIdError),

    /// Derived state no longer matches the applied block stream. Fatal to
    /// the current writer; requires operator action.
    #[error("indexer state integrity violated: {0}")]
    Integrity(String),

    /// The live tail received a block that does not link to the last one
    /// applied. No pop-block facility exists, so the writer exits.
    #[error("unlinkable block {block_id}: have {have}, got {got}")]
    ForkDetected {
        have:     String,
        got:      String,
        block_id: String
    },

    #[error("checkpoint io: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt checkpoint block: {0}")]
    CheckpointDecode(#[from] serde_json::Error),

    /// Internal marker: a stop was requested while waiting. Mapped to a
    /// clean return before it leaves the driver.
    #[error("shutdown requested")]
    Cancelled
}
