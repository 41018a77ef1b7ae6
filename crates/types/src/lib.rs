//! Shared primitives for the hivemind indexer: the upstream block and
//! operation envelope, account-name validation and the dirty-set type
//! threaded from the projector to the cache maintainer.

use std::collections::HashSet;

pub mod account;
pub mod block;

pub use account::is_valid_account_name;
pub use block::{Block, BlockIdError, Operation, SignedTransaction};

/// `(author, permlink)` pairs touched by comment or vote operations
/// during a projection window, queued for post-cache refresh.
pub type DirtySet = HashSet<(String, String)>;
