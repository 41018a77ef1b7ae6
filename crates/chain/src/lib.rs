//! Upstream node adapter: block and head-state fetching plus the per-post
//! content lookup the cache maintainer feeds on. The JSON-RPC
//! implementation fails fast with [`AdapterError::Transient`]; callers own
//! the retry cadence.

mod adapter;
mod condenser;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use adapter::{AdapterError, ChainAdapter, PostContent};
pub use condenser::CondenserAdapter;
