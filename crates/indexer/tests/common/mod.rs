//! Shared helpers for projection and sync tests: block construction and
//! a schema-ready in-memory store.

use hivemind_store::Store;
use hivemind_types::{Block, Operation, SignedTransaction};
use serde_json::Value;

/// Deterministic 40-hex block id with the block number as prefix.
pub fn block_id(num: u32) -> String {
    format!("{num:08x}{:032x}", (num as u64).wrapping_mul(7919))
}

/// A block whose `previous` links to `num - 1`.
pub fn block(num: u32, timestamp: &str, ops: Vec<(&str, Value)>) -> Block {
    Block {
        block_id:     block_id(num),
        previous:     if num == 0 { String::new() } else { block_id(num - 1) },
        timestamp:    timestamp.to_string(),
        transactions: vec![SignedTransaction {
            operations: ops
                .into_iter()
                .map(|(kind, body)| Operation(kind.to_string(), body))
                .collect()
        }]
    }
}

pub async fn test_store() -> Store {
    let store = Store::in_memory().await.expect("in-memory store");
    store.ensure_schema().await.expect("schema");
    store
}
