//! Operation classification. Each `[op_type, body]` envelope is decoded
//! into the typed ops the projector consumes; a payload that does not
//! match its expected shape is logged and dropped without affecting the
//! rest of the block.

use std::collections::HashSet;

use hivemind_types::{Block, DirtySet};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct CommentOp {
    pub author:          String,
    pub permlink:        String,
    #[serde(default)]
    pub parent_author:   String,
    #[serde(default)]
    pub parent_permlink: String,
    #[serde(default)]
    pub json_metadata:   String
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteCommentOp {
    pub author:   String,
    pub permlink: String
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomJsonOp {
    pub id: String,
    #[serde(default)]
    pub required_posting_auths: Vec<String>,
    #[serde(default)]
    pub required_active_auths:  Vec<String>,
    #[serde(default)]
    pub json: String
}

/// Everything one block's operations ask of the projector.
#[derive(Debug, Default)]
pub struct BlockOps {
    pub accounts:    HashSet<String>,
    pub comments:    Vec<CommentOp>,
    pub deletes:     Vec<DeleteCommentOp>,
    pub custom_json: Vec<CustomJsonOp>,
    pub dirty:       DirtySet
}

/// Walk a block's transactions in order and classify every operation.
pub fn gather(block: &Block) -> BlockOps {
    let mut ops = BlockOps::default();
    for tx in &block.transactions {
        for op in &tx.operations {
            classify(&mut ops, op.kind(), op.body());
        }
    }
    ops
}

fn classify(ops: &mut BlockOps, kind: &str, body: &Value) {
    match kind {
        "pow" => {
            if let Some(worker) = body.get("worker_account").and_then(Value::as_str) {
                ops.accounts.insert(worker.to_string());
            } else {
                warn!(target: "parser", %kind, "op without worker_account");
            }
        }
        "pow2" => {
            let worker = body
                .get("work")
                .and_then(|w| w.get(1))
                .and_then(|w| w.get("input"))
                .and_then(|i| i.get("worker_account"))
                .and_then(Value::as_str);
            match worker {
                Some(worker) => {
                    ops.accounts.insert(worker.to_string());
                }
                None => warn!(target: "parser", %kind, "op without worker_account")
            }
        }
        "account_create" | "account_create_with_delegation" => {
            if let Some(name) = body.get("new_account_name").and_then(Value::as_str) {
                ops.accounts.insert(name.to_string());
            } else {
                warn!(target: "parser", %kind, "op without new_account_name");
            }
        }
        "comment" => match CommentOp::deserialize(body) {
            Ok(op) => {
                ops.dirty.insert((op.author.clone(), op.permlink.clone()));
                ops.comments.push(op);
            }
            Err(err) => warn!(target: "parser", %err, "malformed comment op")
        },
        "delete_comment" => match DeleteCommentOp::deserialize(body) {
            Ok(op) => ops.deletes.push(op),
            Err(err) => warn!(target: "parser", %err, "malformed delete_comment op")
        },
        "vote" => {
            let author = body.get("author").and_then(Value::as_str);
            let permlink = body.get("permlink").and_then(Value::as_str);
            if let (Some(author), Some(permlink)) = (author, permlink) {
                ops.dirty.insert((author.to_string(), permlink.to_string()));
            }
        }
        "custom_json" => match CustomJsonOp::deserialize(body) {
            Ok(op) => ops.custom_json.push(op),
            Err(err) => warn!(target: "parser", %err, "malformed custom_json op")
        },
        // everything else carries no state the indexer projects
        _ => {}
    }
}

/// Safely read the `community` field out of a comment's `json_metadata`.
/// Any shape mismatch, including unparsable JSON, yields `None`.
pub fn op_community(comment: &CommentOp) -> Option<String> {
    if comment.json_metadata.is_empty() {
        return None
    }
    let md: Value = serde_json::from_str(&comment.json_metadata).ok()?;
    md.as_object()?
        .get("community")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use hivemind_types::{Operation, SignedTransaction};
    use serde_json::json;

    use super::*;

    fn block_with(ops: Vec<(&str, Value)>) -> Block {
        Block {
            block_id:     "0000000100000000".into(),
            previous:     "0000000000000000".into(),
            timestamp:    "2016-03-24T16:05:00".into(),
            transactions: vec![SignedTransaction {
                operations: ops
                    .into_iter()
                    .map(|(kind, body)| Operation(kind.to_string(), body))
                    .collect()
            }]
        }
    }

    #[test]
    fn gathers_accounts_from_all_creation_ops() {
        let block = block_with(vec![
            ("pow", json!({ "worker_account": "miner1" })),
            ("pow2", json!({ "work": [0, { "input": { "worker_account": "miner2" } }] })),
            ("account_create", json!({ "new_account_name": "alice" })),
            ("account_create_with_delegation", json!({ "new_account_name": "bob" })),
        ]);
        let ops = gather(&block);
        for name in ["miner1", "miner2", "alice", "bob"] {
            assert!(ops.accounts.contains(name), "{name}");
        }
    }

    #[test]
    fn comment_and_vote_mark_dirty() {
        let block = block_with(vec![
            (
                "comment",
                json!({
                    "author": "alice", "permlink": "hello",
                    "parent_author": "", "parent_permlink": "life",
                    "json_metadata": "{}"
                })
            ),
            ("vote", json!({ "author": "bob", "permlink": "world", "voter": "carol" })),
        ]);
        let ops = gather(&block);
        assert_eq!(ops.comments.len(), 1);
        assert!(ops.dirty.contains(&("alice".into(), "hello".into())));
        assert!(ops.dirty.contains(&("bob".into(), "world".into())));
    }

    #[test]
    fn malformed_and_unknown_ops_are_dropped() {
        let block = block_with(vec![
            ("comment", json!({ "permlink": "no-author" })),
            ("transfer", json!({ "from": "a", "to": "b" })),
            ("pow", json!({})),
        ]);
        let ops = gather(&block);
        assert!(ops.comments.is_empty());
        assert!(ops.accounts.is_empty());
        assert!(ops.dirty.is_empty());
    }

    #[test]
    fn community_read_is_tolerant() {
        let mut op = CommentOp {
            author:          "alice".into(),
            permlink:        "p".into(),
            parent_author:   String::new(),
            parent_permlink: "life".into(),
            json_metadata:   r#"{"community":"hive-dev"}"#.into()
        };
        assert_eq!(op_community(&op).as_deref(), Some("hive-dev"));

        op.json_metadata = "not json".into();
        assert_eq!(op_community(&op), None);

        op.json_metadata = r#"["community"]"#.into();
        assert_eq!(op_community(&op), None);

        op.json_metadata = String::new();
        assert_eq!(op_community(&op), None);
    }
}
