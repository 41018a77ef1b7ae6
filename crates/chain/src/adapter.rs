use hivemind_types::Block;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    /// The upstream was unreachable or answered with a transport-level
    /// failure. Recoverable; callers retry with backoff.
    #[error("upstream request failed: {0}")]
    Transient(String),
    /// The upstream answered, but not with the shape we expect.
    #[error("unexpected upstream response: {0}")]
    Response(#[from] serde_json::Error)
}

/// Read-only view of the upstream node. One implementation speaks
/// JSON-RPC to a live node; tests swap in [`crate::mock::MockAdapter`].
#[async_trait::async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Current head height.
    async fn head_block(&self) -> Result<u32, AdapterError>;

    /// Height below which the upstream guarantees no reorganization.
    async fn last_irreversible_block_num(&self) -> Result<u32, AdapterError>;

    /// Timestamp of the upstream head, in the chain's ISO-8601 form.
    async fn head_time(&self) -> Result<String, AdapterError>;

    /// Fetch a single block. `None` means the block does not exist yet.
    async fn get_block(&self, num: u32) -> Result<Option<Block>, AdapterError>;

    /// Fetch the half-open range `[lo, hi)`, delivered in ascending order.
    async fn get_blocks_range(&self, lo: u32, hi: u32) -> Result<Vec<Block>, AdapterError>;

    /// Denormalized content and payout state for one post. `None` when the
    /// upstream has no such post.
    async fn get_content(
        &self,
        author: &str,
        permlink: &str
    ) -> Result<Option<PostContent>, AdapterError>;
}

/// Post content as the upstream serializes it. Every field defaults so a
/// partial answer degrades to empty values instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostContent {
    #[serde(default)]
    pub id:                   u64,
    #[serde(default)]
    pub author:               String,
    #[serde(default)]
    pub permlink:             String,
    #[serde(default)]
    pub title:                String,
    #[serde(default)]
    pub body:                 String,
    #[serde(default)]
    pub json_metadata:        String,
    #[serde(default)]
    pub created:              String,
    #[serde(default)]
    pub last_update:          String,
    #[serde(default)]
    pub last_payout:          String,
    #[serde(default)]
    pub cashout_time:         String,
    /// Asset string, e.g. `"1.234 SBD"`.
    #[serde(default)]
    pub pending_payout_value: String,
    #[serde(default)]
    pub total_payout_value:   String,
    #[serde(default)]
    pub curator_payout_value: String,
    /// Arrives as either a number or a decimal string depending on the
    /// upstream version.
    #[serde(default)]
    pub net_rshares:          Value,
    #[serde(default)]
    pub net_votes:            i64
}

impl PostContent {
    pub fn rshares(&self) -> i64 {
        match &self.net_rshares {
            Value::Number(n) => n.as_i64().unwrap_or(0),
            Value::String(s) => s.parse().unwrap_or(0),
            _ => 0
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn content_decodes_with_missing_fields() {
        let content: PostContent =
            serde_json::from_value(json!({ "author": "alice", "permlink": "hello" })).unwrap();
        assert_eq!(content.author, "alice");
        assert_eq!(content.pending_payout_value, "");
        assert_eq!(content.rshares(), 0);
    }

    #[test]
    fn rshares_accepts_number_or_string() {
        let mut content = PostContent { net_rshares: json!(42), ..Default::default() };
        assert_eq!(content.rshares(), 42);
        content.net_rshares = json!("1234567890123");
        assert_eq!(content.rshares(), 1_234_567_890_123);
        content.net_rshares = json!(["weird"]);
        assert_eq!(content.rshares(), 0);
    }
}
