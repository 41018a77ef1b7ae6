//! Pluggable community policy. The projector asks one question — is this
//! post admissible under this community — and routes community
//! custom-json ops here once they appear on chain.

use serde_json::Value;
use tracing::debug;

use crate::ops::CommentOp;

/// Decides post admissibility for a community. Implementations must be
/// pure and fast; the verdict is recorded on the post row but never
/// blocks insertion.
pub trait CommunityPolicy: Send + Sync {
    fn is_community_post_valid(&self, community: &str, comment: &CommentOp) -> bool;

    /// Handle a `com.steemit.community` op issued by `account`. The
    /// default implementation records nothing.
    fn process_community_op(&self, account: &str, json: &Value, date: &str) {
        debug!(target: "community", %account, %date, body = %json, "ignoring community op");
    }
}

/// Default policy: every post is admissible. Deployments with community
/// rules swap in their own implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissivePolicy;

impl CommunityPolicy for PermissivePolicy {
    fn is_community_post_valid(&self, _community: &str, _comment: &CommentOp) -> bool {
        true
    }
}
