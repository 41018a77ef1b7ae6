use jsonrpsee::{core::RpcResult, proc_macros::rpc};

use crate::types::{DiscussionEntry, FeedEntry, FollowCount, HeadState, PayoutStats};

#[rpc(server, namespace = "hive")]
pub trait HiveApi {
    /// Chain head vs indexed head, with the lag between them.
    #[method(name = "head_state")]
    async fn head_state(&self) -> RpcResult<HeadState>;

    /// Accounts following `account` (state blog), newest first.
    #[method(name = "get_followers")]
    async fn get_followers(
        &self,
        account: String,
        skip: Option<u32>,
        limit: Option<u32>
    ) -> RpcResult<Vec<String>>;

    /// Accounts `account` follows (state blog), newest first.
    #[method(name = "get_following")]
    async fn get_following(
        &self,
        account: String,
        skip: Option<u32>,
        limit: Option<u32>
    ) -> RpcResult<Vec<String>>;

    #[method(name = "get_follow_count")]
    async fn get_follow_count(&self, account: String) -> RpcResult<FollowCount>;

    /// The account's own timeline: root posts and reblogs.
    #[method(name = "get_blog_feed")]
    async fn get_blog_feed(
        &self,
        account: String,
        skip: Option<u32>,
        limit: Option<u32>
    ) -> RpcResult<Vec<FeedEntry>>;

    /// Posts surfaced by the accounts `account` follows.
    #[method(name = "get_user_feed")]
    async fn get_user_feed(
        &self,
        account: String,
        skip: Option<u32>,
        limit: Option<u32>
    ) -> RpcResult<Vec<FeedEntry>>;

    /// Discussion listing under a sort (`trending`, `hot`, `created`,
    /// `payout`), optionally restricted to one tag.
    #[method(name = "get_discussions")]
    async fn get_discussions(
        &self,
        sort: String,
        tag: Option<String>,
        skip: Option<u32>,
        limit: Option<u32>
    ) -> RpcResult<Vec<DiscussionEntry>>;

    /// Other live root posts sharing a post's author and category.
    #[method(name = "get_related_posts")]
    async fn get_related_posts(
        &self,
        author: String,
        permlink: String
    ) -> RpcResult<Vec<DiscussionEntry>>;

    /// Payout totals: all-time and the trailing 24 hours.
    #[method(name = "get_payout_stats")]
    async fn get_payout_stats(&self) -> RpcResult<PayoutStats>;
}
