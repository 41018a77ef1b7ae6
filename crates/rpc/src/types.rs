use serde::{Deserialize, Serialize};

/// Head heights on both sides of the pipeline. `diff` is the indexer's
/// lag behind the chain; operators alert when it grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadState {
    pub chain: u32,
    pub db:    u32,
    pub diff:  i64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowCount {
    pub account:         String,
    pub follower_count:  u64,
    pub following_count: u64
}

/// One entry of a blog or feed listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntry {
    pub post_id:    i64,
    pub author:     String,
    pub permlink:   String,
    pub created_at: String
}

/// One entry of a discussion or related-posts listing, carrying the
/// denormalized display fields listings are sorted by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionEntry {
    pub post_id:    i64,
    pub author:     String,
    pub permlink:   String,
    pub title:      String,
    pub payout:     f64,
    pub created_at: String
}

/// All-time and trailing-24h sums of closed payouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutStats {
    pub total:    f64,
    pub last_24h: f64
}
