use std::sync::Arc;

use hivemind_chain::ChainAdapter;
use hivemind_store::Store;
use jsonrpsee::{
    core::RpcResult,
    types::{
        error::{INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE},
        ErrorObjectOwned
    }
};

use crate::{
    api::HiveApiServer,
    types::{DiscussionEntry, FeedEntry, FollowCount, HeadState, PayoutStats}
};

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;
const RELATED_LIMIT: i64 = 10;

pub struct HiveApi {
    store:   Store,
    adapter: Arc<dyn ChainAdapter>
}

impl HiveApi {
    pub fn new(store: Store, adapter: Arc<dyn ChainAdapter>) -> Self {
        Self { store, adapter }
    }
}

fn internal_error(err: impl std::fmt::Display) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(INTERNAL_ERROR_CODE, err.to_string(), None::<()>)
}

fn invalid_params(err: impl std::fmt::Display) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(INVALID_PARAMS_CODE, err.to_string(), None::<()>)
}

fn page(skip: Option<u32>, limit: Option<u32>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    (skip.unwrap_or(0) as i64, limit as i64)
}

#[async_trait::async_trait]
impl HiveApiServer for HiveApi {
    async fn head_state(&self) -> RpcResult<HeadState> {
        let chain = self.adapter.head_block().await.map_err(internal_error)?;
        let db = self.store.db_last_block().await.map_err(internal_error)?;
        Ok(HeadState { chain, db, diff: chain as i64 - db as i64 })
    }

    async fn get_followers(
        &self,
        account: String,
        skip: Option<u32>,
        limit: Option<u32>
    ) -> RpcResult<Vec<String>> {
        let (skip, limit) = page(skip, limit);
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT follower FROM hive_follows WHERE following = ?1 AND state = 1 \
             ORDER BY created_at DESC, follower LIMIT ?2 OFFSET ?3"
        )
        .bind(&account)
        .bind(limit)
        .bind(skip)
        .fetch_all(self.store.pool())
        .await
        .map_err(internal_error)?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn get_following(
        &self,
        account: String,
        skip: Option<u32>,
        limit: Option<u32>
    ) -> RpcResult<Vec<String>> {
        let (skip, limit) = page(skip, limit);
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT following FROM hive_follows WHERE follower = ?1 AND state = 1 \
             ORDER BY created_at DESC, following LIMIT ?2 OFFSET ?3"
        )
        .bind(&account)
        .bind(limit)
        .bind(skip)
        .fetch_all(self.store.pool())
        .await
        .map_err(internal_error)?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn get_follow_count(&self, account: String) -> RpcResult<FollowCount> {
        let (follower_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM hive_follows WHERE following = ?1 AND state = 1")
                .bind(&account)
                .fetch_one(self.store.pool())
                .await
                .map_err(internal_error)?;
        let (following_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM hive_follows WHERE follower = ?1 AND state = 1")
                .bind(&account)
                .fetch_one(self.store.pool())
                .await
                .map_err(internal_error)?;
        Ok(FollowCount {
            account,
            follower_count:  follower_count as u64,
            following_count: following_count as u64
        })
    }

    async fn get_blog_feed(
        &self,
        account: String,
        skip: Option<u32>,
        limit: Option<u32>
    ) -> RpcResult<Vec<FeedEntry>> {
        let (skip, limit) = page(skip, limit);
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT p.id, p.author, p.permlink, f.created_at \
             FROM hive_feed_cache f JOIN hive_posts p ON p.id = f.post_id \
             WHERE f.account = ?1 \
             ORDER BY f.created_at DESC, p.id DESC LIMIT ?2 OFFSET ?3"
        )
        .bind(&account)
        .bind(limit)
        .bind(skip)
        .fetch_all(self.store.pool())
        .await
        .map_err(internal_error)?;
        Ok(rows.into_iter().map(feed_entry).collect())
    }

    async fn get_user_feed(
        &self,
        account: String,
        skip: Option<u32>,
        limit: Option<u32>
    ) -> RpcResult<Vec<FeedEntry>> {
        let (skip, limit) = page(skip, limit);
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT p.id, p.author, p.permlink, MIN(f.created_at) AS created_at \
             FROM hive_feed_cache f \
             JOIN hive_follows fl ON fl.following = f.account \
             AND fl.follower = ?1 AND fl.state = 1 \
             JOIN hive_posts p ON p.id = f.post_id \
             GROUP BY p.id, p.author, p.permlink \
             ORDER BY created_at DESC, p.id DESC LIMIT ?2 OFFSET ?3"
        )
        .bind(&account)
        .bind(limit)
        .bind(skip)
        .fetch_all(self.store.pool())
        .await
        .map_err(internal_error)?;
        Ok(rows.into_iter().map(feed_entry).collect())
    }

    async fn get_discussions(
        &self,
        sort: String,
        tag: Option<String>,
        skip: Option<u32>,
        limit: Option<u32>
    ) -> RpcResult<Vec<DiscussionEntry>> {
        let order = match sort.as_str() {
            "trending" => "c.sc_trend",
            "hot" => "c.sc_hot",
            "created" => "p.created_at",
            "payout" => "c.payout",
            _ => return Err(invalid_params(format!("unknown sort: {sort}")))
        };
        let (skip, limit) = page(skip, limit);

        let sql = format!(
            "SELECT c.post_id, p.author, p.permlink, c.title, c.payout, p.created_at \
             FROM hive_posts_cache c JOIN hive_posts p ON p.id = c.post_id \
             WHERE p.is_deleted = 0 AND p.depth = 0{tag_filter} \
             ORDER BY {order} DESC, c.post_id DESC LIMIT ?1 OFFSET ?2",
            tag_filter = if tag.is_some() { " AND p.category = ?3" } else { "" }
        );
        let mut query = sqlx::query_as::<_, (i64, String, String, String, f64, String)>(&sql)
            .bind(limit)
            .bind(skip);
        if let Some(tag) = &tag {
            query = query.bind(tag);
        }
        let rows = query
            .fetch_all(self.store.pool())
            .await
            .map_err(internal_error)?;
        Ok(rows.into_iter().map(discussion_entry).collect())
    }

    async fn get_related_posts(
        &self,
        author: String,
        permlink: String
    ) -> RpcResult<Vec<DiscussionEntry>> {
        let category: Option<(String,)> =
            sqlx::query_as("SELECT category FROM hive_posts WHERE author = ?1 AND permlink = ?2")
                .bind(&author)
                .bind(&permlink)
                .fetch_optional(self.store.pool())
                .await
                .map_err(internal_error)?;
        let Some((category,)) = category else { return Ok(vec![]) };

        let rows: Vec<(i64, String, String, String, f64, String)> = sqlx::query_as(
            "SELECT c.post_id, p.author, p.permlink, c.title, c.payout, p.created_at \
             FROM hive_posts p JOIN hive_posts_cache c ON c.post_id = p.id \
             WHERE p.author = ?1 AND p.category = ?2 AND p.permlink != ?3 \
             AND p.is_deleted = 0 AND p.depth = 0 \
             ORDER BY p.created_at DESC, p.id DESC LIMIT ?4"
        )
        .bind(&author)
        .bind(&category)
        .bind(&permlink)
        .bind(RELATED_LIMIT)
        .fetch_all(self.store.pool())
        .await
        .map_err(internal_error)?;
        Ok(rows.into_iter().map(discussion_entry).collect())
    }

    async fn get_payout_stats(&self) -> RpcResult<PayoutStats> {
        let (total,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(payout), 0.0) FROM hive_posts_cache WHERE is_paidout = 1"
        )
        .fetch_one(self.store.pool())
        .await
        .map_err(internal_error)?;

        let cutoff = (chrono::Utc::now() - chrono::Duration::hours(24))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();
        let (last_24h,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(payout), 0.0) FROM hive_posts_cache \
             WHERE is_paidout = 1 AND payout_at > ?1"
        )
        .bind(&cutoff)
        .fetch_one(self.store.pool())
        .await
        .map_err(internal_error)?;

        Ok(PayoutStats { total, last_24h })
    }
}

fn feed_entry((post_id, author, permlink, created_at): (i64, String, String, String)) -> FeedEntry {
    FeedEntry { post_id, author, permlink, created_at }
}

fn discussion_entry(
    (post_id, author, permlink, title, payout, created_at): (i64, String, String, String, f64, String)
) -> DiscussionEntry {
    DiscussionEntry { post_id, author, permlink, title, payout, created_at }
}
