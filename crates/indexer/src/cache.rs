//! Post-cache and feed-cache maintenance: filling rows the projector has
//! not cached yet, refreshing edited posts from the dirty set, and
//! re-rendering posts whose payout window closed.

use hivemind_chain::{ChainAdapter, PostContent};
use hivemind_store::{
    feed_cache,
    post_cache::{self, CachedPost},
    posts, SqliteConnection, Store
};
use hivemind_types::DirtySet;
use tracing::info;

use crate::IndexerError;

/// Missing-fill batch size, in post ids.
const MISSING_BATCH: i64 = 1_000_000;

const TITLE_MAX: usize = 255;
const PREVIEW_MAX: usize = 1024;
const IMG_URL_MAX: usize = 512;

/// Time decay for the trending and hot rankings, in seconds of creation
/// time per unit of score.
const TREND_TIMESCALE: f64 = 480_000.0;
const HOT_TIMESCALE: f64 = 10_000.0;

pub type PostTuple = (i64, String, String);

/// Resolve dirty urls to `(id, author, permlink)` tuples, skipping posts
/// deleted since they were touched. A url that resolves to nothing means
/// the store no longer matches the applied block stream.
pub async fn urls_to_tuples(
    conn: &mut SqliteConnection,
    dirty: &DirtySet
) -> Result<Vec<PostTuple>, IndexerError> {
    let mut tuples = Vec::with_capacity(dirty.len());
    for (author, permlink) in dirty {
        match posts::by_url(conn, author, permlink).await? {
            None => {
                return Err(IndexerError::Integrity(format!(
                    "dirty post not found: {author}/{permlink}"
                )))
            }
            Some(post) if post.is_deleted => continue,
            Some(post) => tuples.push((post.id, author.clone(), permlink.clone()))
        }
    }
    Ok(tuples)
}

/// Refresh one batch of posts from the upstream and overwrite their cache
/// rows. `date` pins `updated_at`; without it the upstream's last-update
/// timestamp is used.
pub async fn update_posts_batch(
    conn: &mut SqliteConnection,
    adapter: &dyn ChainAdapter,
    tuples: &[PostTuple],
    date: Option<&str>
) -> Result<(), IndexerError> {
    for (id, author, permlink) in tuples {
        let row = match adapter.get_content(author, permlink).await? {
            Some(content) => cached_post_row(*id, author, permlink, &content, date),
            // upstream no longer serves it; keep a shell row so the
            // missing-fill pass converges
            None => CachedPost {
                post_id: *id,
                author: author.clone(),
                permlink: permlink.clone(),
                updated_at: date.unwrap_or_default().to_string(),
                ..Default::default()
            }
        };
        post_cache::upsert(conn, &row).await?;
    }
    Ok(())
}

/// Fill the gap between the newest post and the newest cached post, in
/// id order, one bounded batch per transaction.
pub async fn cache_missing_posts(
    store: &Store,
    adapter: &dyn ChainAdapter
) -> Result<(), IndexerError> {
    let missing = {
        let mut conn = store.conn().await?;
        posts::max_id(&mut conn).await? - post_cache::max_post_id(&mut conn).await?
    };
    info!(target: "sync", missing, "missing post cache entries");
    if missing <= 0 {
        return Ok(())
    }

    loop {
        let mut tx = store.begin().await?;
        let batch = post_cache::select_missing(&mut tx, MISSING_BATCH).await?;
        if batch.is_empty() {
            break
        }
        update_posts_batch(&mut tx, adapter, &batch, None).await?;
        tx.commit().await?;
    }
    Ok(())
}

/// Derive the feed cache from the posts and reblogs tables. Safe to call
/// any number of times.
pub async fn rebuild_feed_cache(store: &Store) -> Result<(), IndexerError> {
    info!(target: "sync", "rebuilding feed cache");
    let mut tx = store.begin().await?;
    feed_cache::rebuild(&mut tx).await?;
    tx.commit().await?;
    Ok(())
}

fn cached_post_row(
    id: i64,
    author: &str,
    permlink: &str,
    content: &PostContent,
    date: Option<&str>
) -> CachedPost {
    // the upstream parks paid-out posts on the epoch sentinel
    let is_paidout = content.cashout_time.starts_with("1969");
    let payout = if is_paidout {
        parse_amount(&content.total_payout_value) + parse_amount(&content.curator_payout_value)
    } else {
        parse_amount(&content.pending_payout_value)
    };
    let payout_at = if is_paidout { &content.last_payout } else { &content.cashout_time };

    let rshares = content.rshares();
    let created_ts = parse_timestamp(&content.created);

    CachedPost {
        post_id: id,
        author: author.to_string(),
        permlink: permlink.to_string(),
        title: truncate(&content.title, TITLE_MAX),
        preview: truncate(&content.body, PREVIEW_MAX),
        img_url: truncate(&thumbnail(&content.json_metadata), IMG_URL_MAX),
        payout,
        payout_at: payout_at.clone(),
        updated_at: date.unwrap_or(&content.last_update).to_string(),
        is_paidout,
        rshares,
        votes: content.net_votes,
        sc_trend: score(rshares, created_ts, TREND_TIMESCALE),
        sc_hot: score(rshares, created_ts, HOT_TIMESCALE)
    }
}

/// Ranking score: log-damped vote weight plus a linear recency term, so
/// newer posts outrank older ones of equal weight.
fn score(rshares: i64, created_ts: i64, timescale: f64) -> f64 {
    let mod_score = rshares as f64 / 10_000_000.0;
    let order = mod_score.abs().max(1.0).log10();
    let sign = if mod_score > 0.0 { 1.0 } else { -1.0 };
    sign * order + created_ts as f64 / timescale
}

/// Seconds since the epoch for an upstream ISO-8601 timestamp; 0 when the
/// field is absent or off-format.
fn parse_timestamp(timestamp: &str) -> i64 {
    chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

/// Leading decimal of an asset string such as `"1.234 SBD"`.
fn parse_amount(asset: &str) -> f64 {
    asset
        .split_whitespace()
        .next()
        .and_then(|amount| amount.parse().ok())
        .unwrap_or(0.0)
}

fn thumbnail(json_metadata: &str) -> String {
    serde_json::from_str::<serde_json::Value>(json_metadata)
        .ok()
        .and_then(|md| {
            md.get("image")?
                .get(0)?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_default()
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_parse_leading_decimal() {
        assert_eq!(parse_amount("1.234 SBD"), 1.234);
        assert_eq!(parse_amount("0.000 SBD"), 0.0);
        assert_eq!(parse_amount("garbage"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
    }

    #[test]
    fn thumbnail_survives_any_metadata_shape() {
        assert_eq!(thumbnail(r#"{"image":["https://x/y.png"]}"#), "https://x/y.png");
        assert_eq!(thumbnail(r#"{"image":[]}"#), "");
        assert_eq!(thumbnail("not json"), "");
        assert_eq!(thumbnail(r#"{"image":"flat"}"#), "");
    }

    #[test]
    fn paidout_rows_use_final_payout() {
        let content = PostContent {
            cashout_time: "1969-12-31T23:59:59".into(),
            last_payout: "2016-08-24T16:05:00".into(),
            total_payout_value: "10.000 SBD".into(),
            curator_payout_value: "2.500 SBD".into(),
            pending_payout_value: "0.000 SBD".into(),
            ..Default::default()
        };
        let row = cached_post_row(1, "alice", "hello", &content, None);
        assert!(row.is_paidout);
        assert_eq!(row.payout, 12.5);
        assert_eq!(row.payout_at, "2016-08-24T16:05:00");
    }

    #[test]
    fn pending_rows_track_cashout_window() {
        let content = PostContent {
            cashout_time: "2016-04-24T16:05:00".into(),
            pending_payout_value: "3.210 SBD".into(),
            ..Default::default()
        };
        let row = cached_post_row(1, "alice", "hello", &content, Some("2016-03-30T00:00:00"));
        assert!(!row.is_paidout);
        assert_eq!(row.payout, 3.21);
        assert_eq!(row.payout_at, "2016-04-24T16:05:00");
        assert_eq!(row.updated_at, "2016-03-30T00:00:00");
    }

    #[test]
    fn scores_favor_votes_and_recency() {
        let ts = parse_timestamp("2016-03-24T16:05:00");
        assert!(ts > 0);

        // more rshares at the same age ranks higher
        assert!(score(1_000_000_000, ts, TREND_TIMESCALE) > score(10_000_000, ts, TREND_TIMESCALE));
        // same rshares, newer post ranks higher
        assert!(score(10_000_000, ts + 3600, TREND_TIMESCALE) > score(10_000_000, ts, TREND_TIMESCALE));
        // heavily downvoted posts score below neutral ones
        assert!(score(-1_000_000_000, ts, TREND_TIMESCALE) < score(0, ts, TREND_TIMESCALE));
    }

    #[test]
    fn unparsable_created_stamp_degrades_to_epoch() {
        assert_eq!(parse_timestamp(""), 0);
        assert_eq!(parse_timestamp("not a date"), 0);
    }
}
