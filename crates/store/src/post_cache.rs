use sqlx::SqliteConnection;

/// Denormalized display row the read side serves from.
#[derive(Debug, Clone, Default)]
pub struct CachedPost {
    pub post_id:    i64,
    pub author:     String,
    pub permlink:   String,
    pub title:      String,
    pub preview:    String,
    pub img_url:    String,
    pub payout:     f64,
    pub payout_at:  String,
    pub updated_at: String,
    pub is_paidout: bool,
    pub rshares:    i64,
    pub votes:      i64,
    /// Ranking scores for the trending and hot discussion listings.
    pub sc_trend:   f64,
    pub sc_hot:     f64
}

pub async fn is_empty(conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM hive_posts_cache LIMIT 1")
        .fetch_optional(conn)
        .await?;
    Ok(row.is_none())
}

pub async fn max_post_id(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(post_id), 0) FROM hive_posts_cache")
        .fetch_one(conn)
        .await?;
    Ok(id)
}

/// Live posts above the cache's high-water mark, in id order.
pub async fn select_missing(
    conn: &mut SqliteConnection,
    limit: i64
) -> Result<Vec<(i64, String, String)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, author, permlink FROM hive_posts \
         WHERE is_deleted = 0 \
         AND id > (SELECT COALESCE(MAX(post_id), 0) FROM hive_posts_cache) \
         ORDER BY id LIMIT ?1"
    )
    .bind(limit)
    .fetch_all(conn)
    .await
}

/// Posts whose payout window has closed as of `date` but are still
/// marked pending.
pub async fn select_paidout(
    conn: &mut SqliteConnection,
    date: &str
) -> Result<Vec<(i64, String, String)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT post_id, author, permlink FROM hive_posts_cache \
         WHERE is_paidout = 0 AND payout_at <= ?1"
    )
    .bind(date)
    .fetch_all(conn)
    .await
}

pub async fn upsert(conn: &mut SqliteConnection, post: &CachedPost) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO hive_posts_cache (post_id, author, permlink, title, preview, img_url, \
         payout, payout_at, updated_at, is_paidout, rshares, votes, sc_trend, sc_hot) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) \
         ON CONFLICT (post_id) DO UPDATE SET \
         title = excluded.title, preview = excluded.preview, img_url = excluded.img_url, \
         payout = excluded.payout, payout_at = excluded.payout_at, \
         updated_at = excluded.updated_at, is_paidout = excluded.is_paidout, \
         rshares = excluded.rshares, votes = excluded.votes, \
         sc_trend = excluded.sc_trend, sc_hot = excluded.sc_hot"
    )
    .bind(post.post_id)
    .bind(&post.author)
    .bind(&post.permlink)
    .bind(&post.title)
    .bind(&post.preview)
    .bind(&post.img_url)
    .bind(post.payout)
    .bind(&post.payout_at)
    .bind(&post.updated_at)
    .bind(post.is_paidout)
    .bind(post.rshares)
    .bind(post.votes)
    .bind(post.sc_trend)
    .bind(post.sc_hot)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete_post(conn: &mut SqliteConnection, post_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM hive_posts_cache WHERE post_id = ?1")
        .bind(post_id)
        .execute(conn)
        .await?;
    Ok(())
}

type CachedPostRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    f64,
    String,
    String,
    bool,
    i64,
    i64,
    f64,
    f64
);

pub async fn get(
    conn: &mut SqliteConnection,
    post_id: i64
) -> Result<Option<CachedPost>, sqlx::Error> {
    let row: Option<CachedPostRow> = sqlx::query_as(
        "SELECT post_id, author, permlink, title, preview, img_url, payout, payout_at, \
         updated_at, is_paidout, rshares, votes, sc_trend, sc_hot \
         FROM hive_posts_cache WHERE post_id = ?1"
    )
    .bind(post_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(
        |(
            post_id,
            author,
            permlink,
            title,
            preview,
            img_url,
            payout,
            payout_at,
            updated_at,
            is_paidout,
            rshares,
            votes,
            sc_trend,
            sc_hot
        )| CachedPost {
            post_id,
            author,
            permlink,
            title,
            preview,
            img_url,
            payout,
            payout_at,
            updated_at,
            is_paidout,
            rshares,
            votes,
            sc_trend,
            sc_hot
        }
    ))
}
