use sqlx::SqliteConnection;

pub async fn insert_ignore(
    conn: &mut SqliteConnection,
    account: &str,
    post_id: i64,
    created_at: &str
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR IGNORE INTO hive_feed_cache (account, post_id, created_at) VALUES (?1, ?2, ?3)"
    )
    .bind(account)
    .bind(post_id)
    .bind(created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Drop every feed entry for a post, across all accounts.
pub async fn delete_post(conn: &mut SqliteConnection, post_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM hive_feed_cache WHERE post_id = ?1")
        .bind(post_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Drop one account's feed entry for a post.
pub async fn delete_entry(
    conn: &mut SqliteConnection,
    account: &str,
    post_id: i64
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM hive_feed_cache WHERE account = ?1 AND post_id = ?2")
        .bind(account)
        .bind(post_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn exists(
    conn: &mut SqliteConnection,
    account: &str,
    post_id: i64
) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM hive_feed_cache WHERE account = ?1 AND post_id = ?2")
            .bind(account)
            .bind(post_id)
            .fetch_optional(conn)
            .await?;
    Ok(row.is_some())
}

/// Derive the feed cache from scratch: every live root post under its
/// author, every reblog of a live root post under the reblogger.
/// Idempotent by construction.
pub async fn rebuild(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM hive_feed_cache")
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO hive_feed_cache (account, post_id, created_at) \
         SELECT author, id, created_at FROM hive_posts WHERE depth = 0 AND is_deleted = 0"
    )
    .execute(&mut *conn)
    .await?;
    sqlx::query(
        "INSERT OR IGNORE INTO hive_feed_cache (account, post_id, created_at) \
         SELECT r.account, r.post_id, r.created_at FROM hive_reblogs r \
         JOIN hive_posts p ON p.id = r.post_id WHERE p.is_deleted = 0"
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}
