use sqlx::SqliteConnection;

pub async fn insert_ignore(
    conn: &mut SqliteConnection,
    account: &str,
    post_id: i64,
    created_at: &str
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR IGNORE INTO hive_reblogs (account, post_id, created_at) VALUES (?1, ?2, ?3)"
    )
    .bind(account)
    .bind(post_id)
    .bind(created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Remove the reblog row for `(account, post_id)`; at most one row goes.
pub async fn delete_one(
    conn: &mut SqliteConnection,
    account: &str,
    post_id: i64
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "DELETE FROM hive_reblogs WHERE rowid IN \
         (SELECT rowid FROM hive_reblogs WHERE account = ?1 AND post_id = ?2 LIMIT 1)"
    )
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
        sqlx::query_as("SELECT 1 FROM hive_reblogs WHERE account = ?1 AND post_id = ?2")
            .bind(account)
            .bind(post_id)
            .fetch_optional(conn)
            .await?;
    Ok(row.is_some())
}
