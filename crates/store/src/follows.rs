use sqlx::SqliteConnection;

/// Upsert the follow state for `(follower, following)`. The timestamp is
/// recorded on first insert only; a state change keeps the original row.
pub async fn upsert(
    conn: &mut SqliteConnection,
    follower: &str,
    following: &str,
    state: i32,
    created_at: &str
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO hive_follows (follower, following, state, created_at) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (follower, following) DO UPDATE SET state = excluded.state"
    )
    .bind(follower)
    .bind(following)
    .bind(state)
    .bind(created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn state(
    conn: &mut SqliteConnection,
    follower: &str,
    following: &str
) -> Result<Option<i32>, sqlx::Error> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT state FROM hive_follows WHERE follower = ?1 AND following = ?2")
            .bind(follower)
            .bind(following)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(|(state,)| state))
}
