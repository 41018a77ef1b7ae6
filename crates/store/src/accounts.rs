use sqlx::SqliteConnection;

pub async fn id_by_name(
    conn: &mut SqliteConnection,
    name: &str
) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM hive_accounts WHERE name = ?1 LIMIT 1")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|(id,)| id))
}

pub async fn register(
    conn: &mut SqliteConnection,
    name: &str,
    created_at: &str
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO hive_accounts (name, created_at) VALUES (?1, ?2)")
        .bind(name)
        .bind(created_at)
        .execute(conn)
        .await?;
    Ok(())
}
