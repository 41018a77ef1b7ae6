use sqlx::SqliteConnection;

pub async fn insert(
    conn: &mut SqliteConnection,
    num: u32,
    hash: &str,
    prev: &str,
    txs: usize,
    created_at: &str
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO hive_blocks (num, hash, prev, txs, created_at) VALUES (?1, ?2, ?3, ?4, ?5)"
    )
    .bind(num as i64)
    .bind(hash)
    .bind(prev)
    .bind(txs as i64)
    .bind(created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn last_block_num(conn: &mut SqliteConnection) -> Result<u32, sqlx::Error> {
    let (num,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(num), 0) FROM hive_blocks")
        .fetch_one(conn)
        .await?;
    Ok(num as u32)
}
