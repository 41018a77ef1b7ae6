use sqlx::SqliteConnection;

/// Identity row for `(author, permlink)` lookups.
#[derive(Debug, Clone, Copy)]
pub struct PostRef {
    pub id:         i64,
    pub is_deleted: bool
}

/// Fields a reply inherits from its parent.
#[derive(Debug, Clone)]
pub struct ParentMeta {
    pub id:        i64,
    pub depth:     i32,
    pub category:  String,
    pub community: String
}

pub struct NewPost<'a> {
    pub author:     &'a str,
    pub permlink:   &'a str,
    pub parent_id:  Option<i64>,
    pub category:   &'a str,
    pub community:  &'a str,
    pub depth:      i32,
    pub is_valid:   bool,
    pub created_at: &'a str
}

pub async fn by_url(
    conn: &mut SqliteConnection,
    author: &str,
    permlink: &str
) -> Result<Option<PostRef>, sqlx::Error> {
    let row: Option<(i64, bool)> =
        sqlx::query_as("SELECT id, is_deleted FROM hive_posts WHERE author = ?1 AND permlink = ?2")
            .bind(author)
            .bind(permlink)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(|(id, is_deleted)| PostRef { id, is_deleted }))
}

pub async fn id_and_depth(
    conn: &mut SqliteConnection,
    author: &str,
    permlink: &str
) -> Result<Option<(i64, i32)>, sqlx::Error> {
    sqlx::query_as("SELECT id, depth FROM hive_posts WHERE author = ?1 AND permlink = ?2")
        .bind(author)
        .bind(permlink)
        .fetch_optional(conn)
        .await
}

pub async fn parent_meta(
    conn: &mut SqliteConnection,
    author: &str,
    permlink: &str
) -> Result<Option<ParentMeta>, sqlx::Error> {
    let row: Option<(i64, i32, String, String)> = sqlx::query_as(
        "SELECT id, depth, category, community FROM hive_posts \
         WHERE author = ?1 AND permlink = ?2"
    )
    .bind(author)
    .bind(permlink)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(id, depth, category, community)| ParentMeta { id, depth, category, community }))
}

pub async fn insert(conn: &mut SqliteConnection, post: &NewPost<'_>) -> Result<i64, sqlx::Error> {
    let res = sqlx::query(
        "INSERT INTO hive_posts (parent_id, author, permlink, category, community, depth, \
         is_valid, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
    )
    .bind(post.parent_id)
    .bind(post.author)
    .bind(post.permlink)
    .bind(post.category)
    .bind(post.community)
    .bind(post.depth)
    .bind(post.is_valid)
    .bind(post.created_at)
    .execute(conn)
    .await?;
    Ok(res.last_insert_rowid())
}

/// Re-activate a previously deleted post, keeping its id. `created_at` is
/// left as originally recorded.
pub async fn reinstate(
    conn: &mut SqliteConnection,
    id: i64,
    post: &NewPost<'_>
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE hive_posts SET is_deleted = 0, is_valid = ?2, parent_id = ?3, category = ?4, \
         community = ?5, depth = ?6 WHERE id = ?1"
    )
    .bind(id)
    .bind(post.is_valid)
    .bind(post.parent_id)
    .bind(post.category)
    .bind(post.community)
    .bind(post.depth)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn mark_deleted(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE hive_posts SET is_deleted = 1 WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn max_id(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(id), 0) FROM hive_posts")
        .fetch_one(conn)
        .await?;
    Ok(id)
}
