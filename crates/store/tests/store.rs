//! Gateway-level behavior: schema bootstrap, upsert and insert-or-ignore
//! spellings, and transaction scoping.

use hivemind_store::{accounts, blocks, feed_cache, follows, posts, reblogs, Store};

async fn test_store() -> Store {
    let store = Store::in_memory().await.unwrap();
    store.ensure_schema().await.unwrap();
    store
}

#[tokio::test]
async fn schema_bootstrap_is_idempotent() {
    let store = Store::in_memory().await.unwrap();
    assert!(!store.has_schema().await.unwrap());
    store.ensure_schema().await.unwrap();
    assert!(store.has_schema().await.unwrap());
    store.ensure_schema().await.unwrap();
    assert!(store.has_schema().await.unwrap());
}

#[tokio::test]
async fn last_block_is_zero_on_empty_db() {
    let store = test_store().await;
    assert_eq!(store.db_last_block().await.unwrap(), 0);

    let mut conn = store.conn().await.unwrap();
    blocks::insert(&mut conn, 7, "hash7", "hash6", 3, "2016-03-24T16:05:00")
        .await
        .unwrap();
    drop(conn);
    assert_eq!(store.db_last_block().await.unwrap(), 7);
}

#[tokio::test]
async fn follow_upsert_keeps_one_row_per_pair() {
    let store = test_store().await;
    let mut conn = store.conn().await.unwrap();

    follows::upsert(&mut conn, "carol", "dave", 1, "t0").await.unwrap();
    follows::upsert(&mut conn, "carol", "dave", 2, "t1").await.unwrap();
    follows::upsert(&mut conn, "carol", "dave", 0, "t2").await.unwrap();

    assert_eq!(follows::state(&mut conn, "carol", "dave").await.unwrap(), Some(0));
    drop(conn);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM hive_follows")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);

    // the original timestamp survives state changes
    let (created,): (String,) =
        sqlx::query_as("SELECT created_at FROM hive_follows WHERE follower = 'carol'")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(created, "t0");
}

#[tokio::test]
async fn reblog_and_feed_inserts_ignore_duplicates() {
    let store = test_store().await;
    let mut conn = store.conn().await.unwrap();

    reblogs::insert_ignore(&mut conn, "eve", 1, "t0").await.unwrap();
    reblogs::insert_ignore(&mut conn, "eve", 1, "t1").await.unwrap();
    feed_cache::insert_ignore(&mut conn, "eve", 1, "t0").await.unwrap();
    feed_cache::insert_ignore(&mut conn, "eve", 1, "t1").await.unwrap();
    drop(conn);

    for table in ["hive_reblogs", "hive_feed_cache"] {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1, "{table}");
    }
}

#[tokio::test]
async fn reblog_delete_removes_at_most_one_row() {
    let store = test_store().await;
    let mut conn = store.conn().await.unwrap();

    reblogs::insert_ignore(&mut conn, "eve", 1, "t0").await.unwrap();
    reblogs::insert_ignore(&mut conn, "eve", 2, "t0").await.unwrap();
    reblogs::delete_one(&mut conn, "eve", 1).await.unwrap();

    assert!(!reblogs::exists(&mut conn, "eve", 1).await.unwrap());
    assert!(reblogs::exists(&mut conn, "eve", 2).await.unwrap());
}

#[tokio::test]
async fn post_identity_is_stable_across_delete_and_reinstate() {
    let store = test_store().await;
    let mut conn = store.conn().await.unwrap();

    let new = posts::NewPost {
        author:     "alice",
        permlink:   "hello",
        parent_id:  None,
        category:   "life",
        community:  "alice",
        depth:      0,
        is_valid:   true,
        created_at: "t0"
    };
    let id = posts::insert(&mut conn, &new).await.unwrap();

    posts::mark_deleted(&mut conn, id).await.unwrap();
    let post = posts::by_url(&mut conn, "alice", "hello").await.unwrap().unwrap();
    assert!(post.is_deleted);
    assert_eq!(post.id, id);

    posts::reinstate(&mut conn, id, &new).await.unwrap();
    let post = posts::by_url(&mut conn, "alice", "hello").await.unwrap().unwrap();
    assert!(!post.is_deleted);
    assert_eq!(post.id, id);
}

#[tokio::test]
async fn rolled_back_transaction_leaves_no_trace() {
    let store = test_store().await;

    let mut tx = store.begin().await.unwrap();
    accounts::register(&mut tx, "alice", "t0").await.unwrap();
    blocks::insert(&mut tx, 1, "h1", "h0", 0, "t0").await.unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(store.db_last_block().await.unwrap(), 0);
    let mut conn = store.conn().await.unwrap();
    assert!(accounts::id_by_name(&mut conn, "alice").await.unwrap().is_none());
}
