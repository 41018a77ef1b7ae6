/// Table DDL, applied idempotently at startup.
pub(crate) const TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS hive_blocks (
        num        INTEGER PRIMARY KEY,
        hash       TEXT    NOT NULL,
        prev       TEXT    NOT NULL,
        txs        INTEGER NOT NULL DEFAULT 0,
        created_at TEXT    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS hive_accounts (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        name       TEXT    NOT NULL UNIQUE,
        created_at TEXT    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS hive_posts (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        parent_id  INTEGER,
        author     TEXT    NOT NULL,
        permlink   TEXT    NOT NULL,
        category   TEXT    NOT NULL DEFAULT '',
        community  TEXT    NOT NULL DEFAULT '',
        depth      INTEGER NOT NULL DEFAULT 0,
        is_valid   INTEGER NOT NULL DEFAULT 1,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT    NOT NULL,
        UNIQUE (author, permlink)
    )",
    "CREATE TABLE IF NOT EXISTS hive_follows (
        follower   TEXT    NOT NULL,
        following  TEXT    NOT NULL,
        state      INTEGER NOT NULL DEFAULT 0,
        created_at TEXT    NOT NULL,
        PRIMARY KEY (follower, following)
    )",
    "CREATE TABLE IF NOT EXISTS hive_reblogs (
        account    TEXT    NOT NULL,
        post_id    INTEGER NOT NULL,
        created_at TEXT    NOT NULL,
        PRIMARY KEY (account, post_id)
    )",
    "CREATE TABLE IF NOT EXISTS hive_feed_cache (
        account    TEXT    NOT NULL,
        post_id    INTEGER NOT NULL,
        created_at TEXT    NOT NULL,
        PRIMARY KEY (account, post_id)
    )",
    "CREATE TABLE IF NOT EXISTS hive_posts_cache (
        post_id    INTEGER PRIMARY KEY,
        author     TEXT    NOT NULL,
        permlink   TEXT    NOT NULL,
        title      TEXT    NOT NULL DEFAULT '',
        preview    TEXT    NOT NULL DEFAULT '',
        img_url    TEXT    NOT NULL DEFAULT '',
        payout     REAL    NOT NULL DEFAULT 0,
        payout_at  TEXT    NOT NULL DEFAULT '',
        updated_at TEXT    NOT NULL DEFAULT '',
        is_paidout INTEGER NOT NULL DEFAULT 0,
        rshares    INTEGER NOT NULL DEFAULT 0,
        votes      INTEGER NOT NULL DEFAULT 0,
        sc_trend   REAL    NOT NULL DEFAULT 0,
        sc_hot     REAL    NOT NULL DEFAULT 0
    )"
];
