//! Typed SQL gateway over the indexer's tables. Writes that belong to one
//! block transaction thread a single [`SqliteConnection`] through the
//! entity modules; reads outside transactions go through the pool.

use std::str::FromStr;

use sqlx::{
    pool::PoolConnection,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqlitePool, Transaction
};

pub mod accounts;
pub mod blocks;
pub mod feed_cache;
pub mod follows;
pub mod post_cache;
pub mod posts;
pub mod reblogs;
mod schema;

pub use sqlx::SqliteConnection;

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool
}

impl Store {
    /// Open (and create if missing) the database at `url`.
    pub async fn open(url: &str) -> Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    /// A private in-memory database. The pool is pinned to one connection
    /// since every sqlite `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn conn(&self) -> Result<PoolConnection<Sqlite>, sqlx::Error> {
        self.pool.acquire().await
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Whether the schema has been created in this database.
    pub async fn has_schema(&self) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'hive_blocks'"
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for ddl in schema::TABLES {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Highest block number applied so far, 0 when the database is empty.
    pub async fn db_last_block(&self) -> Result<u32, sqlx::Error> {
        let mut conn = self.conn().await?;
        blocks::last_block_num(&mut conn).await
    }
}
