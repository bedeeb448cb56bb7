//! SQLite-backed session store.
//!
//! One table, `session_kv (key, value, expires_at)`, with `expires_at` as a unix timestamp in
//! seconds. Expired rows read as absent and are removed by [`SqliteKvStore::purge_expired`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use tracing::{debug, info};

use crate::error::Result;
use crate::store::KvStore;

#[derive(Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    /// Opens (creating if missing) the database file and ensures the table exists.
    pub async fn new(database_path: &str) -> Result<Self> {
        info!("Initializing session SQLite pool: {}", database_path);

        let options = SqliteConnectOptions::new()
            .create_if_missing(true)
            .filename(database_path);
        let pool = SqlitePool::connect_with(options).await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_session_kv_expires_at ON session_kv(expires_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes expired rows; returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session_kv WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;

        info!("Purged {} expired session values", result.rows_affected());
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> =
            sqlx::query_as("SELECT value FROM session_kv WHERE key = ? AND expires_at > ?")
                .bind(key)
                .bind(Utc::now().timestamp())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| r.0))
    }

    async fn set_with_expiry_then_get(
        &self,
        key: &str,
        value: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Vec<u8>>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO session_kv (key, value, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at.timestamp())
        .execute(&mut *tx)
        .await?;

        let row: Option<(Vec<u8>,)> =
            sqlx::query_as("SELECT value FROM session_kv WHERE key = ? AND expires_at > ?")
                .bind(key)
                .bind(Utc::now().timestamp())
                .fetch_optional(&mut *tx)
                .await?;

        tx.commit().await?;

        debug!(key = %key, expires_at = %expires_at, "session value stored");
        Ok(row.map(|r| r.0))
    }
}
