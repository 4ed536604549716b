//! SQLite batch store backed by sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quotefeed_common::{Batch, BatchId, Quote};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::error::{StoreError, StoreResult};
use crate::traits::BatchStore;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS batches (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        created_at TEXT NOT NULL,
        quote_count INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS quotes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        batch_id INTEGER NOT NULL REFERENCES batches(id),
        source TEXT NOT NULL,
        buy_price REAL NOT NULL,
        sell_price REAL NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_quotes_batch_id ON quotes(batch_id)",
];

/// Pool settings for a file or in-memory database.
///
/// Each in-memory connection is its own database, so the single connection
/// is pinned open for the life of the pool.
fn pool_options(in_memory: bool) -> SqlitePoolOptions {
    if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(4)
    }
}

/// SQLite-backed batch store.
///
/// Batches get an `AUTOINCREMENT` id, so ids are never reused and the
/// maximum id is always the latest batch.
pub struct SqliteBatchStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl SqliteBatchStore {
    /// Connect to a SQLite database and create the schema if needed.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite URL, e.g. `sqlite://database.sqlite` or `sqlite::memory:`
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = pool_options(in_memory).connect_with(options).await?;

        let store = Self::from_pool(pool);
        store.init_schema().await?;

        info!(url = %url, "Connected to SQLite batch store");
        Ok(store)
    }

    /// Wrap an existing pool. The schema is not created.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    /// Create tables and indexes if they do not exist.
    pub async fn init_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl BatchStore for SqliteBatchStore {
    #[instrument(skip(self, quotes), fields(quotes = quotes.len()))]
    async fn append_batch(&self, quotes: &[Quote]) -> StoreResult<Batch> {
        if quotes.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        let _guard = self.write_lock.lock().await;
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        let batch_id = sqlx::query("INSERT INTO batches (created_at, quote_count) VALUES (?, ?)")
            .bind(created_at)
            .bind(quotes.len() as i64)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        for quote in quotes {
            sqlx::query(
                "INSERT INTO quotes (batch_id, source, buy_price, sell_price, created_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(batch_id)
            .bind(&quote.source)
            .bind(quote.buy_price)
            .bind(quote.sell_price)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(batch_id, quotes = quotes.len(), "Batch committed");

        Batch::new(BatchId::new(batch_id), created_at, quotes.to_vec())
            .ok_or(StoreError::EmptyBatch)
    }

    async fn latest_batch(&self) -> StoreResult<Option<Batch>> {
        // Both steps read from one transaction snapshot.
        let mut tx = self.pool.begin().await?;

        let head = sqlx::query("SELECT id, created_at FROM batches ORDER BY id DESC LIMIT 1")
            .fetch_optional(&mut *tx)
            .await?;

        let head = match head {
            Some(row) => row,
            None => {
                tx.commit().await?;
                debug!("No batch committed yet");
                return Ok(None);
            }
        };

        let batch_id: i64 = head.try_get("id")?;
        let created_at: DateTime<Utc> = head.try_get("created_at")?;

        let rows = sqlx::query(
            "SELECT source, buy_price, sell_price FROM quotes WHERE batch_id = ? ORDER BY id",
        )
        .bind(batch_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let quotes = rows
            .iter()
            .map(|row| -> Result<Quote, sqlx::Error> {
                Ok(Quote {
                    source: row.try_get("source")?,
                    buy_price: row.try_get("buy_price")?,
                    sell_price: row.try_get("sell_price")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let batch = Batch::new(BatchId::new(batch_id), created_at, quotes)
            .ok_or_else(|| StoreError::Corrupt(format!("batch {} has no quotes", batch_id)))?;

        debug!(batch_id, quotes = batch.len(), "Read latest batch");
        Ok(Some(batch))
    }

    async fn batch_count(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM batches")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn memory_store() -> SqliteBatchStore {
        SqliteBatchStore::connect("sqlite::memory:").await.unwrap()
    }

    fn scenario_quotes() -> Vec<Quote> {
        vec![
            Quote::new("a", 900.0, 905.0).unwrap(),
            Quote::new("b", 902.0, 906.0).unwrap(),
        ]
    }

    #[test]
    fn test_in_memory_pool_never_recycles_its_connection() {
        let options = pool_options(true);

        assert_eq!(options.get_max_connections(), 1);
        assert_eq!(options.get_min_connections(), 1);
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);
    }

    #[test]
    fn test_file_pool_allows_concurrent_readers() {
        assert_eq!(pool_options(false).get_max_connections(), 4);
    }

    #[tokio::test]
    async fn test_in_memory_store_keeps_its_connection_open() {
        let store = memory_store().await;
        let written = store.append_batch(&scenario_quotes()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        let latest = store.latest_batch().await.unwrap().unwrap();
        assert_eq!(latest.id, written.id);
        assert_eq!(store.pool().size(), 1);
    }

    #[tokio::test]
    async fn test_cold_start_has_no_batch() {
        let store = memory_store().await;

        assert!(store.latest_batch().await.unwrap().is_none());
        assert_eq!(store.batch_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_append_then_latest_returns_same_set() {
        let store = memory_store().await;
        let written = store.append_batch(&scenario_quotes()).await.unwrap();

        let latest = store.latest_batch().await.unwrap().unwrap();

        assert_eq!(latest.id, written.id);
        assert_eq!(latest.created_at, written.created_at);
        assert_eq!(latest.quotes, scenario_quotes());
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let store = memory_store().await;

        let result = store.append_batch(&[]).await;

        assert!(matches!(result, Err(StoreError::EmptyBatch)));
        assert_eq!(store.batch_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_latest_batch_is_idempotent() {
        let store = memory_store().await;
        store.append_batch(&scenario_quotes()).await.unwrap();

        let first = store.latest_batch().await.unwrap();
        let second = store.latest_batch().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_latest_only_returns_newest_rows() {
        let store = memory_store().await;
        store.append_batch(&scenario_quotes()).await.unwrap();
        let newer = vec![Quote::new("c", 950.0, 960.0).unwrap()];
        let second = store.append_batch(&newer).await.unwrap();

        let latest = store.latest_batch().await.unwrap().unwrap();

        assert_eq!(latest.id, second.id);
        assert_eq!(latest.quotes, newer);
        assert_eq!(store.batch_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_data_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("quotes.sqlite").display());

        let written = {
            let store = SqliteBatchStore::connect(&url).await.unwrap();
            let batch = store.append_batch(&scenario_quotes()).await.unwrap();
            store.pool().close().await;
            batch
        };

        let reopened = SqliteBatchStore::connect(&url).await.unwrap();
        let latest = reopened.latest_batch().await.unwrap().unwrap();

        assert_eq!(latest.id, written.id);
        assert_eq!(latest.len(), 2);
    }

    #[tokio::test]
    async fn test_readers_never_see_partial_batch() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("quotes.sqlite").display());
        let store = Arc::new(SqliteBatchStore::connect(&url).await.unwrap());

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..20 {
                    let offset = i as f64;
                    let quotes = vec![
                        Quote::new("a", 900.0 + offset, 905.0 + offset).unwrap(),
                        Quote::new("b", 902.0 + offset, 906.0 + offset).unwrap(),
                        Quote::new("c", 901.0 + offset, 907.0 + offset).unwrap(),
                    ];
                    store.append_batch(&quotes).await.unwrap();
                }
            })
        };

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    if let Some(batch) = store.latest_batch().await.unwrap() {
                        assert_eq!(batch.len(), 3);
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();

        assert_eq!(store.batch_count().await.unwrap(), 20);
    }
}
