use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::info;

use super::{decode_row, MetricsStore, StoredCounters, COUNT_SQL, INSERT_SQL, SELECT_SINCE_SQL};
use crate::error::{PersistenceError, StoreError};
use crate::sample::MetricSample;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS system_metrics (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp      TEXT    NOT NULL,
        cpu_percent    REAL    NOT NULL,
        memory_total   INTEGER NOT NULL,
        memory_used    INTEGER NOT NULL,
        memory_free    INTEGER NOT NULL,
        memory_percent REAL    NOT NULL,
        disk_total     INTEGER NOT NULL,
        disk_used      INTEGER NOT NULL,
        disk_free      INTEGER NOT NULL,
        disk_percent   REAL    NOT NULL,
        network_sent   INTEGER NOT NULL,
        network_recv   INTEGER NOT NULL
    )
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_system_metrics_timestamp ON system_metrics(timestamp)";

/// SQLite-backed store for single-host installs and tests.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file at `path`.
    pub async fn open(path: &Path, pool_size: u32) -> Result<Self, StoreError> {
        info!(path = %path.display(), pool_size, "opening SQLite store");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Unavailable(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// A private in-memory database.
    ///
    /// Each SQLite connection gets its own `:memory:` database, so the pool
    /// is pinned to one connection that never expires.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_INDEX).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl MetricsStore for SqliteStore {
    async fn insert(&self, s: &MetricSample) -> Result<(), PersistenceError> {
        let c = StoredCounters::from_sample(s)?;

        sqlx::query(INSERT_SQL)
            .bind(s.timestamp)
            .bind(s.cpu_percent)
            .bind(c.memory_total)
            .bind(c.memory_used)
            .bind(c.memory_free)
            .bind(s.memory_percent)
            .bind(c.disk_total)
            .bind(c.disk_used)
            .bind(c.disk_free)
            .bind(s.disk_percent)
            .bind(c.network_sent)
            .bind(c.network_recv)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn load_since(&self, start: NaiveDateTime) -> Result<Vec<MetricSample>, StoreError> {
        let rows = sqlx::query(SELECT_SINCE_SQL)
            .bind(start)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .enumerate()
            .map(|(i, row)| decode_row(i, row))
            .collect()
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query(COUNT_SQL).fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(sec: u32, sent: u64) -> MetricSample {
        MetricSample {
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(10, 0, sec)
                .unwrap(),
            cpu_percent: 37.5,
            memory_total: 16 * 1024 * 1024 * 1024,
            memory_used: 6 * 1024 * 1024 * 1024,
            memory_free: 9 * 1024 * 1024 * 1024,
            memory_percent: 37.5,
            disk_total: 500 * 1024 * 1024 * 1024,
            disk_used: 200 * 1024 * 1024 * 1024,
            disk_free: 300 * 1024 * 1024 * 1024,
            disk_percent: 40.0,
            network_sent: sent,
            network_recv: sent / 2,
        }
    }

    #[tokio::test]
    async fn insert_then_load_round_trips() {
        let store = SqliteStore::in_memory().await.unwrap();
        let s = sample(5, 123_456_789);

        store.insert(&s).await.unwrap();
        let rows = store.load_since(s.timestamp).await.unwrap();

        assert_eq!(rows, vec![s]);
    }

    #[tokio::test]
    async fn load_since_filters_and_orders() {
        let store = SqliteStore::in_memory().await.unwrap();
        for (sec, sent) in [(30, 3), (10, 1), (50, 5), (20, 2)] {
            store.insert(&sample(sec, sent)).await.unwrap();
        }

        let rows = store.load_since(sample(20, 0).timestamp).await.unwrap();
        let sent: Vec<u64> = rows.iter().map(|r| r.network_sent).collect();

        assert_eq!(sent, vec![2, 3, 5]);
        assert_eq!(store.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn duplicate_timestamps_are_kept() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.insert(&sample(1, 10)).await.unwrap();
        store.insert(&sample(1, 20)).await.unwrap();

        let rows = store.load_since(sample(0, 0).timestamp).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].network_sent, 10);
        assert_eq!(rows[1].network_sent, 20);
    }

    #[tokio::test]
    async fn empty_range_is_empty() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.insert(&sample(1, 10)).await.unwrap();
        let rows = store.load_since(sample(59, 0).timestamp).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn oversized_counter_is_rejected() {
        let store = SqliteStore::in_memory().await.unwrap();
        let err = store.insert(&sample(1, u64::MAX)).await.unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::OutOfRange { field: "network_sent", .. }
        ));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    async fn insert_raw(store: &SqliteStore, timestamp: &str, memory_total: i64) {
        sqlx::query(
            "INSERT INTO system_metrics (timestamp, cpu_percent, memory_total, memory_used,
                                         memory_free, memory_percent, disk_total, disk_used,
                                         disk_free, disk_percent, network_sent, network_recv)
             VALUES (?, 1.0, ?, 0, 0, 0.0, 0, 0, 0, 0.0, 0, 0)",
        )
        .bind(timestamp)
        .bind(memory_total)
        .execute(&store.pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn undecodable_column_is_an_invalid_row() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.insert(&sample(1, 10)).await.unwrap();
        insert_raw(&store, "zzz not a time", 1).await;

        let err = store.load_since(sample(0, 0).timestamp).await.unwrap_err();
        assert!(
            matches!(err, StoreError::InvalidRow { row: 1, field: "timestamp", .. }),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn negative_byte_count_is_an_invalid_row() {
        let store = SqliteStore::in_memory().await.unwrap();
        insert_raw(&store, "2024-05-01 10:00:09", -5).await;

        let err = store.load_since(sample(0, 0).timestamp).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidRow { row: 0, field: "memory_total", .. }
        ));
    }
}
