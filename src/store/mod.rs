//! Metrics store: one relational table, one row per sample.
//!
//! The collector only appends (`insert`), the query path only reads a
//! time range (`load_since`). Both backends share the column list and the
//! row decoder; they differ in DDL and pool setup.

pub mod mysql;
pub mod sqlite;

pub use mysql::MySqlStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{PersistenceError, StoreError};
use crate::sample::MetricSample;

pub const TABLE: &str = "system_metrics";

pub(crate) const INSERT_SQL: &str = r#"
    INSERT INTO system_metrics (timestamp, cpu_percent,
                                memory_total, memory_used, memory_free, memory_percent,
                                disk_total, disk_used, disk_free, disk_percent,
                                network_sent, network_recv)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub(crate) const SELECT_SINCE_SQL: &str = r#"
    SELECT timestamp, cpu_percent,
           memory_total, memory_used, memory_free, memory_percent,
           disk_total, disk_used, disk_free, disk_percent,
           network_sent, network_recv
    FROM system_metrics
    WHERE timestamp >= ?
    ORDER BY timestamp ASC, id ASC
"#;

pub(crate) const COUNT_SQL: &str = "SELECT COUNT(*) FROM system_metrics";

#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Append exactly one row.
    async fn insert(&self, sample: &MetricSample) -> Result<(), PersistenceError>;

    /// Every row with `timestamp >= start`, ascending by timestamp.
    async fn load_since(&self, start: NaiveDateTime) -> Result<Vec<MetricSample>, StoreError>;

    /// Total stored rows.
    async fn count(&self) -> Result<i64, StoreError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Open the backend selected by `config` and make sure the table exists.
pub async fn open(config: &StoreConfig) -> Result<Arc<dyn MetricsStore>, StoreError> {
    match &config.sqlite_path {
        Some(path) => Ok(Arc::new(SqliteStore::open(path, config.pool_size).await?)),
        None => Ok(Arc::new(MySqlStore::connect(config).await?)),
    }
}

// ─── Persister / Series Loader ───────────────────────────────────

/// Write one sample, bounded by `timeout`. No retry.
///
/// On timeout the in-flight insert is dropped, but the statement may
/// already have reached the server: a sample reported as
/// `PersistenceError::Timeout` can still end up stored. It is never
/// re-sent.
pub async fn persist(
    store: &dyn MetricsStore,
    sample: &MetricSample,
    timeout: Duration,
) -> Result<(), PersistenceError> {
    tokio::time::timeout(timeout, store.insert(sample))
        .await
        .map_err(|_| PersistenceError::Timeout(timeout))??;
    debug!(backend = store.backend(), timestamp = %sample.timestamp, "sample stored");
    Ok(())
}

/// Load the series starting at `start`, bounded by `timeout`.
pub async fn load_series(
    store: &dyn MetricsStore,
    start: NaiveDateTime,
    timeout: Duration,
) -> Result<Vec<MetricSample>, StoreError> {
    let rows = tokio::time::timeout(timeout, store.load_since(start))
        .await
        .map_err(|_| StoreError::Timeout(timeout))??;
    debug!(backend = store.backend(), %start, rows = rows.len(), "series loaded");
    Ok(rows)
}

// ─── Row conversion ──────────────────────────────────────────────

/// Byte counters as the signed 64-bit integers both backends store.
pub(crate) struct StoredCounters {
    pub memory_total: i64,
    pub memory_used: i64,
    pub memory_free: i64,
    pub disk_total: i64,
    pub disk_used: i64,
    pub disk_free: i64,
    pub network_sent: i64,
    pub network_recv: i64,
}

impl StoredCounters {
    pub fn from_sample(s: &MetricSample) -> Result<Self, PersistenceError> {
        Ok(Self {
            memory_total: to_i64("memory_total", s.memory_total)?,
            memory_used: to_i64("memory_used", s.memory_used)?,
            memory_free: to_i64("memory_free", s.memory_free)?,
            disk_total: to_i64("disk_total", s.disk_total)?,
            disk_used: to_i64("disk_used", s.disk_used)?,
            disk_free: to_i64("disk_free", s.disk_free)?,
            network_sent: to_i64("network_sent", s.network_sent)?,
            network_recv: to_i64("network_recv", s.network_recv)?,
        })
    }
}

fn to_i64(field: &'static str, value: u64) -> Result<i64, PersistenceError> {
    i64::try_from(value).map_err(|_| PersistenceError::OutOfRange { field, value })
}

/// Decode one selected row; `idx` is only used for error messages.
///
/// Any column that fails to decode is reported as `InvalidRow`: the store
/// answered, the data it returned is bad.
pub(crate) fn decode_row<'r, R>(idx: usize, row: &'r R) -> Result<MetricSample, StoreError>
where
    R: sqlx::Row,
    &'static str: sqlx::ColumnIndex<R>,
    NaiveDateTime: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    f64: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    i64: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
{
    let bytes = move |field: &'static str| -> Result<u64, StoreError> {
        let v: i64 = column(row, idx, field)?;
        u64::try_from(v).map_err(|_| StoreError::InvalidRow {
            row: idx,
            field,
            reason: format!("negative byte count {v}"),
        })
    };

    Ok(MetricSample {
        timestamp: column(row, idx, "timestamp")?,
        cpu_percent: column(row, idx, "cpu_percent")?,
        memory_total: bytes("memory_total")?,
        memory_used: bytes("memory_used")?,
        memory_free: bytes("memory_free")?,
        memory_percent: column(row, idx, "memory_percent")?,
        disk_total: bytes("disk_total")?,
        disk_used: bytes("disk_used")?,
        disk_free: bytes("disk_free")?,
        disk_percent: column(row, idx, "disk_percent")?,
        network_sent: bytes("network_sent")?,
        network_recv: bytes("network_recv")?,
    })
}

fn column<'r, R, T>(row: &'r R, idx: usize, field: &'static str) -> Result<T, StoreError>
where
    R: sqlx::Row,
    &'static str: sqlx::ColumnIndex<R>,
    T: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
{
    row.try_get(field).map_err(|e| StoreError::InvalidRow {
        row: idx,
        field,
        reason: e.to_string(),
    })
}
