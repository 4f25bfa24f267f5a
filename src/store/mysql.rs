use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::Row;
use tracing::info;

use super::{decode_row, MetricsStore, StoredCounters, COUNT_SQL, INSERT_SQL, SELECT_SINCE_SQL};
use crate::config::StoreConfig;
use crate::error::{PersistenceError, StoreError};
use crate::sample::MetricSample;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS system_metrics (
        id             BIGINT AUTO_INCREMENT PRIMARY KEY,
        timestamp      DATETIME NOT NULL,
        cpu_percent    DOUBLE   NOT NULL,
        memory_total   BIGINT   NOT NULL,
        memory_used    BIGINT   NOT NULL,
        memory_free    BIGINT   NOT NULL,
        memory_percent DOUBLE   NOT NULL,
        disk_total     BIGINT   NOT NULL,
        disk_used      BIGINT   NOT NULL,
        disk_free      BIGINT   NOT NULL,
        disk_percent   DOUBLE   NOT NULL,
        network_sent   BIGINT   NOT NULL,
        network_recv   BIGINT   NOT NULL,
        INDEX idx_system_metrics_timestamp (timestamp)
    )
"#;

/// MySQL-backed store behind a bounded, process-wide pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            pool_size = config.pool_size,
            "connecting to MySQL"
        );

        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.database);
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl MetricsStore for MySqlStore {
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
        "mysql"
    }
}
