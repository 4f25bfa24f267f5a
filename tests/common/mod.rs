#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use parking_lot::Mutex;
use std::collections::VecDeque;

use hostwatch::error::{PersistenceError, SamplingError, StoreError};
use hostwatch::sampler::{CounterReader, HostCounters};
use hostwatch::store::MetricsStore;
use hostwatch::MetricSample;

pub const GIB: u64 = 1024 * 1024 * 1024;
pub const MIB: u64 = 1024 * 1024;

/// Vec-backed store that can be told to reject inserts.
#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<Vec<MetricSample>>,
    pub reject_inserts: Mutex<bool>,
}

#[async_trait]
impl MetricsStore for MemoryStore {
    async fn insert(&self, sample: &MetricSample) -> Result<(), PersistenceError> {
        if *self.reject_inserts.lock() {
            return Err(PersistenceError::Database(sqlx::Error::PoolClosed));
        }
        self.rows.lock().push(sample.clone());
        Ok(())
    }

    async fn load_since(&self, start: NaiveDateTime) -> Result<Vec<MetricSample>, StoreError> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .iter()
            .filter(|s| s.timestamp >= start)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.timestamp);
        Ok(rows)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.rows.lock().len() as i64)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// A store whose every call fails as if the pool were closed.
pub struct DownStore;

#[async_trait]
impl MetricsStore for DownStore {
    async fn insert(&self, _: &MetricSample) -> Result<(), PersistenceError> {
        Err(PersistenceError::Database(sqlx::Error::PoolClosed))
    }

    async fn load_since(&self, _: NaiveDateTime) -> Result<Vec<MetricSample>, StoreError> {
        Err(StoreError::Unavailable(sqlx::Error::PoolClosed))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable(sqlx::Error::PoolClosed))
    }

    fn backend(&self) -> &'static str {
        "down"
    }
}

/// Replays a fixed list of results, then keeps returning the last one.
pub struct ScriptedReader {
    script: Mutex<VecDeque<Result<HostCounters, String>>>,
}

impl ScriptedReader {
    pub fn new(script: Vec<Result<HostCounters, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl CounterReader for ScriptedReader {
    async fn read(&self) -> Result<HostCounters, SamplingError> {
        let mut script = self.script.lock();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        match next {
            Some(Ok(c)) => Ok(c),
            Some(Err(msg)) => Err(SamplingError::Read(msg)),
            None => Err(SamplingError::Read("script exhausted".into())),
        }
    }
}

pub fn counters(sent: u64) -> HostCounters {
    HostCounters {
        cpu_percent: 17.5,
        memory_total: 16 * GIB,
        memory_used: 4 * GIB,
        memory_free: 11 * GIB,
        disk_total: 200 * GIB,
        disk_free: 150 * GIB,
        network_sent: sent,
        network_recv: sent * 2,
    }
}

/// A sample `age` before `now`, with counters that grow 1 MiB per minute.
pub fn sample_before(now: NaiveDateTime, age: Duration) -> MetricSample {
    let minutes = (Duration::days(30) - age).num_minutes().max(0) as u64;
    MetricSample {
        timestamp: now - age,
        cpu_percent: 42.0,
        memory_total: 16 * GIB,
        memory_used: 8 * GIB,
        memory_free: 8 * GIB,
        memory_percent: 50.0,
        disk_total: 100 * GIB,
        disk_used: 25 * GIB,
        disk_free: 75 * GIB,
        disk_percent: 25.0,
        network_sent: minutes * MIB,
        network_recv: minutes * 2 * MIB,
    }
}
