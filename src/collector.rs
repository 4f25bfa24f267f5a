//! The collector loop: sample → persist → sleep, for the life of the process.
//!
//! Cycles are strictly sequential. A failed cycle is logged and dropped;
//! the loop never retries, never synthesizes a sample and never exits. The
//! sleep starts after the cycle finishes, so the configured interval is a
//! floor: a successful cycle adds the CPU measurement window on top of it.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::CollectorConfig;
use crate::metrics::{CycleRecord, ServiceMetrics};
use crate::sampler::{local_now, CounterReader, Sampler};
use crate::store::{self, MetricsStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    Stored,
    SamplingFailed,
    PersistFailed,
}

pub struct Collector<R> {
    sampler: Sampler<R>,
    store: Arc<dyn MetricsStore>,
    metrics: Arc<ServiceMetrics>,
    interval: Duration,
    persist_timeout: Duration,
}

impl<R: CounterReader> Collector<R> {
    pub fn new(
        reader: R,
        store: Arc<dyn MetricsStore>,
        metrics: Arc<ServiceMetrics>,
        config: &CollectorConfig,
    ) -> Self {
        Self {
            sampler: Sampler::new(reader, config.sample_timeout),
            store,
            metrics,
            interval: config.interval,
            persist_timeout: config.persist_timeout,
        }
    }

    /// Loop forever. Cancel by dropping the future.
    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs_f64(),
            backend = self.store.backend(),
            "collector started"
        );
        loop {
            self.run_cycle().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One sample-and-persist attempt. Never fails; the outcome says what
    /// happened.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let started = Instant::now();
        let started_at = local_now();

        let outcome = match self.sampler.sample().await {
            Err(e) => {
                warn!(error = %e, "sampling failed, skipping cycle");
                CycleOutcome::SamplingFailed
            }
            Ok(sample) => {
                match store::persist(self.store.as_ref(), &sample, self.persist_timeout).await {
                    Ok(()) => {
                        info!(
                            timestamp = %sample.timestamp,
                            cpu = sample.cpu_percent,
                            mem = sample.memory_percent,
                            disk = sample.disk_percent,
                            "sample stored"
                        );
                        CycleOutcome::Stored
                    }
                    Err(e) => {
                        warn!(error = %e, timestamp = %sample.timestamp, "persist failed, sample dropped");
                        CycleOutcome::PersistFailed
                    }
                }
            }
        };

        self.metrics.record_cycle(CycleRecord {
            started_at,
            outcome,
            duration: started.elapsed(),
        });
        outcome
    }
}
