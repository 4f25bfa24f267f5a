//! `hostwatch check`: can we reach the store and read host counters?

use std::time::Duration;
use tracing::{error, info};

use crate::sampler::{CounterReader, Sampler};
use crate::store::{MetricsStore, TABLE};

#[derive(Debug, Default)]
pub struct CheckReport {
    pub rows: Option<i64>,
    pub store_error: Option<String>,
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
    pub disk_percent: Option<f64>,
    pub sampling_error: Option<String>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.store_error.is_none() && self.sampling_error.is_none()
    }

    /// One-line reason for a failed check, `None` when everything passed.
    pub fn failure(&self) -> Option<String> {
        if self.passed() {
            return None;
        }
        Some(format!(
            "check failed: store={} sampling={}",
            self.store_error.as_deref().unwrap_or("ok"),
            self.sampling_error.as_deref().unwrap_or("ok"),
        ))
    }
}

/// Count stored rows and take one sample without persisting it.
pub async fn run<R: CounterReader>(
    store: &dyn MetricsStore,
    sampler: &Sampler<R>,
    timeout: Duration,
) -> CheckReport {
    let mut report = CheckReport::default();

    match tokio::time::timeout(timeout, store.count()).await {
        Ok(Ok(rows)) => {
            info!(backend = store.backend(), table = TABLE, rows, "store reachable");
            report.rows = Some(rows);
        }
        Ok(Err(e)) => {
            error!(backend = store.backend(), error = %e, "store check failed");
            report.store_error = Some(e.to_string());
        }
        Err(_) => {
            error!(backend = store.backend(), ?timeout, "store check timed out");
            report.store_error = Some(format!("timed out after {timeout:?}"));
        }
    }

    sample_into(sampler, &mut report).await;
    report
}

/// Host counters only, for when the store could not be opened at all.
pub async fn run_sampling_only<R: CounterReader>(sampler: &Sampler<R>) -> CheckReport {
    let mut report = CheckReport::default();
    sample_into(sampler, &mut report).await;
    report
}

async fn sample_into<R: CounterReader>(sampler: &Sampler<R>, report: &mut CheckReport) {
    match sampler.sample().await {
        Ok(s) => {
            info!(
                cpu = s.cpu_percent,
                memory = s.memory_percent,
                disk = s.disk_percent,
                "host counters readable"
            );
            report.cpu_percent = Some(s.cpu_percent);
            report.memory_percent = Some(s.memory_percent);
            report.disk_percent = Some(s.disk_percent);
        }
        Err(e) => {
            error!(error = %e, "host counter check failed");
            report.sampling_error = Some(e.to_string());
        }
    }
}
