//! Host counter reading and sample assembly.
//!
//! `CounterReader` is the capability the collector depends on; the
//! production implementation is `SysinfoReader`. `Sampler` wraps any reader
//! with a timeout and stamps the result into a `MetricSample`.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, Timelike};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Disks, Networks, System};

use crate::error::SamplingError;
use crate::sample::{percent_of, MetricSample};

/// Raw counters as the host reports them, before any derivation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostCounters {
    pub cpu_percent: f64,
    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_free: u64,
    pub disk_total: u64,
    pub disk_free: u64,
    pub network_sent: u64,
    pub network_recv: u64,
}

/// Reads instantaneous and cumulative OS counters.
///
/// Implementations may block for their CPU measurement window; the
/// returned future resolves only once the whole read is complete.
#[async_trait]
pub trait CounterReader: Send + Sync {
    async fn read(&self) -> Result<HostCounters, SamplingError>;
}

// ─── sysinfo-backed reader ───────────────────────────────────────

/// Reads counters through `sysinfo`.
///
/// CPU load is averaged over `cpu_window`: the reader refreshes CPU times,
/// sleeps for the window on a blocking thread, then refreshes again.
pub struct SysinfoReader {
    system: Arc<Mutex<System>>,
    cpu_window: Duration,
}

impl SysinfoReader {
    pub fn new(cpu_window: Duration) -> Self {
        // sysinfo needs at least this long between two CPU refreshes
        let cpu_window = cpu_window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        Self {
            system: Arc::new(Mutex::new(System::new())),
            cpu_window,
        }
    }
}

#[async_trait]
impl CounterReader for SysinfoReader {
    async fn read(&self) -> Result<HostCounters, SamplingError> {
        let system = self.system.clone();
        let window = self.cpu_window;

        tokio::task::spawn_blocking(move || read_blocking(&mut system.lock(), window))
            .await
            .map_err(|e| SamplingError::Task(e.to_string()))?
    }
}

fn read_blocking(sys: &mut System, cpu_window: Duration) -> Result<HostCounters, SamplingError> {
    sys.refresh_cpu();
    std::thread::sleep(cpu_window);
    sys.refresh_cpu();
    let cpu_percent = sys.global_cpu_info().cpu_usage() as f64;

    sys.refresh_memory();
    let memory_total = sys.total_memory();
    if memory_total == 0 {
        return Err(SamplingError::Read("total memory reported as 0".into()));
    }

    let disks = Disks::new_with_refreshed_list();
    let root = disks
        .iter()
        .find(|d| d.mount_point() == Path::new("/"))
        .ok_or_else(|| SamplingError::RootDiskMissing(disks.len()))?;

    let networks = Networks::new_with_refreshed_list();
    let (network_sent, network_recv) = networks
        .iter()
        .fold((0u64, 0u64), |(tx, rx), (_, data)| {
            (
                tx.saturating_add(data.total_transmitted()),
                rx.saturating_add(data.total_received()),
            )
        });

    Ok(HostCounters {
        cpu_percent,
        memory_total,
        memory_used: sys.used_memory(),
        memory_free: sys.free_memory(),
        disk_total: root.total_space(),
        disk_free: root.available_space(),
        network_sent,
        network_recv,
    })
}

// ─── Sampler ─────────────────────────────────────────────────────

/// Turns one counter read into one `MetricSample`.
pub struct Sampler<R> {
    reader: R,
    timeout: Duration,
}

impl<R: CounterReader> Sampler<R> {
    pub fn new(reader: R, timeout: Duration) -> Self {
        Self { reader, timeout }
    }

    /// Capture a snapshot stamped with the local clock at call time.
    ///
    /// All-or-nothing: any failed read, including a timeout, yields an
    /// error and no partial sample.
    pub async fn sample(&self) -> Result<MetricSample, SamplingError> {
        let timestamp = local_now();

        let counters = tokio::time::timeout(self.timeout, self.reader.read())
            .await
            .map_err(|_| SamplingError::Timeout(self.timeout))??;

        Ok(build_sample(timestamp, counters))
    }
}

/// Local wall clock, truncated to whole seconds.
pub fn local_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Derive used/percent fields from raw counters.
pub fn build_sample(timestamp: NaiveDateTime, c: HostCounters) -> MetricSample {
    let disk_used = c.disk_total.saturating_sub(c.disk_free);

    MetricSample {
        timestamp,
        cpu_percent: c.cpu_percent,
        memory_total: c.memory_total,
        memory_used: c.memory_used,
        memory_free: c.memory_free,
        memory_percent: percent_of(c.memory_used, c.memory_total),
        disk_total: c.disk_total,
        disk_used,
        disk_free: c.disk_free,
        disk_percent: percent_of(disk_used, c.disk_total),
        network_sent: c.network_sent,
        network_recv: c.network_recv,
    }
}
