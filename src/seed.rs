//! Synthetic history for a fresh install, so the charts have something to
//! show before the collector has run for long.

use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::info;

use crate::config::SeedArgs;
use crate::error::PersistenceError;
use crate::sample::{percent_of, MetricSample};
use crate::store::MetricsStore;

// ─── Host shape ──────────────────────────────────────────────────

const GIB: u64 = 1024 * 1024 * 1024;
const MEMORY_TOTAL: u64 = 16 * GIB;
const DISK_TOTAL: u64 = 512 * GIB;
/// Log progress every this many rows
const BATCH: usize = 500;

/// Generate samples from `end - days` up to `end`, one every `step_secs`.
///
/// CPU follows a daily curve plus noise, memory wanders, disk fills slowly
/// and the network counters are cumulative. Halfway through, the counters
/// drop back near zero as if the host rebooted.
pub fn generate(end: NaiveDateTime, args: &SeedArgs) -> Vec<MetricSample> {
    let step = i64::from(args.step_secs.max(1));
    let span = i64::from(args.days) * 86_400;
    let count = (span / step) as usize + 1;
    let start = end - Duration::seconds(span);

    let mut rng = StdRng::seed_from_u64(args.rng_seed);
    let mut sent: u64 = rng.gen_range(GIB..4 * GIB);
    let mut recv: u64 = rng.gen_range(4 * GIB..16 * GIB);
    let mut disk_used: u64 = DISK_TOTAL * 2 / 5;
    let mut memory_used: u64 = MEMORY_TOTAL / 3;

    let mut samples = Vec::with_capacity(count);
    for i in 0..count {
        let timestamp = start + Duration::seconds(i as i64 * step);

        let day_phase = (i as f64 * step as f64 / 86_400.0) * std::f64::consts::TAU;
        let cpu = (30.0 + 20.0 * day_phase.sin() + rng.gen_range(-8.0..8.0)).clamp(0.5, 100.0);

        let drift = rng.gen_range(-(GIB as i64) / 8..GIB as i64 / 8);
        memory_used = memory_used
            .saturating_add_signed(drift)
            .clamp(MEMORY_TOTAL / 5, MEMORY_TOTAL * 9 / 10);

        disk_used = (disk_used + rng.gen_range(0..2 * 1024 * 1024 * step as u64)).min(DISK_TOTAL);

        if i == count / 2 {
            sent = rng.gen_range(0..1024 * 1024);
            recv = rng.gen_range(0..1024 * 1024);
        } else {
            sent += rng.gen_range(0..200 * 1024 * step as u64);
            recv += rng.gen_range(0..800 * 1024 * step as u64);
        }

        let disk_free = DISK_TOTAL - disk_used;
        samples.push(MetricSample {
            timestamp,
            cpu_percent: (cpu * 10.0).round() / 10.0,
            memory_total: MEMORY_TOTAL,
            memory_used,
            memory_free: MEMORY_TOTAL - memory_used,
            memory_percent: percent_of(memory_used, MEMORY_TOTAL),
            disk_total: DISK_TOTAL,
            disk_used,
            disk_free,
            disk_percent: percent_of(disk_used, DISK_TOTAL),
            network_sent: sent,
            network_recv: recv,
        });
    }
    samples
}

/// Write generated history into `store`. Stops at the first failed insert.
pub async fn seed(
    store: &dyn MetricsStore,
    end: NaiveDateTime,
    args: &SeedArgs,
) -> Result<usize, PersistenceError> {
    let t0 = Instant::now();
    let samples = generate(end, args);
    info!(
        rows = samples.len(),
        days = args.days,
        step_secs = args.step_secs,
        backend = store.backend(),
        "seeding synthetic history"
    );

    for (i, sample) in samples.iter().enumerate() {
        store.insert(sample).await?;
        if (i + 1) % BATCH == 0 {
            info!(written = i + 1, "seed progress");
        }
    }

    info!(
        rows = samples.len(),
        secs = t0.elapsed().as_secs_f64(),
        "seed complete"
    );
    Ok(samples.len())
}
