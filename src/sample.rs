use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One stored point: every counter the collector captures in a cycle.
///
/// `timestamp` is the collector's local wall clock with no timezone
/// attached. Network counters are cumulative since boot (or the last
/// counter reset), not per-interval deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: NaiveDateTime,
    pub cpu_percent: f64,

    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_free: u64,
    pub memory_percent: f64,

    pub disk_total: u64,
    pub disk_used: u64,
    pub disk_free: u64,
    pub disk_percent: f64,

    pub network_sent: u64,
    pub network_recv: u64,
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
