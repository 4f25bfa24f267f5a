pub mod percentiles;
pub mod service;

pub use percentiles::PercentileSet;
pub use service::{ServiceMetrics, StatsSnapshot};

use chrono::NaiveDateTime;
use std::time::Duration;

use crate::collector::CycleOutcome;

/// One finished collector cycle.
#[derive(Debug, Clone)]
pub struct CycleRecord {
    pub started_at: NaiveDateTime,
    pub outcome: CycleOutcome,
    pub duration: Duration,
}

/// One `GetSeries` store round-trip.
#[derive(Debug, Clone)]
pub struct QuerySample {
    /// Microseconds spent waiting on the store
    pub store_us: u64,
    /// Rows the store returned before downsampling
    pub rows: usize,
    pub success: bool,
}

/// One HTTP request as seen by the timing middleware.
#[derive(Debug, Clone)]
pub struct RequestSample {
    pub status: u16,
    /// Total handler wall time in microseconds
    pub total_us: u64,
}
