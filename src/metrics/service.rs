use chrono::NaiveDateTime;
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::percentiles::{new_histogram, PercentileSet};
use super::{CycleRecord, QuerySample, RequestSample};
use crate::collector::CycleOutcome;
use crate::series::display_time;

// ─── Configuration ───────────────────────────────────────────────

/// Collector cycles kept for the recent-cycles list
const MAX_RECENT_CYCLES: usize = 60;

/// Cycle durations in ms, up to 10 minutes
const CYCLE_HIGH_MS: u64 = 600_000;

/// Store and request latencies in μs, up to 10 minutes
const LATENCY_HIGH_US: u64 = 600_000_000;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe self-metrics for the service.
/// The collector calls `record_cycle()`, handlers and the timing middleware
/// call `record_query()` / `record_request()`, `/api/stats` reads
/// `snapshot()`.
pub struct ServiceMetrics {
    inner: Mutex<Inner>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleEntry {
    pub started_at: String,
    pub outcome: CycleOutcome,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleCounters {
    pub total: u64,
    pub stored: u64,
    pub sampling_failed: u64,
    pub persist_failed: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestCounters {
    pub total: u64,
    pub errors: u64,
    pub queries: u64,
    pub query_errors: u64,
    pub rows_loaded: u64,
}

/// Everything `/api/stats` returns.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: f64,
    pub cycles: CycleCounters,
    pub requests: RequestCounters,
    pub last_stored_at: Option<String>,

    pub cycle_duration: PercentileSet,
    pub store_latency: PercentileSet,
    pub request_latency: PercentileSet,

    pub recent_cycles: Vec<CycleEntry>,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    cycle_hist: Histogram<u64>,
    store_hist: Histogram<u64>,
    request_hist: Histogram<u64>,

    cycles: CycleCounters,
    requests: RequestCounters,
    last_stored_at: Option<NaiveDateTime>,

    recent_cycles: VecDeque<CycleEntry>,

    started: Instant,
}

// ─── ServiceMetrics impl ─────────────────────────────────────────

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    pub fn record_cycle(&self, record: CycleRecord) {
        self.inner.lock().record_cycle(record);
    }

    pub fn record_query(&self, sample: QuerySample) {
        self.inner.lock().record_query(sample);
    }

    pub fn record_request(&self, sample: RequestSample) {
        self.inner.lock().record_request(sample);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().snapshot()
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Inner impl ──────────────────────────────────────────────────

impl Inner {
    fn new() -> Self {
        Self {
            cycle_hist: new_histogram(CYCLE_HIGH_MS),
            store_hist: new_histogram(LATENCY_HIGH_US),
            request_hist: new_histogram(LATENCY_HIGH_US),
            cycles: CycleCounters::default(),
            requests: RequestCounters::default(),
            last_stored_at: None,
            recent_cycles: VecDeque::with_capacity(MAX_RECENT_CYCLES + 1),
            started: Instant::now(),
        }
    }

    fn record_cycle(&mut self, r: CycleRecord) {
        self.cycles.total += 1;
        match r.outcome {
            CycleOutcome::Stored => {
                self.cycles.stored += 1;
                self.last_stored_at = Some(r.started_at);
            }
            CycleOutcome::SamplingFailed => self.cycles.sampling_failed += 1,
            CycleOutcome::PersistFailed => self.cycles.persist_failed += 1,
        }

        let ms = clamp_ms(r.duration);
        let _ = self.cycle_hist.record(ms.clamp(1, CYCLE_HIGH_MS));

        self.recent_cycles.push_back(CycleEntry {
            started_at: display_time(r.started_at, chrono::Duration::zero()),
            outcome: r.outcome,
            duration_ms: ms,
        });
        if self.recent_cycles.len() > MAX_RECENT_CYCLES {
            self.recent_cycles.pop_front();
        }
    }

    fn record_query(&mut self, q: QuerySample) {
        self.requests.queries += 1;
        if q.success {
            self.requests.rows_loaded += q.rows as u64;
            let _ = self.store_hist.record(q.store_us.clamp(1, LATENCY_HIGH_US));
        } else {
            self.requests.query_errors += 1;
        }
    }

    fn record_request(&mut self, r: RequestSample) {
        self.requests.total += 1;
        if r.status >= 500 {
            self.requests.errors += 1;
        }
        let _ = self.request_hist.record(r.total_us.clamp(1, LATENCY_HIGH_US));
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: self.started.elapsed().as_secs_f64(),
            cycles: self.cycles.clone(),
            requests: self.requests.clone(),
            last_stored_at: self
                .last_stored_at
                .map(|t| display_time(t, chrono::Duration::zero())),
            cycle_duration: PercentileSet::from_histogram(&self.cycle_hist, "ms"),
            store_latency: PercentileSet::from_histogram(&self.store_hist, "us"),
            request_latency: PercentileSet::from_histogram(&self.request_hist, "us"),
            recent_cycles: self.recent_cycles.iter().cloned().collect(),
        }
    }
}

fn clamp_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, sec)
            .unwrap()
    }

    #[test]
    fn counts_cycle_outcomes() {
        let m = ServiceMetrics::new();
        for (sec, outcome) in [
            (0, CycleOutcome::Stored),
            (1, CycleOutcome::SamplingFailed),
            (2, CycleOutcome::PersistFailed),
            (3, CycleOutcome::Stored),
        ] {
            m.record_cycle(CycleRecord {
                started_at: at(sec),
                outcome,
                duration: Duration::from_millis(1_000 + sec as u64),
            });
        }

        let snap = m.snapshot();
        assert_eq!(snap.cycles.total, 4);
        assert_eq!(snap.cycles.stored, 2);
        assert_eq!(snap.cycles.sampling_failed, 1);
        assert_eq!(snap.cycles.persist_failed, 1);
        assert_eq!(snap.last_stored_at.as_deref(), Some("2024-01-01 08:00:03"));
        assert_eq!(snap.cycle_duration.count, 4);
        assert_eq!(snap.recent_cycles.len(), 4);
    }

    #[test]
    fn recent_cycles_are_bounded() {
        let m = ServiceMetrics::new();
        for i in 0..(MAX_RECENT_CYCLES as u32 + 10) {
            m.record_cycle(CycleRecord {
                started_at: at(i % 60),
                outcome: CycleOutcome::Stored,
                duration: Duration::ZERO,
            });
        }
        assert_eq!(m.snapshot().recent_cycles.len(), MAX_RECENT_CYCLES);
    }

    #[test]
    fn failed_queries_do_not_count_rows() {
        let m = ServiceMetrics::new();
        m.record_query(QuerySample { store_us: 800, rows: 10, success: true });
        m.record_query(QuerySample { store_us: 0, rows: 0, success: false });
        m.record_request(RequestSample { status: 200, total_us: 1_200 });
        m.record_request(RequestSample { status: 503, total_us: 90 });

        let snap = m.snapshot();
        assert_eq!(snap.requests.queries, 2);
        assert_eq!(snap.requests.query_errors, 1);
        assert_eq!(snap.requests.rows_loaded, 10);
        assert_eq!(snap.requests.total, 2);
        assert_eq!(snap.requests.errors, 1);
        assert_eq!(snap.store_latency.count, 1);
    }
}
