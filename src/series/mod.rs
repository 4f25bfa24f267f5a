//! Read path: stored rows → chart-ready arrays.
//!
//! `SeriesQuery::get_series` runs the whole pipeline for one request:
//! resolve the window, load rows, downsample, derive network rates and
//! convert units. Each stage lives in its own submodule and is a plain
//! function over slices so it can be tested without a store.

pub mod convert;
pub mod downsample;
pub mod range;
pub mod rate;

pub use convert::{display_time, ByteUnit};
pub use downsample::downsample;
pub use range::{resolve, resolve_or_default, TimeWindow, DEFAULT_TOKEN};
pub use rate::{derive_rates, FirstRatePolicy};

use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::DisplayConfig;
use crate::error::StoreError;
use crate::sample::MetricSample;
use crate::store::{self, MetricsStore};

/// Eight equal-length, time-ordered arrays ready for charting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesResult {
    pub timestamps: Vec<String>,
    pub cpu_percent: Vec<f64>,
    pub memory_used: Vec<f64>,
    pub memory_total: Vec<f64>,
    pub disk_used: Vec<f64>,
    pub disk_total: Vec<f64>,
    pub network_sent: Vec<Option<f64>>,
    pub network_recv: Vec<Option<f64>>,
}

impl SeriesResult {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Unit labels so the caller can title axes without knowing the config.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesUnits {
    pub size: &'static str,
    pub rate: &'static str,
}

/// One answered request: the series plus what produced it.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesReport {
    pub time_range: String,
    pub window: TimeWindow,
    pub rows_loaded: usize,
    pub units: SeriesUnits,
    pub series: SeriesResult,
    #[serde(skip)]
    pub store_elapsed: Duration,
}

/// Transform an ordered window of samples into display arrays.
pub fn build_series(samples: Vec<MetricSample>, display: &DisplayConfig) -> SeriesResult {
    let samples = downsample(samples, display.max_points);

    let size = |bytes: u64| display.size_unit.scale(bytes as f64);

    SeriesResult {
        timestamps: samples
            .iter()
            .map(|s| display_time(s.timestamp, display.offset))
            .collect(),
        cpu_percent: samples.iter().map(|s| s.cpu_percent).collect(),
        memory_used: samples.iter().map(|s| size(s.memory_used)).collect(),
        memory_total: samples.iter().map(|s| size(s.memory_total)).collect(),
        disk_used: samples.iter().map(|s| size(s.disk_used)).collect(),
        disk_total: samples.iter().map(|s| size(s.disk_total)).collect(),
        network_sent: derive_rates(&samples, rate::sent, display.rate_unit, display.first_rate),
        network_recv: derive_rates(&samples, rate::recv, display.rate_unit, display.first_rate),
    }
}

/// The query boundary handed to the HTTP layer.
#[derive(Clone)]
pub struct SeriesQuery {
    store: Arc<dyn MetricsStore>,
    display: DisplayConfig,
}

impl SeriesQuery {
    pub fn new(store: Arc<dyn MetricsStore>, display: DisplayConfig) -> Self {
        Self { store, display }
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    pub fn store(&self) -> &Arc<dyn MetricsStore> {
        &self.store
    }

    /// `GetSeries`: window ending at the collector-local current time.
    pub async fn get_series(&self, token: Option<&str>) -> Result<SeriesReport, StoreError> {
        self.get_series_at(token, crate::sampler::local_now()).await
    }

    /// `GetSeries` against an explicit "now".
    pub async fn get_series_at(
        &self,
        token: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<SeriesReport, StoreError> {
        let token = token.filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TOKEN);
        let window = resolve_or_default(token, now);

        let t_store = Instant::now();
        let samples =
            store::load_series(self.store.as_ref(), window.start, self.display.load_timeout)
                .await?;
        let store_elapsed = t_store.elapsed();
        let rows_loaded = samples.len();

        Ok(SeriesReport {
            time_range: token.to_string(),
            window,
            rows_loaded,
            units: SeriesUnits {
                size: self.display.size_unit.label(),
                rate: self.display.rate_unit.label(),
            },
            series: build_series(samples, &self.display),
            store_elapsed,
        })
    }
}
