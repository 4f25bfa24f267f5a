//! # hostwatch
//!
//! Samples host resource counters on a timer, stores one row per sample in
//! a relational table, and serves chart-ready series over a recent window.
//!
//! ## Architecture
//!
//! - **`sampler`**: host counter reading (`CounterReader`, `SysinfoReader`)
//!   and sample assembly (`Sampler`)
//! - **`collector`**: the sample → persist → sleep loop
//! - **`store`**: the `MetricsStore` trait, MySQL and SQLite backends, and
//!   the persist/load helpers with timeouts
//! - **`series`**: window resolution, downsampling, rate derivation and unit
//!   conversion behind `SeriesQuery::get_series`
//! - **`metrics`**: the service's own cycle and latency statistics
//! - **`server`**, **`handlers`**, **`middleware`**: the HTTP API
//!
//! ## Usage
//!
//! ```bash
//! # collector + API against MySQL
//! hostwatch --db-host=db --db-user=monitor --db-name=monitor run
//!
//! # single-host install on SQLite, sampling every 30 s
//! hostwatch --sqlite-path=/var/lib/hostwatch/metrics.db --interval-secs=30 run
//!
//! # reachability check
//! hostwatch --sqlite-path=metrics.db check
//! ```

pub mod check;
pub mod collector;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod sample;
pub mod sampler;
pub mod seed;
pub mod series;
pub mod server;
pub mod store;

pub use collector::{Collector, CycleOutcome};
pub use config::Config;
pub use sample::MetricSample;
pub use series::{SeriesQuery, SeriesResult};

use std::sync::Arc;
use std::time::Duration;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// The `GetSeries` pipeline over the shared store pool.
    pub query: SeriesQuery,

    /// Cycle and request statistics; the collector writes, `/api/stats` reads.
    pub metrics: Arc<metrics::ServiceMetrics>,

    /// Push period of `/api/series/stream`.
    pub stream_interval: Duration,
}
