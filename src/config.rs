//! Command-line and environment configuration.
//!
//! `Cli` is what clap parses; `Config` is the validated form handed to the
//! collector and the query layer at construction. Nothing below this module
//! reads the environment or global state.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::series::{ByteUnit, FirstRatePolicy};

#[derive(Parser, Debug)]
#[command(name = "hostwatch")]
#[command(about = "Samples host resource counters and serves chart-ready series")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub collector: CollectorArgs,

    #[command(flatten)]
    pub display: DisplayArgs,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the collector and the HTTP server together (default)
    Run,
    /// Run only the collector loop
    Collect,
    /// Run only the HTTP server
    Serve,
    /// Check store reachability and host counter readability, then exit
    Check,
    /// Backfill synthetic history for demos
    Seed(SeedArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// MySQL host
    #[arg(long, env = "HOSTWATCH_DB_HOST", default_value = "localhost")]
    pub db_host: String,

    /// MySQL port
    #[arg(long, env = "HOSTWATCH_DB_PORT", default_value_t = 3306)]
    pub db_port: u16,

    /// MySQL user
    #[arg(long, env = "HOSTWATCH_DB_USER", default_value = "monitor")]
    pub db_user: String,

    /// MySQL password
    #[arg(long, env = "HOSTWATCH_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// MySQL database name
    #[arg(long, env = "HOSTWATCH_DB_NAME", default_value = "monitor")]
    pub db_name: String,

    /// Use a SQLite file instead of MySQL
    #[arg(long, env = "HOSTWATCH_SQLITE_PATH")]
    pub sqlite_path: Option<PathBuf>,

    /// Maximum pooled store connections shared by the whole process
    #[arg(long, env = "HOSTWATCH_DB_POOL_SIZE", default_value_t = 8)]
    pub db_pool_size: u32,

    /// Seconds to wait for a free pooled connection
    #[arg(long, default_value_t = 5)]
    pub db_acquire_timeout_secs: u64,

    /// Seconds allowed for a single store round-trip
    #[arg(long, default_value_t = 10)]
    pub db_timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct CollectorArgs {
    /// Minimum seconds between collector cycles
    #[arg(
        long,
        env = "HOSTWATCH_INTERVAL",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_secs: u64,

    /// CPU load averaging window in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub cpu_window_ms: u64,

    /// Seconds allowed for one host counter read
    #[arg(long, default_value_t = 30)]
    pub sample_timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct DisplayArgs {
    /// Point ceiling for a returned series
    #[arg(long, default_value_t = 100)]
    pub max_points: usize,

    /// Fixed minutes added to stored timestamps before display
    #[arg(long, env = "HOSTWATCH_DISPLAY_OFFSET_MINUTES", default_value_t = 0, allow_negative_numbers = true)]
    pub display_offset_minutes: i64,

    /// Unit for memory and disk sizes
    #[arg(long, value_enum, default_value_t = ByteUnit::Gib)]
    pub size_unit: ByteUnit,

    /// Unit for network rates (per second)
    #[arg(long, value_enum, default_value_t = ByteUnit::Mib)]
    pub rate_unit: ByteUnit,

    /// What the first point of a rate series reports
    #[arg(long, value_enum, default_value_t = FirstRatePolicy::RawCounter)]
    pub first_rate: FirstRatePolicy,
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Address the HTTP server listens on
    #[arg(long, env = "HOSTWATCH_LISTEN", default_value = "0.0.0.0:8081")]
    pub listen: SocketAddr,

    /// Directory of static dashboard assets served at `/`
    #[arg(long, env = "HOSTWATCH_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Seconds before an HTTP request is aborted
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Seconds between pushes on the live series stream
    #[arg(long, default_value_t = 5)]
    pub stream_interval_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    /// Days of history to generate, ending now
    #[arg(long, default_value_t = 3)]
    pub days: u32,

    /// Seconds between generated samples
    #[arg(long, default_value_t = 60)]
    pub step_secs: u32,

    /// RNG seed
    #[arg(long, default_value_t = 7)]
    pub rng_seed: u64,
}

// ─── Validated configuration ─────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub sqlite_path: Option<PathBuf>,
    pub pool_size: u32,
    pub acquire_timeout: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub interval: Duration,
    pub cpu_window: Duration,
    pub sample_timeout: Duration,
    pub persist_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub max_points: usize,
    pub offset: chrono::Duration,
    pub size_unit: ByteUnit,
    pub rate_unit: ByteUnit,
    pub first_rate: FirstRatePolicy,
    pub load_timeout: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_points: 100,
            offset: chrono::Duration::zero(),
            size_unit: ByteUnit::Gib,
            rate_unit: ByteUnit::Mib,
            first_rate: FirstRatePolicy::RawCounter,
            load_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub static_dir: Option<PathBuf>,
    pub request_timeout: Duration,
    pub stream_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub collector: CollectorConfig,
    pub display: DisplayConfig,
    pub server: ServerConfig,
}

const MAX_OFFSET_MINUTES: i64 = 24 * 60;

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let s = &cli.store;
        if s.db_pool_size == 0 {
            return Err(invalid("db_pool_size", "must be at least 1"));
        }

        let c = &cli.collector;
        if c.interval_secs == 0 {
            return Err(invalid("interval_secs", "must be at least 1"));
        }
        if c.sample_timeout_secs == 0 {
            return Err(invalid("sample_timeout_secs", "must be at least 1"));
        }
        // The reader blocks for the whole CPU window inside the sample timeout.
        if c.cpu_window_ms >= c.sample_timeout_secs.saturating_mul(1000) {
            return Err(invalid(
                "cpu_window_ms",
                format!(
                    "{} ms does not fit inside sample_timeout_secs = {}",
                    c.cpu_window_ms, c.sample_timeout_secs
                ),
            ));
        }

        let d = &cli.display;
        if d.max_points == 0 {
            return Err(invalid("max_points", "must be at least 1"));
        }
        if d.display_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(invalid(
                "display_offset_minutes",
                format!("must be within ±{MAX_OFFSET_MINUTES}"),
            ));
        }

        let srv = &cli.server;
        if srv.stream_interval_secs == 0 {
            return Err(invalid("stream_interval_secs", "must be at least 1"));
        }

        let store_timeout = Duration::from_secs(s.db_timeout_secs.max(1));

        Ok(Self {
            store: StoreConfig {
                host: s.db_host.clone(),
                port: s.db_port,
                user: s.db_user.clone(),
                password: s.db_password.clone(),
                database: s.db_name.clone(),
                sqlite_path: s.sqlite_path.clone(),
                pool_size: s.db_pool_size,
                acquire_timeout: Duration::from_secs(s.db_acquire_timeout_secs.max(1)),
                timeout: store_timeout,
            },
            collector: CollectorConfig {
                interval: Duration::from_secs(c.interval_secs),
                cpu_window: Duration::from_millis(c.cpu_window_ms),
                sample_timeout: Duration::from_secs(c.sample_timeout_secs),
                persist_timeout: store_timeout,
            },
            display: DisplayConfig {
                max_points: d.max_points,
                offset: chrono::Duration::minutes(d.display_offset_minutes),
                size_unit: d.size_unit,
                rate_unit: d.rate_unit,
                first_rate: d.first_rate,
                load_timeout: store_timeout,
            },
            server: ServerConfig {
                listen: srv.listen,
                static_dir: srv.static_dir.clone(),
                request_timeout: Duration::from_secs(srv.request_timeout_secs.max(1)),
                stream_interval: Duration::from_secs(srv.stream_interval_secs),
            },
        })
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
