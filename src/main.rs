use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hostwatch::config::{Cli, Command, Config};
use hostwatch::error::HostwatchError;
use hostwatch::metrics::ServiceMetrics;
use hostwatch::sampler::{local_now, Sampler, SysinfoReader};
use hostwatch::store::{self, MetricsStore};
use hostwatch::{check, seed, server, AppState, Collector, SeriesQuery};

#[tokio::main]
async fn main() -> Result<(), HostwatchError> {
    let cli = Cli::parse();

    // ── 1. Logging ───────────────────────────────────────────────
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("hostwatch={level},tower_http=warn,sqlx=warn"))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // ── 2. Configuration ─────────────────────────────────────────
    let config = Config::from_cli(&cli)?;
    let command = cli.command.clone().unwrap_or(Command::Run);

    // ── 3. Dispatch ──────────────────────────────────────────────
    match command {
        Command::Check => run_check(&config).await,
        Command::Seed(args) => {
            let store = open_store(&config).await?;
            let rows = seed::seed(store.as_ref(), local_now(), &args).await?;
            info!(rows, "seeded");
            Ok(())
        }
        Command::Collect => {
            let store = open_store(&config).await?;
            let collector = collector(&config, store, Arc::new(ServiceMetrics::new()));
            tokio::select! {
                _ = collector.run() => Ok(()),
                _ = shutdown_signal() => Ok(()),
            }
        }
        Command::Serve => {
            let store = open_store(&config).await?;
            serve(&config, store, Arc::new(ServiceMetrics::new())).await
        }
        Command::Run => {
            let store = open_store(&config).await?;
            let metrics = Arc::new(ServiceMetrics::new());
            let collector = collector(&config, store.clone(), metrics.clone());
            tokio::select! {
                _ = collector.run() => Ok(()),
                r = serve(&config, store, metrics) => r,
            }
        }
    }
}

async fn open_store(config: &Config) -> Result<Arc<dyn MetricsStore>, HostwatchError> {
    let store = store::open(&config.store).await?;
    info!(backend = store.backend(), "store ready");
    Ok(store)
}

fn collector(
    config: &Config,
    store: Arc<dyn MetricsStore>,
    metrics: Arc<ServiceMetrics>,
) -> Collector<SysinfoReader> {
    let reader = SysinfoReader::new(config.collector.cpu_window);
    Collector::new(reader, store, metrics, &config.collector)
}

async fn serve(
    config: &Config,
    store: Arc<dyn MetricsStore>,
    metrics: Arc<ServiceMetrics>,
) -> Result<(), HostwatchError> {
    let state = Arc::new(AppState {
        query: SeriesQuery::new(store, config.display.clone()),
        metrics,
        stream_interval: config.server.stream_interval,
    });
    let app = server::create_router(state, &config.server);

    let addr = config.server.listen;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| HostwatchError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!(%addr, "listening");
    info!("Series JSON  → http://{addr}/api/series?time_range=2h");
    info!("Series SSE   → http://{addr}/api/series/stream?time_range=2h");
    info!("Stats        → http://{addr}/api/stats");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(HostwatchError::Serve)
}

async fn run_check(config: &Config) -> Result<(), HostwatchError> {
    let sampler = Sampler::new(
        SysinfoReader::new(config.collector.cpu_window),
        config.collector.sample_timeout,
    );

    let report = match store::open(&config.store).await {
        Ok(store) => check::run(store.as_ref(), &sampler, config.store.timeout).await,
        Err(e) => {
            error!(error = %e, "store check failed");
            let mut report = check::run_sampling_only(&sampler).await;
            report.store_error = Some(e.to_string());
            report
        }
    };

    match report.failure() {
        None => {
            info!("all checks passed");
            Ok(())
        }
        Some(reason) => Err(HostwatchError::Check(reason)),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
