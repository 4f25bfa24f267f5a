mod common;

use std::time::Duration;

use common::{counters, DownStore, MemoryStore, ScriptedReader};
use hostwatch::check;
use hostwatch::sampler::Sampler;
use hostwatch::store::MetricsStore;

fn sampler(script: Vec<Result<hostwatch::sampler::HostCounters, String>>) -> Sampler<ScriptedReader> {
    Sampler::new(ScriptedReader::new(script), Duration::from_secs(1))
}

#[tokio::test]
async fn reachable_store_and_readable_host_pass() {
    let store = MemoryStore::default();
    let report = check::run(&store, &sampler(vec![Ok(counters(3))]), Duration::from_secs(1)).await;

    assert!(report.passed());
    assert!(report.failure().is_none());
    assert_eq!(report.rows, Some(0));
    assert_eq!(report.cpu_percent, Some(17.5));
    assert_eq!(report.memory_percent, Some(25.0));
    assert_eq!(report.disk_percent, Some(25.0));
    // The check samples but never persists.
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn both_failures_are_reported() {
    let report = check::run(
        &DownStore,
        &sampler(vec![Err("no /proc".into())]),
        Duration::from_secs(1),
    )
    .await;

    assert!(!report.passed());
    assert!(report.rows.is_none());
    assert!(report.cpu_percent.is_none());
    assert!(report.store_error.as_deref().unwrap().contains("unavailable"));
    assert!(report.sampling_error.as_deref().unwrap().contains("no /proc"));

    let reason = report.failure().unwrap();
    assert!(reason.contains("store=store unavailable"), "{reason}");
    assert!(reason.contains("sampling=host counter read failed: no /proc"), "{reason}");
}

#[tokio::test]
async fn sampling_only_still_reads_the_host() {
    let mut report = check::run_sampling_only(&sampler(vec![Ok(counters(1))])).await;
    assert!(report.passed());
    assert_eq!(report.cpu_percent, Some(17.5));

    report.store_error = Some("cannot open store".into());
    assert_eq!(
        report.failure().unwrap(),
        "check failed: store=cannot open store sampling=ok"
    );
}
