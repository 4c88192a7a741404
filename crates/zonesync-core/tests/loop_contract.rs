//! Loop and cancellation contract tests
//!
//! The inter-iteration wait must be cancellable: a shutdown signal makes the
//! loop exit promptly after the in-flight iteration instead of sleeping out
//! the interval. `once` and missing-interval configs run exactly one pass.

mod common;

use common::{MockDnsProvider, ScriptedIpSource, config_for};
use std::time::Duration;
use tokio::sync::oneshot;
use zonesync_core::config::{IpFamily, RecordType};
use zonesync_core::engine::Reconciler;

const IP: &str = "70.49.233.249";

fn engine_with_interval(
    ip_source: &ScriptedIpSource,
    provider: &MockDnsProvider,
    interval: Option<u64>,
    once: bool,
) -> Reconciler {
    let mut config = config_for("example.com", &["example.com"], interval);
    config.once = once;
    Reconciler::new(
        Box::new(ip_source.clone()),
        Box::new(provider.clone()),
        &config,
    )
    .expect("valid config")
}

fn populated_provider() -> MockDnsProvider {
    let provider = MockDnsProvider::new();
    provider.add_zone("example.com", "zone-1");
    provider.add_record("zone-1", "example.com", RecordType::A, "rec-1", IP);
    provider
}

#[tokio::test]
async fn no_interval_runs_exactly_one_iteration() {
    let ip_source = ScriptedIpSource::new();
    ip_source.push_ip(IpFamily::V4, IP);
    let provider = populated_provider();

    let mut engine = engine_with_interval(&ip_source, &provider, None, false);
    let report = engine.run().await;

    assert_eq!(report.iterations, 1);
    assert!(!report.interrupted);
    assert_eq!(report.last_results.len(), 1);
    assert_eq!(ip_source.detect_calls(IpFamily::V4), 1);
}

#[tokio::test]
async fn once_overrides_configured_interval() {
    let ip_source = ScriptedIpSource::new();
    ip_source.push_ip(IpFamily::V4, IP);
    let provider = populated_provider();

    let mut engine = engine_with_interval(&ip_source, &provider, Some(3600), true);
    let report = engine.run().await;

    assert_eq!(report.iterations, 1);
    assert!(!report.interrupted);
}

#[tokio::test]
async fn pre_sent_shutdown_stops_after_first_iteration() {
    let ip_source = ScriptedIpSource::new();
    ip_source.push_ip(IpFamily::V4, IP);
    let provider = populated_provider();

    let mut engine = engine_with_interval(&ip_source, &provider, Some(3600), false);

    let (tx, rx) = oneshot::channel();
    tx.send(()).unwrap();

    let report = engine.run_with_shutdown(rx).await;
    assert!(report.interrupted);
    assert_eq!(report.iterations, 1);
}

#[tokio::test]
async fn shutdown_during_sleep_exits_promptly() {
    let ip_source = ScriptedIpSource::new();
    ip_source.push_ip(IpFamily::V4, IP);
    ip_source.push_ip(IpFamily::V4, IP);
    let provider = populated_provider();

    let mut engine = engine_with_interval(&ip_source, &provider, Some(3600), false);

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = tx.send(());
    });

    let started = std::time::Instant::now();
    let report = engine.run_with_shutdown(rx).await;

    assert!(report.interrupted);
    assert!(report.iterations <= 2);
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "loop must not sleep out the full interval"
    );
}

#[tokio::test]
async fn all_failed_report_flags_runtime_error() {
    let ip_source = ScriptedIpSource::new();
    ip_source.push_failure(IpFamily::V4, "all endpoints failed");
    let provider = populated_provider();

    let mut engine = engine_with_interval(&ip_source, &provider, None, false);
    let report = engine.run().await;

    assert!(report.all_failed());

    // Mixed outcomes must not flag a runtime error
    let ip_source = ScriptedIpSource::new();
    ip_source.push_ip(IpFamily::V4, IP);
    let mut engine = engine_with_interval(&ip_source, &provider, None, false);
    let report = engine.run().await;
    assert!(!report.all_failed());
}
