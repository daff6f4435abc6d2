#![allow(clippy::unwrap_used)]
// Integration tests for `Supervisor` driven by the scripted fakes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tracing_subscriber::EnvFilter;

use airctrl_api::testing::{FakeClient, FakeConnector};
use airctrl_api::{Connector, DeviceClient, Error};
use airctrl_core::{
    CoreError, DeviceInformation, StatusMap, StatusValue, Supervisor, SupervisorConfig, TaskState,
};

// ── Helpers ─────────────────────────────────────────────────────────

const TEST_HOST: &str = "192.168.1.100";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn info() -> DeviceInformation {
    DeviceInformation {
        model: "AC3858/51".into(),
        name: "Living Room".into(),
        device_id: "aabbccddeeff".into(),
        host: TEST_HOST.into(),
        mac: Some("aa:bb:cc:dd:ee:ff".into()),
    }
}

fn status(pairs: &[(&str, &str)]) -> StatusMap {
    pairs
        .iter()
        .map(|&(k, v)| (k.to_owned(), StatusValue::from(v)))
        .collect()
}

fn supervisor(client: &Arc<FakeClient>, connector: &Arc<FakeConnector>) -> Supervisor {
    init_tracing();
    Supervisor::new(
        info(),
        SupervisorConfig::default(),
        Arc::clone(connector) as Arc<dyn Connector>,
        Arc::clone(client) as Arc<dyn DeviceClient>,
    )
}

/// Supervisor whose first refresh already succeeded with `{"pwr": "1"}`.
async fn running(poll_secs: u64) -> (Supervisor, Arc<FakeClient>, Arc<FakeConnector>) {
    let client = FakeClient::with_status(status(&[("pwr", "1")]), poll_secs);
    let connector = FakeConnector::new();
    let sup = supervisor(&client, &connector);
    sup.first_refresh_and_observe().await.unwrap();
    (sup, client, connector)
}

/// Let spawned tasks run (time is paused, so this never really sleeps).
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

const BOTH_LOOPS: TaskState = TaskState {
    observing: true,
    watchdog: true,
    reconnecting: false,
};

// ── Startup ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_first_refresh_populates_cache_and_starts_loops() {
    let client = FakeClient::with_status(status(&[("pwr", "1")]), 60);
    let connector = FakeConnector::new();
    let sup = supervisor(&client, &connector);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    sup.add_listener(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    sup.first_refresh_and_observe().await.unwrap();

    assert_eq!(*sup.status().unwrap(), status(&[("pwr", "1")]));
    assert!(sup.is_available());
    assert!(sup.last_update().is_some());
    assert_eq!(sup.poll_interval(), Duration::from_secs(60));
    assert_eq!(sup.tasks(), BOTH_LOOPS);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    settle().await;
    assert_eq!(client.observe_calls(), 1);
    sup.shutdown().await;
}

#[tokio::test]
async fn test_first_refresh_failure_is_not_ready() {
    let client = FakeClient::new();
    client.script_status_error(Error::Status("no response".into()));
    let connector = FakeConnector::new();
    let sup = supervisor(&client, &connector);

    let result = sup.first_refresh_and_observe().await;

    match result {
        Err(err @ CoreError::NotReady { .. }) => assert!(err.is_retryable()),
        other => panic!("expected NotReady, got: {other:?}"),
    }
    assert!(!sup.is_available());
    assert!(sup.status().is_none());
    assert!(sup.last_update().is_none());
    assert_eq!(sup.tasks(), TaskState::default());
}

#[tokio::test]
async fn test_setup_connect_failure_is_not_ready() {
    init_tracing();
    let connector = FakeConnector::new();
    connector.push_failure(Error::Connect {
        host: TEST_HOST.into(),
        reason: "host unreachable".into(),
    });

    let result = Supervisor::setup(info(), SupervisorConfig::default(), connector.clone()).await;

    assert!(matches!(result, Err(CoreError::NotReady { ref host, .. }) if host == TEST_HOST));
    assert_eq!(connector.hosts(), vec![TEST_HOST.to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn test_setup_connect_timeout_is_not_ready() {
    init_tracing();
    let connector = FakeConnector::new();
    connector.push_hang();

    let result = Supervisor::setup(info(), SupervisorConfig::default(), connector.clone()).await;

    match result {
        Err(CoreError::NotReady { reason, .. }) => assert!(reason.contains("25s"), "{reason}"),
        other => panic!("expected NotReady, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_setup_closes_client_when_first_fetch_fails() {
    init_tracing();
    let client = FakeClient::new();
    let connector = FakeConnector::new();
    connector.push_client(Arc::clone(&client));

    let result = Supervisor::setup(info(), SupervisorConfig::default(), connector.clone()).await;

    assert!(matches!(result, Err(CoreError::NotReady { .. })));
    assert_eq!(client.shutdown_calls(), 1);
}

// ── Observation loop ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_pushed_status_replaces_cache_and_notifies() {
    let (sup, client, _connector) = running(60).await;
    let mut subscription = sup.subscribe();
    let version = sup.store().version();

    client.push(status(&[("pwr", "1"), ("mode", "S")]));
    let snapshot = subscription.changed().await.unwrap();

    assert_eq!(*snapshot, status(&[("pwr", "1"), ("mode", "S")]));
    assert_eq!(sup.store().version(), version + 1);
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stream_error_marks_unavailable_and_reconnects_once() {
    let (sup, client, connector) = running(60).await;
    let mut availability = sup.availability();

    client.push(status(&[("pwr", "0")]));
    client.push_error(Error::Stream("connection reset".into()));
    settle().await;

    assert_eq!(*sup.status().unwrap(), status(&[("pwr", "0")]));
    assert!(!sup.is_available());
    assert!(availability.has_changed().unwrap());
    assert!(!*availability.borrow_and_update());
    assert_eq!(connector.connect_count(), 1);

    // Well inside the watchdog tolerance: nothing else retries.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.connect_count(), 1);
    assert_eq!(client.shutdown_calls(), 1);

    // The observation task has returned; only the watchdog is left.
    let tasks = sup.tasks();
    assert!(!tasks.observing);
    assert!(tasks.watchdog);
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_clean_stream_end_also_reconnects() {
    let (sup, client, connector) = running(60).await;
    let replacement = FakeClient::with_status(status(&[("pwr", "1"), ("mode", "AG")]), 30);
    connector.push_client(Arc::clone(&replacement));

    client.end_stream();
    settle().await;

    assert_eq!(connector.connect_count(), 1);
    assert!(sup.is_available());
    assert_eq!(sup.poll_interval(), Duration::from_secs(30));
    assert_eq!(sup.tasks(), BOTH_LOOPS);
    assert_eq!(replacement.observe_calls(), 1);

    replacement.push(status(&[("pwr", "0")]));
    settle().await;
    assert_eq!(*sup.status().unwrap(), status(&[("pwr", "0")]));
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_observe_failure_triggers_reconnect() {
    let client = FakeClient::with_status(status(&[("pwr", "1")]), 60);
    client.fail_observe(Error::Stream("subscribe rejected".into()));
    let connector = FakeConnector::new();
    let sup = supervisor(&client, &connector);

    sup.first_refresh_and_observe().await.unwrap();
    settle().await;

    assert!(!sup.is_available());
    assert_eq!(connector.connect_count(), 1);
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stream_end_during_reconnect_retries_after_it() {
    let (sup, client, connector) = running(60).await;
    let replacement = FakeClient::with_status(status(&[("pwr", "1")]), 60);
    connector.push_hang();
    connector.push_client(Arc::clone(&replacement));

    assert!(sup.trigger_reconnect());
    settle().await;
    client.end_stream();
    settle().await;
    assert_eq!(connector.connect_count(), 1);

    // The hung connect times out after 25s; the stream end is not forgotten.
    tokio::time::sleep(Duration::from_secs(26)).await;

    assert_eq!(connector.connect_count(), 2);
    assert_eq!(replacement.observe_calls(), 1);
    assert!(sup.is_available());
    assert_eq!(sup.tasks(), BOTH_LOOPS);
    sup.shutdown().await;
}

// ── Watchdog ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_watchdog_reconnects_silent_device() {
    let (sup, _client, connector) = running(1).await;

    // Tolerance is 3 × 1s: nothing happens before the first check.
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(connector.connect_count(), 0);
    assert!(sup.is_available());

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(connector.connect_count() >= 1);
    assert!(!sup.is_available());
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_serializes_reconnects() {
    let (sup, _client, connector) = running(1).await;
    let replacement = FakeClient::with_status(status(&[("pwr", "1")]), 1);
    connector.push_delayed(Duration::from_secs(20), Arc::clone(&replacement));

    // Stale at 6s; the held connect spans several watchdog periods.
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(connector.connect_count(), 1);
    assert!(sup.tasks().reconnecting);

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(replacement.status_calls(), 1);
    assert!(!sup.tasks().reconnecting);
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_missed_packet_count_scales_tolerance() {
    init_tracing();
    let client = FakeClient::with_status(status(&[("pwr", "1")]), 1);
    let connector = FakeConnector::new();
    let config = SupervisorConfig {
        missed_packet_count: 10,
        ..SupervisorConfig::default()
    };
    let sup = Supervisor::new(info(), config, connector.clone(), client.clone());
    sup.first_refresh_and_observe().await.unwrap();

    // The default multiplier would have fired at 6s.
    tokio::time::sleep(Duration::from_secs(9)).await;
    assert_eq!(connector.connect_count(), 0);

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert!(connector.connect_count() >= 1);
    sup.shutdown().await;
}

// ── Reconnect procedure ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_failed_reconnect_keeps_old_client() {
    let (sup, client, connector) = running(60).await;
    connector.push_failure(Error::Connect {
        host: TEST_HOST.into(),
        reason: "refused".into(),
    });
    let version = sup.store().version();

    sup.do_reconnect().await;

    assert_eq!(client.shutdown_calls(), 1);
    assert_eq!(connector.connect_count(), 1);
    assert_eq!(sup.store().version(), version);

    // The old reference is still the one commands go to.
    sup.set_control_value("pwr", "0").await.unwrap();
    assert_eq!(client.writes(), vec![status(&[("pwr", "0")])]);

    // A later trigger can still succeed.
    let replacement = FakeClient::with_status(status(&[("pwr", "0")]), 60);
    connector.push_client(Arc::clone(&replacement));
    assert!(sup.trigger_reconnect());
    settle().await;
    assert_eq!(replacement.status_calls(), 1);
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_status_failure_still_restarts_loops() {
    let (sup, _client, connector) = running(60).await;
    let replacement = FakeClient::new();
    replacement.script_status_error(Error::Status("busy".into()));
    connector.push_client(Arc::clone(&replacement));

    sup.do_reconnect().await;
    settle().await;

    assert!(!sup.is_available());
    assert_eq!(sup.tasks(), BOTH_LOOPS);
    assert_eq!(replacement.observe_calls(), 1);

    replacement.push(status(&[("pwr", "1")]));
    settle().await;
    assert!(sup.is_available());
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stale_client_shutdown_error_is_ignored() {
    let (sup, client, connector) = running(60).await;
    client.fail_shutdown();
    let replacement = FakeClient::with_status(status(&[("pwr", "0")]), 60);
    connector.push_client(Arc::clone(&replacement));

    sup.do_reconnect().await;

    assert_eq!(*sup.status().unwrap(), status(&[("pwr", "0")]));
    assert!(sup.is_available());
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_triggers_run_one_body() {
    let (sup, _client, connector) = running(60).await;
    let replacement = FakeClient::with_status(status(&[("pwr", "1")]), 60);
    connector.push_delayed(Duration::from_secs(5), Arc::clone(&replacement));

    let started: usize = (0..10).map(|_| usize::from(sup.trigger_reconnect())).sum();
    tokio::time::sleep(Duration::from_secs(1)).await;
    let again = sup.trigger_reconnect();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(started, 1);
    assert!(!again);
    assert_eq!(connector.connect_count(), 1);
    assert_eq!(replacement.status_calls(), 1);
    sup.shutdown().await;
}

// ── Command path ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_write_goes_straight_to_client() {
    let (sup, client, _connector) = running(60).await;
    let version = sup.store().version();

    sup.set_control_values(&status(&[("mode", "S"), ("om", "s")]))
        .await
        .unwrap();

    assert_eq!(client.writes(), vec![status(&[("mode", "S"), ("om", "s")])]);
    // The cache is the caller's to patch.
    assert_eq!(sup.store().version(), version);
    assert!(sup.store().patch("mode", "S"));
    assert_eq!(sup.store().get("mode"), Some(StatusValue::from("S")));
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_propagates_unchanged() {
    let (sup, client, _connector) = running(60).await;
    client.fail_writes("device rejected write");
    let before = sup.status().unwrap();

    let result = sup.set_control_values(&status(&[("pwr", "0")])).await;

    match result {
        Err(Error::Write(message)) => assert_eq!(message, "device rejected write"),
        other => panic!("expected Write error, got: {other:?}"),
    }
    assert_eq!(sup.status().unwrap(), before);
    assert!(sup.is_available());
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_set_power_uses_model_encoding() {
    let (sup, client, _connector) = running(60).await;

    sup.set_power(false).await.unwrap();

    assert_eq!(client.writes(), vec![status(&[("pwr", "0")])]);
    sup.shutdown().await;
}

// ── Shutdown ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_shutdown_is_idempotent() {
    let (sup, client, _connector) = running(60).await;

    sup.shutdown().await;
    sup.shutdown().await;

    assert_eq!(client.shutdown_calls(), 1);
    assert_eq!(sup.tasks(), TaskState::default());
    assert!(sup.is_shut_down());
}

#[tokio::test]
async fn test_shutdown_without_tasks_or_client_errors() {
    let client = FakeClient::new();
    client.fail_shutdown();
    let connector = FakeConnector::new();
    let sup = supervisor(&client, &connector);

    sup.shutdown().await;

    assert_eq!(client.shutdown_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_activity_after_shutdown() {
    let (sup, client, connector) = running(1).await;

    sup.shutdown().await;
    client.push_error(Error::StreamClosed);
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(connector.connect_count(), 0);
    assert!(!sup.trigger_reconnect());
    assert!(matches!(
        sup.set_control_value("pwr", "1").await,
        Err(Error::Closed)
    ));
    assert!(matches!(sup.refresh().await, Err(Error::Closed)));
}

// ── Refresh, listeners, diagnostics ─────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_refresh_updates_availability() {
    let (sup, client, _connector) = running(60).await;
    client.script_status_error(Error::Timeout {
        operation: "status request",
        timeout_secs: 30,
    });
    client.script_status(status(&[("pwr", "0")]), 15);

    assert!(sup.refresh().await.is_err());
    assert!(!sup.is_available());

    let snapshot = sup.refresh().await.unwrap();
    assert_eq!(*snapshot, status(&[("pwr", "0")]));
    assert!(sup.is_available());
    assert_eq!(sup.poll_interval(), Duration::from_secs(15));
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_removed_listener_stops_hearing_updates() {
    let (sup, client, _connector) = running(60).await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = sup.add_listener(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    client.push(status(&[("pwr", "1")]));
    settle().await;
    assert!(sup.remove_listener(id));
    client.push(status(&[("pwr", "0")]));
    settle().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_diagnostics_are_redacted() {
    let (sup, _client, _connector) = running(60).await;

    let diag = sup.diagnostics();

    assert_eq!(diag["device_info"]["host"], "**REDACTED**");
    assert_eq!(diag["device_info"]["device_id"], "**REDACTED**");
    assert_eq!(diag["device_info"]["mac"], "**REDACTED**");
    assert_eq!(diag["device_info"]["model"], "AC3858/51");
    assert_eq!(diag["model"]["api_generation"], "gen1");
    assert_eq!(diag["supervisor"]["available"], true);
    assert_eq!(diag["supervisor"]["tasks"]["observing"], true);
    assert_eq!(diag["device_status"]["pwr"], "1");
    sup.shutdown().await;
}
