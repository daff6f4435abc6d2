#![allow(clippy::unwrap_used)]
// Integration tests for the multi-device `Hub`.

use std::sync::Arc;
use std::time::Duration;

use airctrl_api::testing::{FakeClient, FakeConnector};
use airctrl_api::{Connector, Error};
use airctrl_core::{
    CoreError, DeviceInformation, Hub, StatusMap, StatusValue, SupervisorConfig, TaskState,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn device(id: &str, host: &str) -> DeviceInformation {
    DeviceInformation {
        model: "AC0850/11C".into(),
        name: format!("Purifier {id}"),
        device_id: id.into(),
        host: host.into(),
        mac: None,
    }
}

fn powered_on() -> StatusMap {
    StatusMap::from([("D03102".to_owned(), StatusValue::Int(1))])
}

fn hub(connector: &Arc<FakeConnector>) -> Hub {
    Hub::new(
        Arc::clone(connector) as Arc<dyn Connector>,
        SupervisorConfig::default(),
    )
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_setup_registers_supervisor() {
    let connector = FakeConnector::new();
    let client = FakeClient::with_status(powered_on(), 60);
    connector.push_client(Arc::clone(&client));
    let hub = hub(&connector);

    let sup = hub.setup(device("kitchen", "10.0.0.2")).await.unwrap();

    assert_eq!(hub.len(), 1);
    assert_eq!(hub.device_ids(), vec!["kitchen".to_owned()]);
    assert_eq!(hub.get("kitchen").unwrap().host(), "10.0.0.2");
    assert!(sup.is_available());
    assert!(sup.model_config().power_key() == "D03102");
    hub.shutdown_all().await;
}

#[tokio::test]
async fn test_failed_setup_is_not_registered() {
    let connector = FakeConnector::new();
    connector.push_failure(Error::Connect {
        host: "10.0.0.3".into(),
        reason: "unreachable".into(),
    });
    let hub = hub(&connector);

    let result = hub.setup(device("bedroom", "10.0.0.3")).await;

    assert!(matches!(result, Err(CoreError::NotReady { .. })));
    assert!(hub.is_empty());
    assert!(hub.get("bedroom").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_setup_same_id_replaces_and_shuts_down_old() {
    let connector = FakeConnector::new();
    let first = FakeClient::with_status(powered_on(), 60);
    let second = FakeClient::with_status(powered_on(), 60);
    connector.push_client(Arc::clone(&first));
    connector.push_client(Arc::clone(&second));
    let hub = hub(&connector);

    let old = hub.setup(device("office", "10.0.0.4")).await.unwrap();
    let new = hub.setup(device("office", "10.0.0.5")).await.unwrap();

    assert_eq!(hub.len(), 1);
    assert!(old.is_shut_down());
    assert!(!new.is_shut_down());
    assert_eq!(first.shutdown_calls(), 1);
    assert_eq!(hub.get("office").unwrap().host(), "10.0.0.5");
    hub.shutdown_all().await;
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_setups_leave_one_live_supervisor() {
    let connector = FakeConnector::new();
    let first = FakeClient::with_status(powered_on(), 60);
    let second = FakeClient::with_status(powered_on(), 60);
    connector.push_delayed(Duration::from_secs(1), Arc::clone(&first));
    connector.push_delayed(Duration::from_secs(2), Arc::clone(&second));
    let hub = hub(&connector);

    let (early, late) = tokio::join!(
        hub.setup(device("kitchen", "10.0.0.2")),
        hub.setup(device("kitchen", "10.0.0.3")),
    );
    let (early, late) = (early.unwrap(), late.unwrap());

    assert_eq!(hub.len(), 1);
    assert!(early.is_shut_down());
    assert_eq!(early.tasks(), TaskState::default());
    assert_eq!(first.shutdown_calls(), 1);
    assert!(!late.is_shut_down());

    hub.shutdown_all().await;
    assert_eq!(second.shutdown_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unload_and_shutdown_all() {
    let connector = FakeConnector::new();
    let b_client = FakeClient::with_status(powered_on(), 60);
    let a_client = FakeClient::with_status(powered_on(), 60);
    connector.push_client(Arc::clone(&b_client));
    connector.push_client(Arc::clone(&a_client));
    let hub = hub(&connector);
    hub.setup(device("b-room", "10.0.0.7")).await.unwrap();
    hub.setup(device("a-room", "10.0.0.6")).await.unwrap();

    assert_eq!(hub.device_ids(), vec!["a-room".to_owned(), "b-room".to_owned()]);
    assert!(hub.unload("a-room").await);
    assert!(!hub.unload("a-room").await);
    assert_eq!(a_client.shutdown_calls(), 1);
    assert_eq!(b_client.shutdown_calls(), 0);

    hub.shutdown_all().await;
    assert!(hub.is_empty());
    assert_eq!(b_client.shutdown_calls(), 1);
}
