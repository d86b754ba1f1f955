//! Integration tests for the operator event loop.
//!
//! These tests drive full reconciliation passes through the public
//! `Operator` API with mock collaborators:
//! 1. Events arrive (config-changed, relation-joined)
//! 2. The operator observes, decides and executes actions
//! 3. Deferred events are replayed on redelivery
//!
//! Uses `MockSupervisor` and `InMemoryRelationStore` in place of the
//! external runtime.

use std::sync::Arc;

use nf_reconcile::{Event, State, UnitStatus};
use nf_relation::{InMemoryRelationStore, RelationHandle, RelationStore};
use nrf_operator::config::{Config, ProbeKind, ServiceConfig, DEFAULT_CONFIG_PATH};
use nrf_operator::expose::LoggingExposure;
use nrf_operator::operator::Operator;
use nrf_operator::probe::{ReadinessProbe, StaticProbe};
use nrf_operator::workload::{MockSupervisor, WorkloadSupervisor};

fn test_config() -> Config {
    Config {
        service_name: "nrf".to_string(),
        app_name: "nrf".to_string(),
        model_name: "core".to_string(),
        config_path: DEFAULT_CONFIG_PATH.to_string(),
        redeliver_interval_secs: 1,
        probe: ProbeKind::Stub,
        log_level: "debug".to_string(),
        service: ServiceConfig::default(),
    }
}

struct Harness {
    operator: Operator,
    status: tokio::sync::watch::Receiver<UnitStatus>,
    supervisor: Arc<MockSupervisor>,
    probe: Arc<StaticProbe>,
    store: Arc<InMemoryRelationStore>,
}

fn harness(supervisor: MockSupervisor, listening: bool, is_leader: bool) -> Harness {
    let supervisor = Arc::new(supervisor);
    let probe = Arc::new(StaticProbe::new(listening));
    let store = Arc::new(InMemoryRelationStore::new());
    let (operator, status) = Operator::new(
        test_config(),
        Arc::clone(&supervisor) as Arc<dyn WorkloadSupervisor>,
        Arc::clone(&probe) as Arc<dyn ReadinessProbe>,
        Arc::new(LoggingExposure),
        Arc::clone(&store) as Arc<dyn RelationStore>,
        is_leader,
    );
    Harness {
        operator,
        status,
        supervisor,
        probe,
        store,
    }
}

#[tokio::test]
async fn test_config_changed_without_connectivity_defers() {
    let mut h = harness(MockSupervisor::disconnected(), true, true);

    h.operator.dispatch(Event::ConfigChanged).await;

    assert_eq!(h.operator.state(), State::WaitingForConnectivity);
    assert_eq!(h.operator.deferred_len(), 1);
    assert!(matches!(&*h.status.borrow(), UnitStatus::Waiting(_)));
    // No file push happened.
    assert!(h.supervisor.pushed(DEFAULT_CONFIG_PATH).is_none());
    assert!(h.supervisor.layers().is_empty());
}

#[tokio::test]
async fn test_config_changed_configures_and_restarts() {
    let mut h = harness(MockSupervisor::new(), true, true);

    h.operator.dispatch(Event::ConfigChanged).await;

    assert_eq!(h.operator.state(), State::Ready);
    assert_eq!(h.operator.deferred_len(), 0);
    assert_eq!(*h.status.borrow(), UnitStatus::Active);

    let pushed = h.supervisor.pushed(DEFAULT_CONFIG_PATH).unwrap();
    assert!(pushed.contains("INTERFACE_NAME = \"eth0\";"));
    assert!(pushed.contains("PORT = 80;"));
    assert!(pushed.contains("HTTP2_PORT = 9090;"));
    assert!(pushed.contains("API_VERSION = \"v1\";"));

    let layers = h.supervisor.layers();
    assert_eq!(layers.len(), 1);
    let spec = layers[0].services.get("nrf").unwrap();
    assert_eq!(spec.command, "/openair-nrf/bin/oai_nrf -c /openair-nrf/etc/nrf.conf -o");
    assert_eq!(spec.override_mode, "replace");

    assert_eq!(h.supervisor.restart_count("nrf"), 1);
    assert!(h.supervisor.is_service_running("nrf").await);
}

#[tokio::test]
async fn test_redelivery_converges_after_connectivity_restored() {
    let mut h = harness(MockSupervisor::disconnected(), true, true);

    h.operator.dispatch(Event::ConfigChanged).await;
    assert_eq!(h.operator.state(), State::WaitingForConnectivity);

    // Nothing changes while the container stays unreachable.
    h.operator.redeliver_deferred().await;
    assert_eq!(h.operator.deferred_len(), 1);

    h.supervisor.set_connected(true);
    h.operator.redeliver_deferred().await;

    assert_eq!(h.operator.state(), State::Ready);
    assert_eq!(h.operator.deferred_len(), 0);
    assert_eq!(*h.status.borrow(), UnitStatus::Active);
    assert!(h.supervisor.pushed(DEFAULT_CONFIG_PATH).is_some());
}

#[tokio::test]
async fn test_supervisor_failure_defers_event() {
    let mut h = harness(MockSupervisor::failing(), true, true);

    h.operator.dispatch(Event::ConfigChanged).await;

    assert!(matches!(&*h.status.borrow(), UnitStatus::Waiting(_)));
    assert_eq!(h.operator.deferred_len(), 1);
    assert_eq!(h.supervisor.restart_count("nrf"), 0);

    // The same event converges once the supervisor recovers.
    h.supervisor.set_fail_io(false);
    h.operator.redeliver_deferred().await;

    assert_eq!(h.operator.state(), State::Ready);
    assert_eq!(*h.status.borrow(), UnitStatus::Active);
    assert_eq!(h.supervisor.restart_count("nrf"), 1);
}

#[tokio::test]
async fn test_invalid_config_is_blocked_not_deferred() {
    let supervisor = Arc::new(MockSupervisor::new());
    let mut config = test_config();
    config.service.interface_name = String::new();
    let (mut operator, status) = Operator::new(
        config,
        Arc::clone(&supervisor) as Arc<dyn WorkloadSupervisor>,
        Arc::new(StaticProbe::new(true)),
        Arc::new(LoggingExposure),
        Arc::new(InMemoryRelationStore::new()),
        true,
    );

    operator.dispatch(Event::ConfigChanged).await;

    // A config that cannot render will not get better by retrying: the
    // unit blocks and the event is dropped, not redelivered.
    assert!(matches!(&*status.borrow(), UnitStatus::Blocked(_)));
    assert_eq!(operator.deferred_len(), 0);
    assert!(supervisor.pushed(DEFAULT_CONFIG_PATH).is_none());
    assert!(supervisor.layers().is_empty());
    assert_eq!(supervisor.restart_count("nrf"), 0);
}

#[tokio::test]
async fn test_relation_joined_defers_until_serving() {
    let mut h = harness(MockSupervisor::new(), false, true);
    let handle = RelationHandle(0);
    h.store.add_relation(handle);

    // Service not yet running: no publish, event deferred.
    h.operator.dispatch(Event::RelationJoined(handle)).await;
    assert_eq!(h.operator.deferred_len(), 1);
    assert_eq!(h.store.write_count(), 0);

    // Start the service; still not listening.
    h.operator.dispatch(Event::ConfigChanged).await;
    h.operator.redeliver_deferred().await;
    assert_eq!(h.operator.deferred_len(), 1);
    assert_eq!(h.store.write_count(), 0);

    // Once running and listening, redelivery publishes.
    h.probe.set_listening(true);
    h.operator.redeliver_deferred().await;
    assert_eq!(h.operator.deferred_len(), 0);
    assert_eq!(h.store.write_count(), 1);
}

#[tokio::test]
async fn test_relation_joined_publishes_expected_record() {
    let mut h = harness(MockSupervisor::new(), true, true);
    let handle = RelationHandle(3);
    h.store.add_relation(handle);

    h.operator.dispatch(Event::ConfigChanged).await;
    h.operator.dispatch(Event::RelationJoined(handle)).await;

    let data = h.store.get(handle).unwrap();
    assert_eq!(data.get("nrf_ipv4_address").map(String::as_str), Some("127.0.0.1"));
    assert_eq!(
        data.get("nrf_fqdn").map(String::as_str),
        Some("nrf.core.svc.cluster.local")
    );
    assert_eq!(data.get("nrf_port").map(String::as_str), Some("80"));
    assert_eq!(data.get("nrf_api_version").map(String::as_str), Some("v1"));

    // Re-delivering the same join writes nothing new.
    h.operator.dispatch(Event::RelationJoined(handle)).await;
    assert_eq!(h.store.write_count(), 1);
}

#[tokio::test]
async fn test_non_leader_relation_joined_is_noop() {
    let mut h = harness(MockSupervisor::new(), true, false);
    let handle = RelationHandle(0);
    h.store.add_relation(handle);

    h.operator.dispatch(Event::ConfigChanged).await;
    h.operator.dispatch(Event::RelationJoined(handle)).await;

    // No publish, no deferral: followers treat relation data as read-only.
    assert_eq!(h.store.write_count(), 0);
    assert_eq!(h.operator.deferred_len(), 0);
}

#[tokio::test]
async fn test_independent_relations_each_get_published() {
    let mut h = harness(MockSupervisor::new(), true, true);
    let udr = RelationHandle(1);
    let udm = RelationHandle(2);
    h.store.add_relation(udr);
    h.store.add_relation(udm);

    h.operator.dispatch(Event::ConfigChanged).await;
    h.operator.dispatch(Event::RelationJoined(udr)).await;
    h.operator.dispatch(Event::RelationJoined(udm)).await;

    assert_eq!(h.store.write_count(), 2);
    for handle in [udr, udm] {
        let data = h.store.get(handle).unwrap();
        assert_eq!(data.len(), 4);
    }
}
