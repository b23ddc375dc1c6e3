//! Integration tests for the connection manager against in-memory
//! collaborators.
//!
//! Covers the connection lifecycle (select, disconnect, startup restore),
//! device actions (test, configure), tag scans and the scan-and-assign
//! workflow through the reader locator.

use std::sync::Arc;
use std::time::Duration;

use tagport_core::constants::DEVICE_STORAGE_KEY;
use tagport_core::{ConnectionStatus, DeviceDescriptor, PersistedDevice, ReaderInfo, Severity};
use tagport_network::ServiceError;
use tagport_network::mock::MockReaderService;
use tagport_network::wire::DeviceRecord;
use tagport_reader::mock::{MemoryDeviceStore, MockRegistry, MockTagAssigner, RecordingNavigator};
use tagport_reader::{
    AssignOutcome, AssignTarget, ConnectionManager, DiscoverySettings, ManagerSettings,
    ReaderLocator, RecordingNotifier, RestoreOutcome, ScanOutcome, SelectOutcome,
    scan_and_assign,
};

// ============================================================================
// Harness
// ============================================================================

const PORT: u16 = 10005;
const OTHER_PORT: u16 = 10007;

type Manager = ConnectionManager<MockReaderService, MockRegistry, MemoryDeviceStore>;

struct Harness {
    manager: Manager,
    service: MockReaderService,
    registry: MockRegistry,
    store: MemoryDeviceStore,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    fn new() -> Self {
        Self::with_ports(10000..=10010)
    }

    fn with_ports(ports: std::ops::RangeInclusive<u16>) -> Self {
        let service = MockReaderService::new();
        let registry = MockRegistry::new();
        let store = MemoryDeviceStore::new();
        let notifier = Arc::new(RecordingNotifier::new());

        let manager = ConnectionManager::new(
            service.clone(),
            registry.clone(),
            store.clone(),
            notifier.clone(),
        )
        .with_settings(ManagerSettings {
            discovery: DiscoverySettings {
                ports,
                ..Default::default()
            },
            ..Default::default()
        });

        Self {
            manager,
            service,
            registry,
            store,
            notifier,
        }
    }

    fn saved(&self) -> Option<PersistedDevice> {
        self.store
            .value(DEVICE_STORAGE_KEY)
            .map(|raw| PersistedDevice::from_json(&raw).unwrap())
    }

    fn save(&self, info: &ReaderInfo) {
        let record = PersistedDevice::from_reader(info, chrono::Utc::now()).unwrap();
        self.store
            .insert(DEVICE_STORAGE_KEY, &record.to_json().unwrap());
    }
}

fn device(reader_id: &str, com_port: &str, port: u16, registered: bool) -> DeviceDescriptor {
    DeviceDescriptor {
        reader_id: reader_id.to_string(),
        com_port: com_port.to_string(),
        reader_name: format!("Reader {reader_id}"),
        host: "127.0.0.1".to_string(),
        port,
        is_registered_in_system: registered,
    }
}

fn record(reader_id: &str, com_port: &str) -> DeviceRecord {
    DeviceRecord::new(reader_id, com_port, format!("Reader {reader_id}"))
}

/// Harness with one registered device on `PORT`.
fn single_device() -> (Harness, DeviceDescriptor) {
    let h = Harness::new();
    h.service.add_service(PORT, vec![record("R-01", "COM3")]);
    h.registry.add_reader("R-01");
    (h, device("R-01", "COM3", PORT, true))
}

// ============================================================================
// Select
// ============================================================================

#[tokio::test]
async fn test_select_unregistered_changes_nothing() {
    let (h, _) = single_device();
    let stranger = device("R-99", "COM3", PORT, false);

    let outcome = h.manager.select(&stranger).await;

    assert_eq!(outcome, SelectOutcome::NotRegistered);
    assert_eq!(h.manager.session().status(), ConnectionStatus::Disconnected);
    assert!(h.saved().is_none());
    assert!(h.service.set_device_calls().is_empty());

    let last = h.notifier.last().unwrap();
    assert_eq!(last.severity, Severity::Warning);
    assert!(last.message.contains("R-99"));
}

#[tokio::test]
async fn test_select_persists_device() {
    let (h, target) = single_device();
    let before = chrono::Utc::now();

    let outcome = h.manager.select(&target).await;

    assert!(matches!(outcome, SelectOutcome::Connected(_)));
    let session = h.manager.session();
    assert_eq!(session.status(), ConnectionStatus::Connected);
    assert_eq!(session.reader_info(), Some(&target.reader_info()));
    assert_eq!(h.service.selected(PORT).as_deref(), Some("COM3"));

    let saved = h.saved().unwrap();
    assert_eq!(saved.host, "127.0.0.1");
    assert_eq!(saved.port, PORT);
    assert_eq!(saved.reader_id, "R-01");
    assert_eq!(saved.com_port, "COM3");
    assert_eq!(saved.reader_name, "Reader R-01");
    assert!(saved.last_connected >= before);

    let last = h.notifier.last().unwrap();
    assert_eq!(last.severity, Severity::Success);
    assert!(last.message.starts_with("Connected to Reader"));
    assert_eq!(h.manager.action_label(), "Disconnect");
}

#[tokio::test]
async fn test_select_same_device_is_noop() {
    let (h, target) = single_device();
    h.manager.select(&target).await;

    let outcome = h.manager.select(&target).await;

    assert_eq!(outcome, SelectOutcome::AlreadyConnected);
    assert_eq!(h.service.set_device_calls().len(), 1);
    assert_eq!(h.notifier.last().unwrap().severity, Severity::Info);
    assert!(h.manager.session().is_connected());
}

#[tokio::test]
async fn test_select_other_device_switches_silently() {
    let (h, first) = single_device();
    h.service.add_service(OTHER_PORT, vec![record("R-02", "COM5")]);
    h.registry.add_reader("R-02");
    let second = device("R-02", "COM5", OTHER_PORT, true);

    h.manager.select(&first).await;
    h.notifier.take();

    let outcome = h.manager.select(&second).await;

    assert!(matches!(outcome, SelectOutcome::Connected(ref info) if info.reader_id == "R-02"));
    assert_eq!(h.saved().unwrap().reader_id, "R-02");
    // Only the new connection is announced; the release of the old one is not.
    let seen = h.notifier.notifications();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].severity, Severity::Success);
}

#[tokio::test]
async fn test_select_failure_resets_session() {
    let (h, target) = single_device();
    h.service.fail_set_device(
        PORT,
        ServiceError::rejected(Some("Port busy".into()), "Unable to select device"),
    );

    let outcome = h.manager.select(&target).await;

    assert!(matches!(outcome, SelectOutcome::Failed(_)));
    assert_eq!(h.manager.session().status(), ConnectionStatus::Disconnected);
    assert!(h.saved().is_none());

    let last = h.notifier.last().unwrap();
    assert_eq!(last.severity, Severity::Danger);
    assert_eq!(last.message, "Connection error: Port busy");
}

#[tokio::test(start_paused = true)]
async fn test_select_while_connecting_is_busy() {
    let (h, target) = single_device();
    h.service.delay_set_device(PORT, Duration::from_millis(500));

    let (first, second) = tokio::join!(h.manager.select(&target), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(h.manager.session().status(), ConnectionStatus::Connecting);
        assert_eq!(h.manager.action_label(), "Connecting...");
        h.manager.select(&target).await
    });

    assert!(matches!(first, SelectOutcome::Connected(_)));
    assert_eq!(second, SelectOutcome::Busy);
    assert_eq!(h.service.set_device_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_during_select_supersedes() {
    let (h, target) = single_device();
    h.service.delay_set_device(PORT, Duration::from_millis(500));

    let (outcome, ()) = tokio::join!(h.manager.select(&target), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.manager.disconnect().await;
    });

    assert_eq!(outcome, SelectOutcome::Superseded);
    assert_eq!(h.manager.session().status(), ConnectionStatus::Disconnected);
    assert!(h.saved().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_select_cannot_finish_a_later_one() {
    let (h, first_target) = single_device();
    h.service.add_service(OTHER_PORT, vec![record("R-02", "COM5")]);
    h.registry.add_reader("R-02");
    let second_target = device("R-02", "COM5", OTHER_PORT, true);
    h.service.delay_set_device(PORT, Duration::from_millis(500));
    h.service.delay_set_device(OTHER_PORT, Duration::from_millis(1000));

    let (first, second) = tokio::join!(h.manager.select(&first_target), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.manager.disconnect().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.manager.select(&second_target).await
    });

    assert_eq!(first, SelectOutcome::Superseded);
    assert!(matches!(second, SelectOutcome::Connected(ref info) if info.reader_id == "R-02"));

    let session = h.manager.session();
    assert_eq!(
        session.connected_reader().map(|r| r.reader_id.as_str()),
        Some("R-02")
    );
    assert_eq!(h.saved().map(|d| d.reader_id), Some("R-02".to_string()));

    let successes = h
        .notifier
        .notifications()
        .into_iter()
        .filter(|n| n.severity == Severity::Success)
        .count();
    assert_eq!(successes, 1);
}

// ============================================================================
// Disconnect
// ============================================================================

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let (h, target) = single_device();
    h.manager.select(&target).await;

    h.manager.disconnect().await;
    let after_first = h.manager.session();
    h.manager.disconnect().await;

    assert_eq!(h.manager.session(), after_first);
    assert_eq!(after_first.status(), ConnectionStatus::Disconnected);
    assert!(after_first.reader_info().is_none());
    assert!(h.saved().is_none());

    let seen = h.notifier.notifications();
    let n = seen.len();
    assert_eq!(seen[n - 2].message, "Disconnected from Reader R-01");
    assert_eq!(seen[n - 1].message, "Disconnected from Reader Unknown");
}

#[tokio::test]
async fn test_session_changes_are_observable() {
    let (h, target) = single_device();
    let mut rx = h.manager.subscribe();

    h.manager.select(&target).await;
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_connected());

    h.manager.disconnect().await;
    assert!(rx.has_changed().unwrap());
    assert!(!rx.borrow_and_update().is_connected());
}

// ============================================================================
// Startup restore
// ============================================================================

#[tokio::test]
async fn test_restore_without_saved_device() {
    let (h, _) = single_device();
    assert_eq!(h.manager.initialize().await, RestoreOutcome::NoSavedDevice);
    assert_eq!(h.notifier.count(), 0);
    assert_eq!(h.manager.session().status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_restore_reconnects_silently() {
    let (h, target) = single_device();
    h.service
        .set_devices(PORT, vec![DeviceRecord::new("R-01", "COM3", "Renamed Gate")]);
    h.save(&target.reader_info());

    let outcome = h.manager.initialize().await;

    let RestoreOutcome::Restored(info) = outcome else {
        panic!("expected restore, got {outcome:?}");
    };
    assert_eq!(info.reader_name, "Renamed Gate");
    assert!(h.manager.session().is_connected());
    assert_eq!(h.saved().unwrap().reader_name, "Renamed Gate");
    assert!(h.service.set_device_calls().is_empty());
    assert_eq!(h.notifier.count(), 0);
}

#[tokio::test]
async fn test_restore_device_gone() {
    let (h, target) = single_device();
    h.save(&target.reader_info());
    h.service.set_devices(PORT, vec![record("R-01", "COM4")]);

    let outcome = h.manager.initialize().await;

    assert_eq!(outcome, RestoreOutcome::Unavailable);
    assert_eq!(h.manager.session().status(), ConnectionStatus::Disconnected);
    assert!(h.saved().is_none());
    assert_eq!(
        h.notifier.last().unwrap().message,
        "Saved device is unavailable. Please reconnect."
    );
}

#[tokio::test]
async fn test_restore_service_gone() {
    let (h, target) = single_device();
    h.save(&target.reader_info());
    h.service.remove_service(PORT);

    assert_eq!(h.manager.initialize().await, RestoreOutcome::Unavailable);
    assert!(h.saved().is_none());
}

#[tokio::test]
async fn test_restore_unregistered_is_sticky() {
    let (h, target) = single_device();
    h.save(&target.reader_info());
    h.registry.remove_reader("R-01");

    let outcome = h.manager.initialize().await;

    assert_eq!(outcome, RestoreOutcome::Unregistered);
    assert!(h.saved().is_none());
    let last = h.notifier.last().unwrap();
    assert!(last.sticky);
    assert_eq!(last.severity, Severity::Warning);
}

#[tokio::test]
async fn test_restore_ignores_corrupt_record() {
    let (h, _) = single_device();
    h.store.insert(DEVICE_STORAGE_KEY, "{not json");

    assert_eq!(h.manager.initialize().await, RestoreOutcome::NoSavedDevice);
    assert!(!h.manager.has_saved_device().await);
}

#[tokio::test]
async fn test_restore_store_failure() {
    let (h, target) = single_device();
    h.save(&target.reader_info());
    h.store.set_failing(true);

    let outcome = h.manager.initialize().await;

    assert!(matches!(outcome, RestoreOutcome::Failed(_)));
    assert_eq!(h.notifier.last().unwrap().severity, Severity::Danger);
    assert_eq!(h.manager.session().status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_restore_after_shutdown_is_skipped() {
    let (h, target) = single_device();
    h.save(&target.reader_info());
    h.manager.shutdown();

    assert_eq!(h.manager.initialize().await, RestoreOutcome::Skipped);
    assert!(h.service.get_devices_calls().is_empty());
}

#[tokio::test]
async fn test_restore_while_connected_is_skipped() {
    let (h, target) = single_device();
    h.manager.select(&target).await;

    assert_eq!(h.manager.initialize().await, RestoreOutcome::Skipped);
    assert!(h.manager.session().is_connected());
}

// ============================================================================
// Discovery and device actions
// ============================================================================

#[tokio::test]
async fn test_discovery_reports_only_responding_ports() {
    let h = Harness::with_ports(10000..=11000);
    h.service
        .add_service(10005, vec![record("R-01", "COM3"), record("R-02", "COM4")]);
    h.service.add_service(10432, vec![record("R-03", "COM1")]);
    h.registry.add_reader("R-01");
    h.registry.add_reader("R-03");

    let devices = h.manager.show_device_selection().await;

    let summary: Vec<_> = devices
        .iter()
        .map(|d| (d.port, d.reader_id.as_str(), d.is_registered_in_system))
        .collect();
    assert_eq!(
        summary,
        vec![
            (10005, "R-01", true),
            (10005, "R-02", false),
            (10432, "R-03", true),
        ]
    );
    assert_eq!(h.service.discover_calls(), 1001);
    assert_eq!(h.service.get_devices_calls(), vec![10005, 10432]);
    assert!(!h.manager.activity().is_discovering);
    assert_eq!(h.notifier.count(), 0);
}

#[tokio::test]
async fn test_discovery_with_nothing_found_warns() {
    let h = Harness::new();

    let devices = h.manager.show_device_selection().await;

    assert!(devices.is_empty());
    let last = h.notifier.last().unwrap();
    assert_eq!(last.severity, Severity::Warning);
    assert!(last.message.starts_with("No devices found"));
}

#[tokio::test]
async fn test_registry_outage_marks_devices_unregistered() {
    let (h, _) = single_device();
    h.registry.set_failing(true);

    let devices = h.manager.show_device_selection().await;

    assert_eq!(devices.len(), 1);
    assert!(!devices[0].is_registered_in_system);
}

#[tokio::test]
async fn test_device_test_does_not_touch_session() {
    let (h, target) = single_device();

    assert!(h.manager.test_device(&target).await);
    assert_eq!(
        h.notifier.last().unwrap().message,
        "Test succeeded for R-01 (COM3)."
    );

    h.service.fail_test_device(PORT, ServiceError::rejected(None, "Test failed"));
    assert!(!h.manager.test_device(&target).await);
    assert_eq!(
        h.notifier.last().unwrap().message,
        "Test failed for R-01: Test failed"
    );

    assert_eq!(h.manager.session().status(), ConnectionStatus::Disconnected);
    assert!(h.manager.activity().testing_device.is_none());
}

#[tokio::test]
async fn test_open_config_for_registered_device() {
    let (h, target) = single_device();
    let navigator = Arc::new(RecordingNavigator::new());
    let manager = ConnectionManager::new(
        h.service.clone(),
        h.registry.clone(),
        h.store.clone(),
        h.notifier.clone(),
    )
    .with_navigator(navigator.clone());

    assert_eq!(manager.open_device_config(&target).await, Some(1));

    let opened = navigator.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].title, "Configure R-01");
    assert_eq!(opened[0].ip_address, "127.0.0.1");
    assert_eq!(opened[0].port, PORT);
    assert_eq!(opened[0].com_port, "COM3");
}

#[tokio::test]
async fn test_open_config_refusals() {
    let (h, target) = single_device();

    // No navigator configured.
    assert_eq!(h.manager.open_device_config(&target).await, None);
    assert_eq!(h.notifier.last().unwrap().severity, Severity::Warning);

    let stranger = device("R-99", "COM9", PORT, false);
    assert_eq!(h.manager.open_device_config(&stranger).await, None);
    assert!(h.notifier.last().unwrap().message.contains("not registered"));
}

// ============================================================================
// Tag scan and assignment
// ============================================================================

#[tokio::test]
async fn test_scan_requires_connection() {
    let (h, _) = single_device();

    assert_eq!(h.manager.scan().await, ScanOutcome::NotConnected);
    assert_eq!(h.service.read_calls(), 0);
    assert_eq!(
        h.notifier.last().unwrap().message,
        "Not connected to the reader service"
    );
}

#[tokio::test]
async fn test_scan_single_and_multiple_tags() {
    let (h, target) = single_device();
    h.manager.select(&target).await;

    h.service.present_tags(PORT, &["E2000017"]);
    assert_eq!(h.manager.get_tags().await.as_deref(), Some("E2000017"));

    h.service.present_tags(PORT, &["E2000017", "E2000018"]);
    assert_eq!(h.manager.get_tags().await, None);
    assert_eq!(h.notifier.last().unwrap().severity, Severity::Warning);

    h.service.present_tags(PORT, &[]);
    assert_eq!(h.manager.scan().await, ScanOutcome::NoTag);
    assert!(!h.manager.session().is_scanning());
}

#[tokio::test(start_paused = true)]
async fn test_scan_flag_is_set_while_reading() {
    let (h, target) = single_device();
    h.manager.select(&target).await;
    h.service.present_tags(PORT, &["E2000017"]);
    h.service.delay_read(PORT, Duration::from_millis(200));

    let (tag, ()) = tokio::join!(h.manager.get_tags(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(h.manager.session().is_scanning());
    });

    assert_eq!(tag.as_deref(), Some("E2000017"));
    assert!(!h.manager.session().is_scanning());
}

#[tokio::test]
async fn test_scan_timeout_is_a_warning() {
    let (h, target) = single_device();
    h.manager.select(&target).await;
    h.service.fail_read(PORT, ServiceError::timeout("read", 5000));

    assert!(matches!(h.manager.scan().await, ScanOutcome::Failed(_)));
    let last = h.notifier.last().unwrap();
    assert_eq!(last.severity, Severity::Warning);
    assert_eq!(last.message, "Timeout while reading tag");
}

#[tokio::test]
async fn test_scan_and_assign_through_locator() {
    let (h, target) = single_device();
    let notifier = h.notifier.clone();
    let service = h.service.clone();
    let manager = Arc::new(h.manager);
    manager.select(&target).await;
    service.present_tags(PORT, &["E2000017"]);

    let locator = ReaderLocator::new();
    locator.register(manager.clone());
    let assigner = MockTagAssigner::new();

    let outcome =
        scan_and_assign(&locator, &assigner, notifier.as_ref(), AssignTarget::Vehicle(4)).await;

    assert!(outcome.is_assigned());
    assert_eq!(
        assigner.calls(),
        vec![(AssignTarget::Vehicle(4), "E2000017".to_string())]
    );

    assert!(locator.unregister(&manager));
    let outcome =
        scan_and_assign(&locator, &assigner, notifier.as_ref(), AssignTarget::Vehicle(4)).await;
    assert_eq!(outcome, AssignOutcome::ReaderUnavailable);
}
