//! End-to-end flow over HTTP: discovery, selection, scan, restart and
//! restore against a live emulated reader service.

use std::sync::Arc;
use std::time::Duration;

use tagport_core::ConnectionStatus;
use tagport_emulator::{EmulatorHandle, EmulatorServer, EmulatorState};
use tagport_network::wire::DeviceRecord;
use tagport_network::{HttpReaderService, ServiceTimeouts};
use tagport_reader::mock::{MemoryDeviceStore, MockRegistry};
use tagport_reader::{
    ConnectionManager, DiscoverySettings, ManagerSettings, RecordingNotifier, RestoreOutcome,
    ScanOutcome, SelectOutcome,
};

const KEY: &str = "e2e-discovery-key";

async fn emulator() -> EmulatorHandle {
    let state = EmulatorState::new(KEY)
        .with_device(DeviceRecord::new("R-01", "COM3", "Gate A"))
        .with_device(DeviceRecord::new("R-02", "COM4", "Gate B"));
    EmulatorServer::new(state)
        .start("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap()
}

fn manager(
    port: u16,
    registry: MockRegistry,
    store: MemoryDeviceStore,
    notifier: Arc<RecordingNotifier>,
) -> ConnectionManager<HttpReaderService, MockRegistry, MemoryDeviceStore> {
    let timeouts = ServiceTimeouts {
        discover: Duration::from_millis(500),
        ..ServiceTimeouts::default()
    };
    let service = HttpReaderService::new(KEY, timeouts).unwrap();

    ConnectionManager::new(service, registry, store, notifier).with_settings(ManagerSettings {
        discovery: DiscoverySettings {
            ports: port..=port,
            ..Default::default()
        },
        ..Default::default()
    })
}

#[tokio::test]
async fn test_discover_select_scan_restore() {
    let emulator = emulator().await;
    let registry = MockRegistry::with_readers(&["R-01"]);
    let store = MemoryDeviceStore::new();
    let notifier = Arc::new(RecordingNotifier::new());

    let first = manager(emulator.port(), registry.clone(), store.clone(), notifier.clone());

    let devices = first.show_device_selection().await;
    assert_eq!(devices.len(), 2);
    assert!(devices[0].is_registered_in_system);
    assert!(!devices[1].is_registered_in_system);

    assert_eq!(first.select(&devices[1]).await, SelectOutcome::NotRegistered);
    assert!(matches!(first.select(&devices[0]).await, SelectOutcome::Connected(_)));
    assert_eq!(
        emulator.with_state(|s| s.selected().map(str::to_string)).as_deref(),
        Some("COM3")
    );

    emulator.with_state(|s| s.present_tags(&["E2000017"]));
    assert_eq!(first.get_tags().await.as_deref(), Some("E2000017"));

    emulator.with_state(|s| s.present_tags(&["E2000017", "E2000018"]));
    assert_eq!(first.scan().await, ScanOutcome::Conflict { count: 2 });

    // A new client on the same store picks the device back up.
    first.shutdown();
    drop(first);
    let second = manager(emulator.port(), registry, store, notifier);
    let outcome = second.initialize().await;
    assert!(matches!(outcome, RestoreOutcome::Restored(ref info) if info.com_port == "COM3"));
    assert_eq!(second.session().status(), ConnectionStatus::Connected);

    second.disconnect().await;
    assert!(!second.has_saved_device().await);

    emulator.shutdown().await;
}

#[tokio::test]
async fn test_restore_after_device_unplugged() {
    let emulator = emulator().await;
    let registry = MockRegistry::with_readers(&["R-01"]);
    let store = MemoryDeviceStore::new();
    let notifier = Arc::new(RecordingNotifier::new());

    let first = manager(emulator.port(), registry.clone(), store.clone(), notifier.clone());
    let devices = first.show_device_selection().await;
    first.select(&devices[0]).await;
    drop(first);

    emulator.with_state(|s| s.detach("COM3"));

    let second = manager(emulator.port(), registry, store, notifier.clone());
    assert_eq!(second.initialize().await, RestoreOutcome::Unavailable);
    assert_eq!(second.session().status(), ConnectionStatus::Disconnected);
    assert!(!second.has_saved_device().await);

    emulator.shutdown().await;
}

#[tokio::test]
async fn test_wrong_key_finds_nothing() {
    let emulator = emulator().await;
    let notifier = Arc::new(RecordingNotifier::new());
    let timeouts = ServiceTimeouts {
        discover: Duration::from_millis(500),
        ..ServiceTimeouts::default()
    };
    let service = HttpReaderService::new("not-the-key", timeouts).unwrap();
    let manager = ConnectionManager::new(
        service,
        MockRegistry::with_readers(&["R-01"]),
        MemoryDeviceStore::new(),
        notifier.clone(),
    )
    .with_settings(ManagerSettings {
        discovery: DiscoverySettings {
            ports: emulator.port()..=emulator.port(),
            ..Default::default()
        },
        ..Default::default()
    });

    assert!(manager.show_device_selection().await.is_empty());
    assert!(notifier.last().unwrap().message.starts_with("No devices found"));

    emulator.shutdown().await;
}
