//! Connection manager.
//!
//! Owns the single connection session of a client and the persisted record
//! of the last connected device. Nothing else writes either of them.
//!
//! # State Machine
//!
//! ```text
//!                 select / restore
//!  Disconnected ─────────────────────▶ Connecting
//!       ▲                                  │
//!       │  SetDevice failed, device        │ SetDevice ok /
//!       │  gone, not registered            │ restore validated
//!       ├──────────────────────────────────┤
//!       │                                  ▼
//!       └────────── disconnect ────────── Connected
//! ```
//!
//! # Outcomes and Notifications
//!
//! Public operations never return errors. Each resolves to an outcome value
//! and emits at most one notification through the configured sink. The
//! startup restore is silent on success.
//!
//! # Concurrency
//!
//! All methods take `&self`; share the manager with `Arc`. A `select` or
//! restore while another connection attempt is in flight is rejected rather
//! than raced. `test_device` and discovery never touch the session.

use crate::discovery::{DiscoverySettings, discover_devices};
use crate::enumerator::enumerate_devices;
use crate::messages::NoticeMessages;
use crate::registration::is_registered;
use crate::scan::{ScanOutcome, classify_tags};
use crate::session::{ActivityState, ConnectionSession, ResetOnDrop};
use crate::traits::{
    ConfigForm, DeviceStore, NotificationSink, ReaderRegistry, RecordNavigator, TagSource,
};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tagport_core::constants::DEVICE_STORAGE_KEY;
use tagport_core::{
    ConnectionStatus, DeviceDescriptor, Notification, PersistedDevice, ReaderInfo, TagportConfig,
};
use tagport_network::{ReaderService, ServiceError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Tunables of a connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    pub discovery: DiscoverySettings,
    /// Key of the persisted device record in the device store.
    pub device_key: String,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            discovery: DiscoverySettings::default(),
            device_key: DEVICE_STORAGE_KEY.to_string(),
        }
    }
}

impl ManagerSettings {
    pub fn from_config(config: &TagportConfig) -> Self {
        Self {
            discovery: DiscoverySettings::from_config(config),
            device_key: config.storage.device_key.clone(),
        }
    }
}

/// Result of the startup restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    NoSavedDevice,
    /// The saved device was found, registered, and is now connected.
    Restored(ReaderInfo),
    /// The saved device is no longer attached to its service.
    Unavailable,
    /// The saved device is no longer in the registry.
    Unregistered,
    /// The device store could not be read.
    Failed(String),
    /// Restore already running, manager shut down, or session busy.
    Skipped,
}

/// Result of [`ConnectionManager::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Connected(ReaderInfo),
    AlreadyConnected,
    NotRegistered,
    /// Another connection attempt is in flight.
    Busy,
    /// `SetDevice` failed.
    Failed(ServiceError),
    /// A disconnect arrived while `SetDevice` was in flight.
    Superseded,
}

struct ClearOnDrop<'a>(&'a AtomicBool);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

enum SelectGate {
    Busy,
    AlreadyConnected,
    Proceed {
        previous: Option<ReaderInfo>,
        attempt: u64,
    },
}

/// Single active connection to a reader device.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tagport_core::ConnectionStatus;
/// use tagport_network::mock::MockReaderService;
/// use tagport_network::wire::DeviceRecord;
/// use tagport_reader::mock::{MemoryDeviceStore, MockRegistry};
/// use tagport_reader::{ConnectionManager, ManagerSettings, RecordingNotifier, SelectOutcome};
///
/// # #[tokio::main]
/// # async fn main() {
/// let service = MockReaderService::new();
/// service.add_service(10005, vec![DeviceRecord::new("R-01", "COM3", "Gate A")]);
///
/// let manager = ConnectionManager::new(
///     service,
///     MockRegistry::with_readers(&["R-01"]),
///     MemoryDeviceStore::new(),
///     Arc::new(RecordingNotifier::new()),
/// )
/// .with_settings(ManagerSettings {
///     discovery: tagport_reader::DiscoverySettings {
///         ports: 10000..=10010,
///         ..Default::default()
///     },
///     ..Default::default()
/// });
///
/// let devices = manager.show_device_selection().await;
/// let outcome = manager.select(&devices[0]).await;
/// assert!(matches!(outcome, SelectOutcome::Connected(_)));
/// assert_eq!(manager.session().status(), ConnectionStatus::Connected);
/// # }
/// ```
pub struct ConnectionManager<S, R, D> {
    service: S,
    registry: R,
    store: D,
    notifier: Arc<dyn NotificationSink>,
    navigator: Option<Arc<dyn RecordNavigator>>,
    settings: ManagerSettings,
    session: watch::Sender<ConnectionSession>,
    activity: watch::Sender<ActivityState>,
    auto_connecting: AtomicBool,
    destroyed: AtomicBool,
}

impl<S, R, D> ConnectionManager<S, R, D>
where
    S: ReaderService,
    R: ReaderRegistry,
    D: DeviceStore,
{
    pub fn new(service: S, registry: R, store: D, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            service,
            registry,
            store,
            notifier,
            navigator: None,
            settings: ManagerSettings::default(),
            session: watch::Sender::new(ConnectionSession::default()),
            activity: watch::Sender::new(ActivityState::default()),
            auto_connecting: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ManagerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Enable [`open_device_config`](Self::open_device_config).
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn RecordNavigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Snapshot of the connection session.
    #[must_use]
    pub fn session(&self) -> ConnectionSession {
        self.session.borrow().clone()
    }

    /// Receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSession> {
        self.session.subscribe()
    }

    #[must_use]
    pub fn activity(&self) -> ActivityState {
        self.activity.borrow().clone()
    }

    pub fn subscribe_activity(&self) -> watch::Receiver<ActivityState> {
        self.activity.subscribe()
    }

    /// Label of the connect/disconnect action for the current status.
    #[must_use]
    pub fn action_label(&self) -> &'static str {
        self.session.borrow().status().action_label()
    }

    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    async fn load_saved(&self) -> crate::Result<Option<PersistedDevice>> {
        let Some(raw) = self.store.get(&self.settings.device_key).await? else {
            return Ok(None);
        };

        match PersistedDevice::from_json(&raw) {
            Ok(saved) => Ok(Some(saved)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable saved device");
                Ok(None)
            }
        }
    }

    async fn save_device(&self, info: &ReaderInfo) {
        let record = match PersistedDevice::from_reader(info, Utc::now()) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Not saving incomplete reader info");
                return;
            }
        };

        let result = match record.to_json() {
            Ok(json) => self.store.set(&self.settings.device_key, &json).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => debug!(reader_id = %info.reader_id, "Saved device"),
            Err(e) => error!(error = %e, "Failed to save device"),
        }
    }

    async fn forget_saved(&self) {
        if let Err(e) = self.store.remove(&self.settings.device_key).await {
            error!(error = %e, "Failed to remove saved device");
        }
    }

    /// True when a readable device record is stored.
    pub async fn has_saved_device(&self) -> bool {
        matches!(self.load_saved().await, Ok(Some(_)))
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Restore the saved device, if any.
    ///
    /// The saved device must still be attached to its service (same reader
    /// id and com port) and still be registered. A device that fails either
    /// check is forgotten. `SetDevice` is not called; the service keeps the
    /// selection from the previous session.
    pub async fn initialize(&self) -> RestoreOutcome {
        if self.destroyed.load(Ordering::Acquire) {
            debug!("Manager shut down, skipping restore");
            return RestoreOutcome::Skipped;
        }
        if self.auto_connecting.swap(true, Ordering::AcqRel) {
            debug!("Restore already running");
            return RestoreOutcome::Skipped;
        }

        let _running = ClearOnDrop(&self.auto_connecting);
        self.restore_saved_device().await
    }

    async fn restore_saved_device(&self) -> RestoreOutcome {
        let saved = match self.load_saved().await {
            Ok(Some(saved)) => saved,
            Ok(None) => return RestoreOutcome::NoSavedDevice,
            Err(e) => {
                error!(error = %e, "Failed to read saved device");
                self.notify(Notification::danger(NoticeMessages::restore_failed(&e)));
                return RestoreOutcome::Failed(e.to_string());
            }
        };

        let mut attempt = None;
        self.session.send_if_modified(|s| {
            attempt = s.begin_connecting();
            attempt.is_some()
        });
        let Some(attempt) = attempt else {
            debug!("Session busy, skipping restore");
            return RestoreOutcome::Skipped;
        };
        info!(reader_id = %saved.reader_id, endpoint = %saved.endpoint(), "Restoring saved device");

        let found = enumerate_devices(&self.service, &saved.endpoint())
            .await
            .into_iter()
            .find(|d| d.reader_id == saved.reader_id && d.com_port == saved.com_port);

        let Some(found) = found else {
            warn!(reader_id = %saved.reader_id, "Saved device no longer attached");
            self.abandon_restore(attempt).await;
            self.notify(Notification::warning(NoticeMessages::SAVED_DEVICE_UNAVAILABLE));
            return RestoreOutcome::Unavailable;
        };

        if !is_registered(&self.registry, &found.reader_id).await {
            warn!(reader_id = %found.reader_id, "Saved device no longer registered");
            self.abandon_restore(attempt).await;
            self.notify(
                Notification::warning(NoticeMessages::restore_unregistered(&found.reader_id))
                    .sticky(),
            );
            return RestoreOutcome::Unregistered;
        }

        let reader_name = if found.reader_name.is_empty() {
            saved.reader_name
        } else {
            found.reader_name
        };
        let info = ReaderInfo {
            reader_id: found.reader_id,
            com_port: found.com_port,
            reader_name,
            host: saved.host,
            port: saved.port,
        };

        if !self.session.send_if_modified(|s| s.complete(attempt, info.clone())) {
            debug!("Restore superseded");
            return RestoreOutcome::Skipped;
        }
        self.save_device(&info).await;
        info!(reader = %info, "Restored connection");
        RestoreOutcome::Restored(info)
    }

    /// Forget the saved device unless the restore was already superseded.
    async fn abandon_restore(&self, attempt: u64) {
        if self.session.send_if_modified(|s| s.abandon(attempt)) {
            self.forget_saved().await;
        }
    }

    /// Mark the manager as torn down. Later restores are no-ops.
    pub fn shutdown(&self) {
        self.destroyed.store(true, Ordering::Release);
        debug!("Connection manager shut down");
    }

    // ------------------------------------------------------------------
    // Discovery and device actions
    // ------------------------------------------------------------------

    /// Run a fresh discovery pass. Does not touch the session.
    pub async fn show_device_selection(&self) -> Vec<DeviceDescriptor> {
        let _discovering = ResetOnDrop::new(
            &self.activity,
            |a| a.is_discovering = true,
            |a| a.is_discovering = false,
        );

        let devices =
            discover_devices(&self.service, &self.registry, &self.settings.discovery).await;
        if devices.is_empty() {
            self.notify(Notification::warning(NoticeMessages::NO_DEVICES_FOUND));
        }
        devices
    }

    /// Probe `device` without selecting it. Does not touch the session.
    pub async fn test_device(&self, device: &DeviceDescriptor) -> bool {
        let reader_id = device.reader_id.clone();
        let _testing = ResetOnDrop::new(
            &self.activity,
            move |a| a.testing_device = Some(reader_id),
            |a| a.testing_device = None,
        );

        match self
            .service
            .test_device(&device.endpoint(), &device.com_port)
            .await
        {
            Ok(()) => {
                self.notify(Notification::success(NoticeMessages::test_succeeded(
                    &device.reader_id,
                    &device.com_port,
                )));
                true
            }
            Err(e) => {
                debug!(reader_id = %device.reader_id, error = %e, "Device test failed");
                self.notify(Notification::warning(NoticeMessages::test_failed(
                    &device.reader_id,
                    &e,
                )));
                false
            }
        }
    }

    /// Open the configuration form of `device`'s registry record.
    ///
    /// Returns the id of the opened record.
    pub async fn open_device_config(&self, device: &DeviceDescriptor) -> Option<i64> {
        if !device.is_registered_in_system {
            self.notify(Notification::warning(NoticeMessages::config_unregistered(
                &device.reader_id,
            )));
            return None;
        }

        let Some(navigator) = &self.navigator else {
            warn!("No record navigator configured");
            self.notify(Notification::warning(NoticeMessages::CONFIG_UNAVAILABLE));
            return None;
        };

        let ids = match self.registry.find_ids_by_reader_id(&device.reader_id).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(reader_id = %device.reader_id, error = %e, "Registry lookup failed");
                self.notify(Notification::danger(NoticeMessages::config_error(&e)));
                return None;
            }
        };

        let Some(&record_id) = ids.first() else {
            self.notify(Notification::warning(NoticeMessages::config_unsupported(
                &device.reader_id,
            )));
            return None;
        };

        let form = ConfigForm {
            record_id,
            title: NoticeMessages::config_title(&device.reader_id),
            reader_id: device.reader_id.clone(),
            ip_address: device.host.clone(),
            port: device.port,
            com_port: device.com_port.clone(),
        };

        match navigator.open_config_form(form) {
            Ok(()) => Some(record_id),
            Err(e) => {
                self.notify(Notification::danger(NoticeMessages::config_error(&e)));
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------

    /// Connect to `device`.
    ///
    /// Unregistered devices are refused before any state change. Selecting
    /// the connected device again is a no-op. Selecting a different device
    /// while connected releases the current one first, silently.
    pub async fn select(&self, device: &DeviceDescriptor) -> SelectOutcome {
        if !device.is_registered_in_system {
            self.notify(Notification::warning(NoticeMessages::select_unregistered(
                &device.reader_id,
            )));
            return SelectOutcome::NotRegistered;
        }

        let mut gate = SelectGate::Busy;
        self.session.send_if_modified(|session| {
            let status = session.status();
            let same = session
                .reader_info()
                .is_some_and(|current| current.is_same_device(device));

            gate = match status {
                ConnectionStatus::Connecting => SelectGate::Busy,
                ConnectionStatus::Connected if same => SelectGate::AlreadyConnected,
                _ => {
                    let previous = session.reset();
                    match session.begin_connecting() {
                        Some(attempt) => SelectGate::Proceed { previous, attempt },
                        None => SelectGate::Busy,
                    }
                }
            };
            matches!(gate, SelectGate::Proceed { .. })
        });

        let (previous, attempt) = match gate {
            SelectGate::Busy => {
                self.notify(Notification::warning(NoticeMessages::CONNECTION_IN_PROGRESS));
                return SelectOutcome::Busy;
            }
            SelectGate::AlreadyConnected => {
                self.notify(Notification::info(NoticeMessages::already_connected(
                    &device.reader_name,
                    &device.com_port,
                )));
                return SelectOutcome::AlreadyConnected;
            }
            SelectGate::Proceed { previous, attempt } => (previous, attempt),
        };

        if let Some(previous) = previous {
            info!(reader_id = %previous.reader_id, "Releasing previous reader");
            self.forget_saved().await;
        }

        info!(reader_id = %device.reader_id, com_port = %device.com_port, "Selecting device");
        match self
            .service
            .set_device(&device.endpoint(), &device.com_port)
            .await
        {
            Ok(_) => {
                let info = device.reader_info();
                if !self
                    .session
                    .send_if_modified(|s| s.complete(attempt, info.clone()))
                {
                    info!(reader_id = %info.reader_id, "Connection attempt superseded");
                    return SelectOutcome::Superseded;
                }
                self.save_device(&info).await;
                self.notify(Notification::success(NoticeMessages::connected(&info)));
                SelectOutcome::Connected(info)
            }
            Err(e) => {
                warn!(reader_id = %device.reader_id, error = %e, "SetDevice failed");
                self.session.send_if_modified(|s| s.abandon(attempt));
                self.notify(Notification::danger(NoticeMessages::connection_error(&e)));
                SelectOutcome::Failed(e)
            }
        }
    }

    /// Drop the connection and forget the saved device. Always succeeds.
    pub async fn disconnect(&self) {
        let mut previous = None;
        self.session.send_modify(|s| previous = s.reset());
        self.forget_saved().await;

        let reader_id = previous.map_or_else(|| "Unknown".to_string(), |r| r.reader_id);
        info!(reader_id = %reader_id, "Disconnected");
        self.notify(Notification::info(NoticeMessages::disconnected(&reader_id)));
    }

    // ------------------------------------------------------------------
    // Tag scan
    // ------------------------------------------------------------------

    /// Read the tags in front of the connected reader and classify them.
    pub async fn scan(&self) -> ScanOutcome {
        let reader = self.session.borrow().connected_reader().cloned();

        let outcome = match reader {
            None => ScanOutcome::NotConnected,
            Some(reader) => {
                let _scanning = ResetOnDrop::new(
                    &self.session,
                    |s| s.set_scanning(true),
                    |s| s.set_scanning(false),
                );
                match self.service.read_tags(&reader.endpoint()).await {
                    Ok(tags) => classify_tags(tags),
                    Err(e) => {
                        debug!(reader_id = %reader.reader_id, error = %e, "Read failed");
                        ScanOutcome::Failed(e)
                    }
                }
            }
        };

        if let Some(notification) = outcome.notification() {
            self.notify(notification);
        }
        outcome
    }

    /// The single tag in front of the reader, or `None`.
    pub async fn get_tags(&self) -> Option<String> {
        self.scan().await.into_tag()
    }
}

impl<S, R, D> TagSource for ConnectionManager<S, R, D>
where
    S: ReaderService,
    R: ReaderRegistry,
    D: DeviceStore,
{
    async fn current_tag(&self) -> Option<String> {
        self.get_tags().await
    }
}
