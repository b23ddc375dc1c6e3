//! Collaborator trait definitions.
//!
//! The connection manager owns the connection state machine but delegates
//! everything outside it: registry lookups, local persistence, user-facing
//! notifications, opening a configuration form, and backend tag assignment.
//!
//! Async collaborators use native `async fn` methods (Edition 2024 RPITIT)
//! and are consumed generically. Notification and navigation are synchronous
//! and object-safe so a single sink can be shared as `Arc<dyn _>`.

#![allow(async_fn_in_trait)]

use crate::assignment::{AssignResponse, AssignTarget};
use crate::error::Result;
use tagport_core::Notification;

/// Backend registry of reader records.
pub trait ReaderRegistry {
    /// Number of records whose reader id equals `reader_id`.
    async fn count_by_reader_id(&self, reader_id: &str) -> Result<u64>;

    /// Ids of records whose reader id equals `reader_id`.
    async fn find_ids_by_reader_id(&self, reader_id: &str) -> Result<Vec<i64>>;
}

/// Key/value store scoped to the local client.
pub trait DeviceStore {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// User-facing notification sink.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Request to open the configuration form of a reader record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigForm {
    /// Registry record to open.
    pub record_id: i64,
    pub title: String,
    /// Form defaults, taken from the discovered device.
    pub reader_id: String,
    pub ip_address: String,
    pub port: u16,
    pub com_port: String,
}

/// Opens a record's configuration form.
pub trait RecordNavigator: Send + Sync {
    fn open_config_form(&self, form: ConfigForm) -> Result<()>;
}

/// Something that can produce the tag currently in front of a reader.
pub trait TagSource {
    /// Scan once. `None` covers every non-success outcome; the source is
    /// expected to have notified the user about it already.
    async fn current_tag(&self) -> Option<String>;
}

/// Backend operation that binds a tag to a partner or a vehicle.
pub trait TagAssigner {
    /// `Ok` with `success: false` is a business rejection (tag already in
    /// use, unknown target); `Err` is a transport or backend failure.
    async fn assign(&self, target: AssignTarget, tag: &str) -> Result<AssignResponse>;
}
