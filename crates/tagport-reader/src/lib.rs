//! Reader discovery and connection management.
//!
//! This crate finds RFID reader services on the local machine, lists the
//! reader devices attached to them, and keeps one active connection per
//! client, restoring it across restarts.
//!
//! # Overview
//!
//! - [`discovery`] probes a port range with bounded concurrency and returns
//!   every device of every acknowledging service, annotated with whether the
//!   reader is registered in the backend.
//! - [`ConnectionManager`] owns the connection session: select, disconnect,
//!   startup restore, device test, configuration and tag scan.
//! - [`ReaderLocator`] exposes the active manager to record workflows, and
//!   [`assignment::scan_and_assign`] binds the scanned tag to a record.
//!
//! Collaborators outside the reader service (registry, device store,
//! notifications, navigation, tag assignment) are traits in [`traits`];
//! in-memory implementations live in [`mock`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tagport_network::HttpReaderService;
//! use tagport_reader::mock::{MemoryDeviceStore, MockRegistry};
//! use tagport_reader::{ConnectionManager, TracingNotifier};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = HttpReaderService::new("my-discovery-key", Default::default())?;
//! let manager = ConnectionManager::new(
//!     service,
//!     MockRegistry::with_readers(&["R-01"]),
//!     MemoryDeviceStore::new(),
//!     Arc::new(TracingNotifier),
//! );
//!
//! manager.initialize().await;
//! if !manager.session().is_connected() {
//!     let devices = manager.show_device_selection().await;
//!     if let Some(device) = devices.iter().find(|d| d.is_registered_in_system) {
//!         manager.select(device).await;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod assignment;
pub mod discovery;
pub mod enumerator;
pub mod error;
pub mod locator;
pub mod manager;
pub mod messages;
pub mod mock;
pub mod notify;
pub mod registration;
pub mod runner;
pub mod scan;
pub mod session;
pub mod traits;

pub use assignment::{AssignOutcome, AssignResponse, AssignTarget, scan_and_assign};
pub use discovery::{DiscoverySettings, discover_devices, scan_ports};
pub use error::{ReaderError, Result};
pub use locator::ReaderLocator;
pub use manager::{ConnectionManager, ManagerSettings, RestoreOutcome, SelectOutcome};
pub use notify::{RecordingNotifier, TracingNotifier};
pub use runner::BoundedRunner;
pub use scan::ScanOutcome;
pub use session::{ActivityState, ConnectionSession};
pub use traits::{
    ConfigForm, DeviceStore, NotificationSink, ReaderRegistry, RecordNavigator, TagAssigner,
    TagSource,
};
