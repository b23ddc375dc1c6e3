//! Registration validation against the reader registry.
//!
//! Fail-closed: a registry error counts as "not registered", so a device
//! whose status cannot be confirmed is never selectable.

use crate::traits::ReaderRegistry;
use tagport_core::DeviceDescriptor;
use tracing::error;

/// True iff the registry holds at least one record for `reader_id`.
pub async fn is_registered<R: ReaderRegistry>(registry: &R, reader_id: &str) -> bool {
    match registry.count_by_reader_id(reader_id).await {
        Ok(count) => count > 0,
        Err(e) => {
            error!(reader_id, error = %e, "Registry lookup failed");
            false
        }
    }
}

/// Annotate each device with its registration status, one lookup at a time.
pub async fn mark_registration<R: ReaderRegistry>(
    registry: &R,
    devices: Vec<DeviceDescriptor>,
) -> Vec<DeviceDescriptor> {
    let mut marked = Vec::with_capacity(devices.len());
    for mut device in devices {
        device.is_registered_in_system = is_registered(registry, &device.reader_id).await;
        marked.push(device);
    }
    marked
}
