//! Device enumeration for one service instance.

use tagport_core::{DeviceDescriptor, ServiceEndpoint};
use tagport_network::ReaderService;
use tagport_network::wire::DeviceRecord;
use tracing::{debug, warn};

/// Normalize a service record into a descriptor. Registration is unknown at
/// this point and starts out false.
#[must_use]
pub fn to_descriptor(record: DeviceRecord, endpoint: &ServiceEndpoint) -> DeviceDescriptor {
    DeviceDescriptor {
        reader_id: record.device_id,
        com_port: record.com_port,
        reader_name: record.device_name,
        host: endpoint.host.clone(),
        port: endpoint.port,
        is_registered_in_system: false,
    }
}

/// List the devices attached to the service at `endpoint`.
///
/// Any failure yields an empty list; one unreachable service never aborts a
/// discovery pass.
pub async fn enumerate_devices<S: ReaderService>(
    service: &S,
    endpoint: &ServiceEndpoint,
) -> Vec<DeviceDescriptor> {
    match service.get_devices(endpoint).await {
        Ok(records) => {
            debug!(%endpoint, count = records.len(), "Enumerated devices");
            records
                .into_iter()
                .map(|record| to_descriptor(record, endpoint))
                .collect()
        }
        Err(e) => {
            warn!(%endpoint, error = %e, "Device enumeration failed");
            Vec::new()
        }
    }
}
