//! Reader service discovery.
//!
//! A discovery pass has three stages:
//!
//! ```text
//! scan_ports         probe every port in the range through BoundedRunner
//!     │              (failures are silent: most ports have nothing listening)
//!     ▼
//! enumerate_devices  GetDevices on each responding port, one at a time
//!     │
//!     ▼
//! mark_registration  registry lookup per device (fail-closed)
//! ```
//!
//! Nothing is cached; every call rebuilds the result from scratch.

use crate::enumerator::enumerate_devices;
use crate::registration::mark_registration;
use crate::runner::BoundedRunner;
use crate::traits::ReaderRegistry;
use std::ops::RangeInclusive;
use std::time::Duration;
use tagport_core::constants::*;
use tagport_core::{DeviceDescriptor, ServiceEndpoint, TagportConfig};
use tagport_network::{ReaderService, ServiceError};
use tracing::{debug, info};

/// Where and how hard to look for reader services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub host: String,
    pub ports: RangeInclusive<u16>,
    pub concurrency: usize,
    /// Hard ceiling per probe, on top of the probe's own request timeout.
    pub task_ceiling: Duration,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVICE_HOST.to_string(),
            ports: DEFAULT_PORT_RANGE_START..=DEFAULT_PORT_RANGE_END,
            concurrency: DEFAULT_CONCURRENCY_LIMIT,
            task_ceiling: Duration::from_millis(DEFAULT_TASK_CEILING_MS),
        }
    }
}

impl DiscoverySettings {
    pub fn from_config(config: &TagportConfig) -> Self {
        Self {
            host: config.service.host.clone(),
            ports: config.service.port_range(),
            concurrency: config.discovery.concurrency,
            task_ceiling: config.discovery.task_ceiling(),
        }
    }

    fn runner(&self) -> BoundedRunner {
        BoundedRunner::new(self.concurrency, self.task_ceiling)
    }
}

/// Probe every configured port and return the endpoints that answered the
/// discovery handshake, in port order.
pub async fn scan_ports<S: ReaderService>(
    service: &S,
    settings: &DiscoverySettings,
) -> Vec<ServiceEndpoint> {
    let tasks: Vec<_> = settings
        .ports
        .clone()
        .map(|port| {
            let endpoint = ServiceEndpoint::new(settings.host.clone(), port);
            move || async move {
                let matched = service.discover(&endpoint).await?;
                Ok::<_, ServiceError>(matched.then_some(endpoint))
            }
        })
        .collect();

    let probed = tasks.len();
    let found: Vec<ServiceEndpoint> = settings
        .runner()
        .run(tasks)
        .await
        .into_iter()
        .flatten()
        .flatten()
        .collect();

    debug!(probed, found = found.len(), "Port scan complete");
    found
}

/// Run a full discovery pass: scan, enumerate, validate.
pub async fn discover_devices<S, R>(
    service: &S,
    registry: &R,
    settings: &DiscoverySettings,
) -> Vec<DeviceDescriptor>
where
    S: ReaderService,
    R: ReaderRegistry,
{
    let endpoints = scan_ports(service, settings).await;

    let mut devices = Vec::new();
    for endpoint in &endpoints {
        let found = enumerate_devices(service, endpoint).await;
        devices.extend(mark_registration(registry, found).await);
    }

    info!(
        services = endpoints.len(),
        devices = devices.len(),
        "Discovery finished"
    );
    devices
}
