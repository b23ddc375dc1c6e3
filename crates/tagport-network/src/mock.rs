//! In-process reader service for tests.
//!
//! [`MockReaderService`] simulates any number of service instances, one per
//! port, without opening sockets. Clones share state, so a test keeps one
//! clone to script behavior while the code under test owns another.
//!
//! # Examples
//!
//! ```
//! use tagport_core::ServiceEndpoint;
//! use tagport_network::ReaderService;
//! use tagport_network::mock::MockReaderService;
//! use tagport_network::wire::DeviceRecord;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let service = MockReaderService::new();
//! service.add_service(10005, vec![DeviceRecord::new("R-01", "COM3", "Gate A")]);
//! service.present_tags(10005, &["E2000017"]);
//!
//! let endpoint = ServiceEndpoint::new("127.0.0.1", 10005);
//! assert!(service.discover(&endpoint).await.unwrap());
//!
//! service.set_device(&endpoint, "COM3").await.unwrap();
//! let tags = service.read_tags(&endpoint).await.unwrap();
//! assert_eq!(tags[0].uid, "E2000017");
//! # }
//! ```

use crate::error::{Result, ServiceError};
use crate::service::ReaderService;
use crate::wire::{DeviceRecord, TagRecord};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tagport_core::ServiceEndpoint;

#[derive(Debug, Default)]
struct FakeService {
    devices: Vec<DeviceRecord>,
    tags: Vec<String>,
    selected: Option<String>,
    hang_discover: bool,
    enumerate_error: Option<ServiceError>,
    set_device_error: Option<ServiceError>,
    test_error: Option<ServiceError>,
    read_error: Option<ServiceError>,
    read_delay: Option<Duration>,
    set_device_delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct MockState {
    services: HashMap<u16, FakeService>,
    discover_calls: usize,
    get_devices_calls: Vec<u16>,
    set_device_calls: Vec<(u16, String)>,
    test_device_calls: Vec<(u16, String)>,
    read_calls: usize,
}

/// Scriptable fake reader services keyed by port.
#[derive(Debug, Clone, Default)]
pub struct MockReaderService {
    state: Arc<Mutex<MockState>>,
}

impl MockReaderService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_service<T>(&self, port: u16, f: impl FnOnce(&mut FakeService) -> T) -> Option<T> {
        self.state().services.get_mut(&port).map(f)
    }

    /// Start a service on `port` with the given devices attached.
    pub fn add_service(&self, port: u16, devices: Vec<DeviceRecord>) {
        self.state().services.insert(
            port,
            FakeService {
                devices,
                ..FakeService::default()
            },
        );
    }

    /// Stop the service on `port`. Later calls fail with a connection error.
    pub fn remove_service(&self, port: u16) {
        self.state().services.remove(&port);
    }

    /// Replace the devices attached to the service on `port`.
    pub fn set_devices(&self, port: u16, devices: Vec<DeviceRecord>) {
        self.with_service(port, |s| s.devices = devices);
    }

    /// Put tags in the field of the service on `port`.
    pub fn present_tags(&self, port: u16, uids: &[&str]) {
        self.with_service(port, |s| {
            s.tags = uids.iter().map(|u| (*u).to_string()).collect();
        });
    }

    /// Make discovery on `port` never answer.
    pub fn hang_discover(&self, port: u16) {
        self.with_service(port, |s| s.hang_discover = true);
    }

    pub fn fail_get_devices(&self, port: u16, error: ServiceError) {
        self.with_service(port, |s| s.enumerate_error = Some(error));
    }

    pub fn fail_set_device(&self, port: u16, error: ServiceError) {
        self.with_service(port, |s| s.set_device_error = Some(error));
    }

    pub fn fail_test_device(&self, port: u16, error: ServiceError) {
        self.with_service(port, |s| s.test_error = Some(error));
    }

    pub fn fail_read(&self, port: u16, error: ServiceError) {
        self.with_service(port, |s| s.read_error = Some(error));
    }

    /// Delay every read on `port`.
    pub fn delay_read(&self, port: u16, delay: Duration) {
        self.with_service(port, |s| s.read_delay = Some(delay));
    }

    /// Delay every `SetDevice` on `port`.
    pub fn delay_set_device(&self, port: u16, delay: Duration) {
        self.with_service(port, |s| s.set_device_delay = Some(delay));
    }

    /// Com port currently selected on `port`.
    pub fn selected(&self, port: u16) -> Option<String> {
        self.with_service(port, |s| s.selected.clone()).flatten()
    }

    pub fn discover_calls(&self) -> usize {
        self.state().discover_calls
    }

    pub fn get_devices_calls(&self) -> Vec<u16> {
        self.state().get_devices_calls.clone()
    }

    pub fn set_device_calls(&self) -> Vec<(u16, String)> {
        self.state().set_device_calls.clone()
    }

    pub fn test_device_calls(&self) -> Vec<(u16, String)> {
        self.state().test_device_calls.clone()
    }

    pub fn read_calls(&self) -> usize {
        self.state().read_calls
    }
}

fn refused(endpoint: &ServiceEndpoint) -> ServiceError {
    ServiceError::connection(format!("connection refused ({endpoint})"))
}

impl ReaderService for MockReaderService {
    async fn discover(&self, endpoint: &ServiceEndpoint) -> Result<bool> {
        let hang = {
            let mut state = self.state();
            state.discover_calls += 1;
            match state.services.get(&endpoint.port) {
                Some(service) => service.hang_discover,
                None => return Err(refused(endpoint)),
            }
        };

        if hang {
            std::future::pending::<()>().await;
        }
        Ok(true)
    }

    async fn get_devices(&self, endpoint: &ServiceEndpoint) -> Result<Vec<DeviceRecord>> {
        let mut state = self.state();
        state.get_devices_calls.push(endpoint.port);
        let service = state
            .services
            .get(&endpoint.port)
            .ok_or_else(|| refused(endpoint))?;

        match &service.enumerate_error {
            Some(error) => Err(error.clone()),
            None => Ok(service.devices.clone()),
        }
    }

    async fn set_device(
        &self,
        endpoint: &ServiceEndpoint,
        com_port: &str,
    ) -> Result<Option<Value>> {
        let delay = {
            let mut state = self.state();
            state
                .set_device_calls
                .push((endpoint.port, com_port.to_string()));
            state
                .services
                .get(&endpoint.port)
                .and_then(|s| s.set_device_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        let service = state
            .services
            .get_mut(&endpoint.port)
            .ok_or_else(|| refused(endpoint))?;

        if let Some(error) = &service.set_device_error {
            return Err(error.clone());
        }
        if !service.devices.iter().any(|d| d.com_port == com_port) {
            return Err(ServiceError::rejected(
                Some(format!("Unknown com port {com_port}")),
                "Unable to select device",
            ));
        }

        service.selected = Some(com_port.to_string());
        Ok(Some(serde_json::json!({ "ComPort": com_port })))
    }

    async fn test_device(&self, endpoint: &ServiceEndpoint, com_port: &str) -> Result<()> {
        let mut state = self.state();
        state
            .test_device_calls
            .push((endpoint.port, com_port.to_string()));
        let service = state
            .services
            .get(&endpoint.port)
            .ok_or_else(|| refused(endpoint))?;

        if let Some(error) = &service.test_error {
            return Err(error.clone());
        }
        if !service.devices.iter().any(|d| d.com_port == com_port) {
            return Err(ServiceError::rejected(None, "Test failed"));
        }
        Ok(())
    }

    async fn read_tags(&self, endpoint: &ServiceEndpoint) -> Result<Vec<TagRecord>> {
        let (delay, outcome) = {
            let mut state = self.state();
            state.read_calls += 1;
            let service = state
                .services
                .get(&endpoint.port)
                .ok_or_else(|| refused(endpoint))?;

            let outcome = match &service.read_error {
                Some(error) => Err(error.clone()),
                None => Ok(service.tags.iter().map(TagRecord::new).collect()),
            };
            (service.read_delay, outcome)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(port: u16) -> ServiceEndpoint {
        ServiceEndpoint::new("127.0.0.1", port)
    }

    #[tokio::test]
    async fn test_unknown_port_refuses() {
        let service = MockReaderService::new();
        let error = service.discover(&endpoint(10001)).await.unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::Network);
        assert_eq!(service.discover_calls(), 1);
    }

    #[tokio::test]
    async fn test_set_device_rejects_unknown_com_port() {
        let service = MockReaderService::new();
        service.add_service(10005, vec![DeviceRecord::new("R-01", "COM3", "Gate A")]);

        let error = service
            .set_device(&endpoint(10005), "COM9")
            .await
            .unwrap_err();
        assert!(matches!(error, ServiceError::Rejected { .. }));
        assert_eq!(service.selected(10005), None);

        service.set_device(&endpoint(10005), "COM3").await.unwrap();
        assert_eq!(service.selected(10005).as_deref(), Some("COM3"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let service = MockReaderService::new();
        let script = service.clone();
        script.add_service(10005, Vec::new());
        script.present_tags(10005, &["A", "B"]);

        let tags = service.read_tags(&endpoint(10005)).await.unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(script.read_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_discover_never_resolves() {
        let service = MockReaderService::new();
        service.add_service(10005, Vec::new());
        service.hang_discover(10005);

        let result = tokio::time::timeout(
            Duration::from_secs(60),
            service.discover(&endpoint(10005)),
        )
        .await;
        assert!(result.is_err());
    }
}
