//! HTTP client for the local reader service.
//!
//! [`HttpReaderService`] implements [`ReaderService`] over `reqwest`. A single
//! pooled client is shared by every call; each request gets its own timeout
//! from [`ServiceTimeouts`].
//!
//! # Example Usage
//!
//! ```no_run
//! use tagport_core::ServiceEndpoint;
//! use tagport_network::{HttpReaderService, ReaderService, ServiceTimeouts};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = HttpReaderService::new("nonestopparkingxinchao", ServiceTimeouts::default())?;
//! let endpoint = ServiceEndpoint::new("127.0.0.1", 10005);
//!
//! if service.discover(&endpoint).await? {
//!     for device in service.get_devices(&endpoint).await? {
//!         println!("{} on {}", device.device_id, device.com_port);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Mapping
//!
//! | Failure | Error |
//! |---|---|
//! | request exceeded its timeout | `ServiceError::Timeout` |
//! | connect refused / reset | `ServiceError::Connection` |
//! | non-JSON body on a non-2xx status | `ServiceError::Status` |
//! | body does not match the contract | `ServiceError::Malformed` |
//! | `Success: false` | `ServiceError::Rejected` |
//!
//! `SetDevice`, `TestDevice` and `read` decode the body whatever the HTTP
//! status, so a service that reports failure with a 4xx/5xx and a JSON body
//! still gets its `Message` through.

use crate::error::{Result, ServiceError};
use crate::service::ReaderService;
use crate::wire::{
    ComPortRequest, ControlResponse, DeviceRecord, DevicesResponse, DiscoverRequest,
    DiscoverResponse, ReadResponse, TagRecord,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tagport_core::constants::*;
use tagport_core::{ServiceEndpoint, TagportConfig};
use tracing::{debug, trace};

const OP_DISCOVER: &str = "Discover";
const OP_GET_DEVICES: &str = "GetDevices";
const OP_SET_DEVICE: &str = "SetDevice";
const OP_TEST_DEVICE: &str = "TestDevice";
const OP_READ: &str = "read";

/// Per-operation request timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTimeouts {
    pub discover: Duration,
    pub enumerate: Duration,
    pub control: Duration,
    pub test: Duration,
    pub read: Duration,
}

impl Default for ServiceTimeouts {
    fn default() -> Self {
        Self {
            discover: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            enumerate: Duration::from_millis(DEFAULT_ENUMERATE_TIMEOUT_MS),
            control: Duration::from_millis(DEFAULT_CONTROL_TIMEOUT_MS),
            test: Duration::from_millis(DEFAULT_TEST_TIMEOUT_MS),
            read: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
        }
    }
}

impl ServiceTimeouts {
    pub fn from_config(config: &TagportConfig) -> Self {
        Self {
            discover: config.discovery.probe_timeout(),
            enumerate: Duration::from_millis(config.timeouts.enumerate_ms),
            control: Duration::from_millis(config.timeouts.control_ms),
            test: Duration::from_millis(config.timeouts.test_ms),
            read: Duration::from_millis(config.timeouts.read_ms),
        }
    }
}

/// Reader service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpReaderService {
    client: Client,
    discovery_key: String,
    timeouts: ServiceTimeouts,
}

impl HttpReaderService {
    /// Create a client that authenticates discovery probes with `discovery_key`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Connection` if the HTTP client cannot be built.
    pub fn new(discovery_key: impl Into<String>, timeouts: ServiceTimeouts) -> Result<Self> {
        // The service is always local; never route probes through a proxy.
        let client = Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| ServiceError::connection(e.to_string()))?;

        Ok(Self {
            client,
            discovery_key: discovery_key.into(),
            timeouts,
        })
    }

    pub fn from_config(config: &TagportConfig) -> Result<Self> {
        Self::new(
            config.service.discovery_key.clone(),
            ServiceTimeouts::from_config(config),
        )
    }

    #[must_use]
    pub fn timeouts(&self) -> &ServiceTimeouts {
        &self.timeouts
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<Response> {
        request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(operation, timeout, e))
    }

    async fn decode<T: DeserializeOwned>(
        operation: &'static str,
        response: Response,
        timeout: Duration,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(operation, timeout, e))?;

        serde_json::from_slice(&body).map_err(|e| {
            if status.is_success() {
                ServiceError::malformed(e.to_string())
            } else {
                ServiceError::status(operation, status.as_u16())
            }
        })
    }

    async fn control(
        &self,
        operation: &'static str,
        endpoint: &ServiceEndpoint,
        path: &str,
        com_port: &str,
        timeout: Duration,
    ) -> Result<ControlResponse> {
        let request = self
            .client
            .post(endpoint.url(path))
            .json(&ComPortRequest { com_port });
        let response = self.send(operation, request, timeout).await?;
        Self::decode(operation, response, timeout).await
    }
}

impl ReaderService for HttpReaderService {
    async fn discover(&self, endpoint: &ServiceEndpoint) -> Result<bool> {
        let timeout = self.timeouts.discover;
        let request = self
            .client
            .post(endpoint.url(PATH_DISCOVER))
            .json(&DiscoverRequest {
                key: &self.discovery_key,
            });
        let response = self.send(OP_DISCOVER, request, timeout).await?;

        if !response.status().is_success() {
            trace!(%endpoint, status = %response.status(), "Discovery probe refused");
            return Ok(false);
        }

        let body: DiscoverResponse = Self::decode(OP_DISCOVER, response, timeout).await?;
        Ok(body.success && body.message.as_deref() == Some(DISCOVERY_ACK_V1))
    }

    async fn get_devices(&self, endpoint: &ServiceEndpoint) -> Result<Vec<DeviceRecord>> {
        let timeout = self.timeouts.enumerate;
        let request = self.client.get(endpoint.url(PATH_GET_DEVICES));
        let response = self.send(OP_GET_DEVICES, request, timeout).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::status(OP_GET_DEVICES, status.as_u16()));
        }

        let body: DevicesResponse = Self::decode(OP_GET_DEVICES, response, timeout).await?;
        match body.data {
            Some(devices) if body.success => {
                debug!(%endpoint, count = devices.len(), "Devices enumerated");
                Ok(devices)
            }
            _ => Err(ServiceError::rejected(None, "Device list unavailable")),
        }
    }

    async fn set_device(
        &self,
        endpoint: &ServiceEndpoint,
        com_port: &str,
    ) -> Result<Option<Value>> {
        let body = self
            .control(
                OP_SET_DEVICE,
                endpoint,
                PATH_SET_DEVICE,
                com_port,
                self.timeouts.control,
            )
            .await?;

        if !body.success {
            return Err(ServiceError::rejected(body.message, "Unable to select device"));
        }
        Ok(body.data)
    }

    async fn test_device(&self, endpoint: &ServiceEndpoint, com_port: &str) -> Result<()> {
        let body = self
            .control(
                OP_TEST_DEVICE,
                endpoint,
                PATH_TEST_DEVICE,
                com_port,
                self.timeouts.test,
            )
            .await?;

        if !body.success {
            return Err(ServiceError::rejected(body.message, "Test failed"));
        }
        Ok(())
    }

    async fn read_tags(&self, endpoint: &ServiceEndpoint) -> Result<Vec<TagRecord>> {
        let timeout = self.timeouts.read;
        let request = self.client.get(endpoint.url(PATH_READ));
        let response = self.send(OP_READ, request, timeout).await?;

        let body: ReadResponse = Self::decode(OP_READ, response, timeout).await?;
        if !body.success {
            return Err(ServiceError::rejected(body.message, "Unknown error"));
        }
        Ok(body.data.unwrap_or_default())
    }
}

fn classify(operation: &'static str, timeout: Duration, error: reqwest::Error) -> ServiceError {
    if error.is_timeout() {
        ServiceError::timeout(operation, timeout.as_millis() as u64)
    } else if error.is_decode() {
        ServiceError::malformed(error.to_string())
    } else {
        ServiceError::connection(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = ServiceTimeouts::default();
        assert_eq!(timeouts.discover, Duration::from_millis(100));
        assert_eq!(timeouts.enumerate, Duration::from_millis(2000));
        assert_eq!(timeouts.control, Duration::from_millis(5000));
        assert_eq!(timeouts.test, Duration::from_millis(3000));
        assert_eq!(timeouts.read, Duration::from_millis(5000));
    }

    #[test]
    fn test_timeouts_follow_config() {
        let mut config = TagportConfig::default();
        config.discovery.probe_timeout_ms = 250;
        config.timeouts.read_ms = 1500;

        let timeouts = ServiceTimeouts::from_config(&config);
        assert_eq!(timeouts.discover, Duration::from_millis(250));
        assert_eq!(timeouts.read, Duration::from_millis(1500));
        assert_eq!(timeouts.control, Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_unreachable_port_is_a_network_error() {
        // Bind and drop to get a port with nothing listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let service = HttpReaderService::new("key", ServiceTimeouts::default()).unwrap();
        let endpoint = ServiceEndpoint::new("127.0.0.1", port);

        let error = service.read_tags(&endpoint).await.unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::Network);
    }
}
