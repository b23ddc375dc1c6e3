//! The reader-service contract as a trait.
//!
//! Uses native `async fn` in traits (Edition 2024 RPITIT). The trait is not
//! object-safe; consumers are generic over `S: ReaderService`.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::wire::{DeviceRecord, TagRecord};
use serde_json::Value;
use tagport_core::ServiceEndpoint;

/// Calls one reader-service instance.
///
/// Implemented by [`HttpReaderService`](crate::HttpReaderService) for real
/// services and by [`MockReaderService`](crate::mock::MockReaderService) in
/// tests. Every method carries its own timeout.
pub trait ReaderService {
    /// Discovery handshake.
    ///
    /// `Ok(true)` only when the service answered HTTP OK with `Success` set
    /// and the exact versioned acknowledgement. Any other well-formed answer
    /// is `Ok(false)`.
    async fn discover(&self, endpoint: &ServiceEndpoint) -> Result<bool>;

    /// Lists the devices attached to the service.
    async fn get_devices(&self, endpoint: &ServiceEndpoint) -> Result<Vec<DeviceRecord>>;

    /// Claims exclusive access to `com_port`. Returns the service's `Data`.
    async fn set_device(&self, endpoint: &ServiceEndpoint, com_port: &str)
    -> Result<Option<Value>>;

    /// Probes `com_port` without selecting it.
    async fn test_device(&self, endpoint: &ServiceEndpoint, com_port: &str) -> Result<()>;

    /// Reads the tags currently in the selected device's field.
    async fn read_tags(&self, endpoint: &ServiceEndpoint) -> Result<Vec<TagRecord>>;
}
