use crate::{Result, error::Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of one reader-service instance (`host:port`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL of the service, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Full URL for an endpoint path such as `/api/v1/read`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A physical reader found during discovery.
///
/// Produced by enumeration plus registration validation and never modified
/// afterwards. Within one discovery pass a device is identified by
/// `(reader_id, com_port)`; `reader_id` alone is the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub reader_id: String,
    pub com_port: String,
    pub reader_name: String,
    pub host: String,
    pub port: u16,
    pub is_registered_in_system: bool,
}

impl DeviceDescriptor {
    /// Service endpoint the device is attached to.
    #[must_use]
    pub fn endpoint(&self) -> ServiceEndpoint {
        ServiceEndpoint::new(self.host.clone(), self.port)
    }

    /// Reader info for a connection to this device.
    #[must_use]
    pub fn reader_info(&self) -> ReaderInfo {
        ReaderInfo {
            reader_id: self.reader_id.clone(),
            com_port: self.com_port.clone(),
            reader_name: self.reader_name.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }
}

/// The device an active connection session is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderInfo {
    pub reader_id: String,
    pub com_port: String,
    pub reader_name: String,
    pub host: String,
    pub port: u16,
}

impl ReaderInfo {
    #[must_use]
    pub fn endpoint(&self) -> ServiceEndpoint {
        ServiceEndpoint::new(self.host.clone(), self.port)
    }

    /// True when `device` is the same physical reader on the same com port.
    #[must_use]
    pub fn is_same_device(&self, device: &DeviceDescriptor) -> bool {
        self.reader_id == device.reader_id && self.com_port == device.com_port
    }

    /// A reader id and com port are both required to reconnect later.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.reader_id.is_empty() && !self.com_port.is_empty()
    }
}

impl fmt::Display for ReaderInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} - {} ({}) at {}:{}",
            self.reader_name, self.reader_id, self.com_port, self.host, self.port
        )
    }
}

/// Last connected device, as written to the local key/value store.
///
/// Serialized as JSON with camelCase keys and an RFC 3339 timestamp:
///
/// ```json
/// {"host":"127.0.0.1","port":10005,"readerId":"R-01","comPort":"COM3",
///  "readerName":"Gate A","lastConnected":"2025-10-27T14:30:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDevice {
    pub host: String,
    pub port: u16,
    pub reader_id: String,
    pub com_port: String,
    #[serde(default)]
    pub reader_name: String,
    pub last_connected: DateTime<Utc>,
}

impl PersistedDevice {
    /// Build a record for `info`, stamped with `now`.
    ///
    /// # Errors
    /// Returns `Error::InvalidRecord` if the reader id or com port is empty.
    pub fn from_reader(info: &ReaderInfo, now: DateTime<Utc>) -> Result<Self> {
        if !info.is_complete() {
            return Err(Error::InvalidRecord(format!(
                "reader id and com port are required (readerId={:?}, comPort={:?})",
                info.reader_id, info.com_port
            )));
        }

        Ok(Self {
            host: info.host.clone(),
            port: info.port,
            reader_id: info.reader_id.clone(),
            com_port: info.com_port.clone(),
            reader_name: info.reader_name.clone(),
            last_connected: now,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> ServiceEndpoint {
        ServiceEndpoint::new(self.host.clone(), self.port)
    }

    /// Encode as the JSON document stored under the device key.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidRecord(e.to_string()))
    }

    /// Decode a stored JSON document.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::InvalidRecord(e.to_string()))
    }
}

/// Connection status of the single active session.
///
/// Valid transitions:
/// - Disconnected → Connecting → Connected
/// - Connecting → Disconnected (validation or network failure)
/// - Connected → Disconnected (direct, disconnect is immediate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    /// Check if transition to `target` is allowed from this status.
    ///
    /// ```
    /// use tagport_core::ConnectionStatus;
    ///
    /// assert!(ConnectionStatus::Disconnected.can_transition_to(ConnectionStatus::Connecting));
    /// assert!(!ConnectionStatus::Disconnected.can_transition_to(ConnectionStatus::Connected));
    /// ```
    #[must_use]
    pub fn can_transition_to(self, target: ConnectionStatus) -> bool {
        matches!(
            (self, target),
            (ConnectionStatus::Disconnected, ConnectionStatus::Connecting)
                | (
                    ConnectionStatus::Connecting,
                    ConnectionStatus::Connected | ConnectionStatus::Disconnected
                )
                | (ConnectionStatus::Connected, ConnectionStatus::Disconnected)
        )
    }

    /// Label of the connect/disconnect action for this status.
    #[must_use]
    pub fn action_label(self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Connect Reader",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Disconnect",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
        };
        write!(f, "{s}")
    }
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        };
        write!(f, "{s}")
    }
}

/// A message for the user, tagged with a severity.
///
/// Sticky notifications stay visible until dismissed; they are reserved for
/// conditions that need administrator attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub sticky: bool,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            sticky: false,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Danger)
    }

    /// Mark the notification as sticky.
    #[must_use]
    pub fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn sample_reader() -> ReaderInfo {
        ReaderInfo {
            reader_id: "R-01".to_string(),
            com_port: "COM3".to_string(),
            reader_name: "Gate A".to_string(),
            host: "127.0.0.1".to_string(),
            port: 10005,
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let endpoint = ServiceEndpoint::new("127.0.0.1", 10432);
        assert_eq!(endpoint.base_url(), "http://127.0.0.1:10432");
        assert_eq!(
            endpoint.url("/api/v1/read"),
            "http://127.0.0.1:10432/api/v1/read"
        );
        assert_eq!(endpoint.to_string(), "127.0.0.1:10432");
    }

    #[test]
    fn test_same_device_uses_reader_id_and_com_port() {
        let info = sample_reader();
        let mut device = DeviceDescriptor {
            reader_id: "R-01".to_string(),
            com_port: "COM3".to_string(),
            reader_name: "Renamed".to_string(),
            host: "127.0.0.1".to_string(),
            port: 10999,
            is_registered_in_system: true,
        };
        assert!(info.is_same_device(&device));

        device.com_port = "COM4".to_string();
        assert!(!info.is_same_device(&device));
    }

    #[test]
    fn test_persisted_device_json_shape() {
        let now = Utc.with_ymd_and_hms(2025, 10, 27, 14, 30, 0).unwrap();
        let record = PersistedDevice::from_reader(&sample_reader(), now).unwrap();
        let json = record.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["host"], "127.0.0.1");
        assert_eq!(value["port"], 10005);
        assert_eq!(value["readerId"], "R-01");
        assert_eq!(value["comPort"], "COM3");
        assert_eq!(value["readerName"], "Gate A");
        assert_eq!(value["lastConnected"], "2025-10-27T14:30:00Z");

        assert_eq!(PersistedDevice::from_json(&json).unwrap(), record);
    }

    #[test]
    fn test_persisted_device_rejects_incomplete_reader() {
        let mut info = sample_reader();
        info.com_port.clear();
        let result = PersistedDevice::from_reader(&info, Utc::now());
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_persisted_device_rejects_garbage() {
        assert!(PersistedDevice::from_json("{not json").is_err());
        assert!(PersistedDevice::from_json(r#"{"host":"x"}"#).is_err());
    }

    #[rstest]
    #[case(ConnectionStatus::Disconnected, ConnectionStatus::Connecting, true)]
    #[case(ConnectionStatus::Connecting, ConnectionStatus::Connected, true)]
    #[case(ConnectionStatus::Connecting, ConnectionStatus::Disconnected, true)]
    #[case(ConnectionStatus::Connected, ConnectionStatus::Disconnected, true)]
    #[case(ConnectionStatus::Disconnected, ConnectionStatus::Connected, false)]
    #[case(ConnectionStatus::Connected, ConnectionStatus::Connecting, false)]
    fn test_status_transitions(
        #[case] from: ConnectionStatus,
        #[case] to: ConnectionStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    #[case(ConnectionStatus::Disconnected, "Connect Reader")]
    #[case(ConnectionStatus::Connecting, "Connecting...")]
    #[case(ConnectionStatus::Connected, "Disconnect")]
    fn test_action_labels(#[case] status: ConnectionStatus, #[case] label: &str) {
        assert_eq!(status.action_label(), label);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ConnectionStatus::Connecting).unwrap();
        assert_eq!(json, "\"connecting\"");
    }

    #[test]
    fn test_notification_builders() {
        let n = Notification::warning("Device not registered").sticky();
        assert_eq!(n.severity, Severity::Warning);
        assert!(n.sticky);
        assert_eq!(n.to_string(), "[warning] Device not registered");

        assert!(!Notification::info("x").sticky);
    }
}
