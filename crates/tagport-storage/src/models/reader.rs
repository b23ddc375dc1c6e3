use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tagport_core::DeviceDescriptor;

/// Registered reader device.
///
/// A discovered device may only be connected when a record with its
/// `reader_id` exists in the `readers` table.
///
/// # Database Schema
///
/// Maps to the `readers` table; `reader_id` is unique and non-blank.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reader {
    pub id: i64,

    /// Identifier reported by the reader service
    pub reader_id: String,

    pub name: String,

    /// Host of the reader service the device was last seen on
    pub ip_address: Option<String>,

    /// Port of the reader service the device was last seen on
    pub port: Option<i64>,

    pub com_port: Option<String>,

    pub location: Option<String>,

    /// Whether the record was created from a discovery pass
    pub auto_discovered: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a reader record to insert or update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewReader {
    pub reader_id: String,
    pub name: String,
    pub ip_address: Option<String>,
    pub port: Option<u16>,
    pub com_port: Option<String>,
    pub location: Option<String>,
    pub auto_discovered: bool,
}

impl NewReader {
    pub fn new(reader_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            reader_id: reader_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Record for a device found by discovery.
    ///
    /// ```
    /// use tagport_core::DeviceDescriptor;
    /// use tagport_storage::models::NewReader;
    ///
    /// let device = DeviceDescriptor {
    ///     reader_id: "R-01".into(),
    ///     com_port: "COM3".into(),
    ///     reader_name: "Gate A".into(),
    ///     host: "127.0.0.1".into(),
    ///     port: 10005,
    ///     is_registered_in_system: false,
    /// };
    ///
    /// let reader = NewReader::from_descriptor(&device);
    /// assert!(reader.auto_discovered);
    /// assert_eq!(reader.port, Some(10005));
    /// ```
    pub fn from_descriptor(device: &DeviceDescriptor) -> Self {
        Self {
            reader_id: device.reader_id.clone(),
            name: device.reader_name.clone(),
            ip_address: Some(device.host.clone()),
            port: Some(device.port),
            com_port: Some(device.com_port.clone()),
            location: None,
            auto_discovered: true,
        }
    }
}
