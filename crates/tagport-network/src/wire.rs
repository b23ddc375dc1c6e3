//! JSON bodies of the reader-service HTTP contract.
//!
//! Field names are PascalCase on the wire. Response flags default to
//! `false` and optional payloads to `None`, so a body missing a field is
//! treated as a failure rather than a decode error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `POST /api/v1/Discover` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoverRequest<'a> {
    pub key: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscoverResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /api/v1/SetDevice` and `POST /api/v1/TestDevice`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComPortRequest<'a> {
    pub com_port: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DevicesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Vec<DeviceRecord>>,
}

/// One physical device as reported by `GetDevices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceRecord {
    #[serde(default, deserialize_with = "lossy_string")]
    pub device_id: String,
    #[serde(default, deserialize_with = "lossy_string")]
    pub com_port: String,
    #[serde(default, deserialize_with = "lossy_string")]
    pub device_name: String,
}

impl DeviceRecord {
    pub fn new(
        device_id: impl Into<String>,
        com_port: impl Into<String>,
        device_name: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            com_port: com_port.into(),
            device_name: device_name.into(),
        }
    }
}

/// Response of `SetDevice` and `TestDevice`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ControlResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Vec<TagRecord>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A tag in the reader's field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    #[serde(rename = "UID", default, deserialize_with = "lossy_string")]
    pub uid: String,
}

impl TagRecord {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

// Some service builds send numeric ids; accept any scalar and keep its text.
fn lossy_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
