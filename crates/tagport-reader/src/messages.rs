//! User-facing notification texts
//!
//! Every message the reader subsystem shows to a user is defined here, so
//! wording stays consistent between the connection manager, the tag scan and
//! the assignment workflow.
//!
//! # Usage
//!
//! ```
//! use tagport_reader::messages::NoticeMessages;
//!
//! assert_eq!(NoticeMessages::NO_TAG, "No tag detected");
//! assert_eq!(
//!     NoticeMessages::disconnected("R-01"),
//!     "Disconnected from Reader R-01"
//! );
//! ```

use tagport_core::ReaderInfo;

/// Notification texts.
///
/// Fixed texts are constants; texts that name a device are built by the
/// associated functions.
pub struct NoticeMessages;

impl NoticeMessages {
    // Startup restore

    /// The saved device no longer appears on its service.
    pub const SAVED_DEVICE_UNAVAILABLE: &'static str =
        "Saved device is unavailable. Please reconnect.";

    // Discovery

    /// A discovery pass found no device on any port.
    pub const NO_DEVICES_FOUND: &'static str =
        "No devices found. Make sure the reader service is running on localhost.";

    // Connection

    /// `select` was called while another connection attempt is running.
    pub const CONNECTION_IN_PROGRESS: &'static str =
        "A connection attempt is already in progress.";

    /// No configuration form can be opened in this client.
    pub const CONFIG_UNAVAILABLE: &'static str = "Device configuration is not available.";

    // Tag scan

    pub const NOT_CONNECTED: &'static str = "Not connected to the reader service";

    /// Read succeeded with an empty field.
    pub const NO_TAG: &'static str = "No tag detected";

    /// Read returned two or more tags.
    pub const MULTIPLE_TAGS: &'static str =
        "Multiple tags detected. Please scan only one tag at a time.";

    pub const SCAN_TIMEOUT: &'static str = "Timeout while reading tag";

    pub const SCAN_NETWORK_ERROR: &'static str = "Network connection error";

    // Tag assignment

    /// No reader is registered with the locator.
    pub const READER_NOT_INITIALIZED: &'static str = "RFID reader not initialized";

    /// The backend accepted an assignment without a message.
    pub const ASSIGNED: &'static str = "Tag assigned successfully";

    /// The backend rejected an assignment without saying why.
    pub const ASSIGN_REJECTED: &'static str = "Unable to assign tag";

    pub fn restore_failed(error: impl std::fmt::Display) -> String {
        format!("Auto-connect failed: {error}")
    }

    /// Sticky: the registry changed under a saved device.
    pub fn restore_unregistered(reader_id: &str) -> String {
        format!(
            "Reader {reader_id} is not registered in the system. Please contact support."
        )
    }

    pub fn select_unregistered(reader_id: &str) -> String {
        format!("Reader ID {reader_id} is not registered in the system. Cannot connect.")
    }

    pub fn already_connected(reader_name: &str, com_port: &str) -> String {
        format!("Device {reader_name} ({com_port}) is already connected.")
    }

    pub fn connected(info: &ReaderInfo) -> String {
        format!("Connected to Reader {info}")
    }

    pub fn connection_error(error: impl std::fmt::Display) -> String {
        format!("Connection error: {error}")
    }

    pub fn disconnected(reader_id: &str) -> String {
        format!("Disconnected from Reader {reader_id}")
    }

    pub fn test_succeeded(reader_id: &str, com_port: &str) -> String {
        format!("Test succeeded for {reader_id} ({com_port}).")
    }

    pub fn test_failed(reader_id: &str, error: impl std::fmt::Display) -> String {
        format!("Test failed for {reader_id}: {error}")
    }

    pub fn config_unregistered(reader_id: &str) -> String {
        format!("Reader ID {reader_id} is not registered. Cannot configure.")
    }

    pub fn config_unsupported(reader_id: &str) -> String {
        format!("Device {reader_id} is not supported yet. Please contact us for support.")
    }

    pub fn config_error(error: impl std::fmt::Display) -> String {
        format!("Error opening configuration: {error}")
    }

    pub fn config_title(reader_id: &str) -> String {
        format!("Configure {reader_id}")
    }

    pub fn scan_error(error: impl std::fmt::Display) -> String {
        format!("Error reading tag: {error}")
    }

    pub fn assign_error(error: impl std::fmt::Display) -> String {
        format!("Error assigning tag: {error}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_names_the_device() {
        let info = ReaderInfo {
            reader_id: "R-01".to_string(),
            com_port: "COM3".to_string(),
            reader_name: "Gate A".to_string(),
            host: "127.0.0.1".to_string(),
            port: 10005,
        };
        assert_eq!(
            NoticeMessages::connected(&info),
            "Connected to Reader Gate A - R-01 (COM3) at 127.0.0.1:10005"
        );
    }

    #[test]
    fn test_formatted_messages_carry_their_arguments() {
        assert!(NoticeMessages::restore_unregistered("R-09").contains("R-09"));
        assert!(NoticeMessages::test_failed("R-01", "Test failed").ends_with("Test failed"));
        assert_eq!(
            NoticeMessages::scan_error("Port closed"),
            "Error reading tag: Port closed"
        );
    }
}
