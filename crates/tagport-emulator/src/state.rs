//! State of one emulated reader service.
//!
//! A service owns a list of attached devices and at most one selected device.
//! Tags are placed in the field of the selected device; reads return them
//! without consuming them, like a real antenna that keeps seeing a tag until
//! it is taken away.
//!
//! # Selection
//!
//! ```text
//!            SetDevice(com)               SetDevice(other com)
//!  Idle ──────────────────▶ Selected(com) ───────────────────▶ Selected(other)
//!   ▲                           │
//!   └──── detach(com) ──────────┘
//! ```
//!
//! Reads in `Idle` fail with "No device selected".

use subtle::ConstantTimeEq;
use tagport_network::wire::{DeviceRecord, TagRecord};

/// Result of a control call (`SetDevice`, `TestDevice`, read).
pub type Outcome<T> = std::result::Result<T, String>;

/// Scriptable reader service state.
#[derive(Debug, Clone)]
pub struct EmulatorState {
    discovery_key: String,
    devices: Vec<DeviceRecord>,
    selected: Option<String>,
    tags: Vec<String>,
    /// When false, the read endpoint reports the reader as offline.
    online: bool,
    requests: usize,
}

impl EmulatorState {
    pub fn new(discovery_key: impl Into<String>) -> Self {
        Self {
            discovery_key: discovery_key.into(),
            devices: Vec::new(),
            selected: None,
            tags: Vec::new(),
            online: true,
            requests: 0,
        }
    }

    /// Builder-style device attachment.
    #[must_use]
    pub fn with_device(mut self, device: DeviceRecord) -> Self {
        self.attach(device);
        self
    }

    /// Constant-time comparison against the configured discovery key.
    pub fn key_matches(&self, key: &str) -> bool {
        self.discovery_key.as_bytes().ct_eq(key.as_bytes()).into()
    }

    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    /// Attach a device, replacing one on the same com port.
    pub fn attach(&mut self, device: DeviceRecord) {
        self.devices.retain(|d| d.com_port != device.com_port);
        self.devices.push(device);
    }

    /// Detach the device on `com_port`. Deselects it if selected.
    pub fn detach(&mut self, com_port: &str) {
        self.devices.retain(|d| d.com_port != com_port);
        if self.selected.as_deref() == Some(com_port) {
            self.selected = None;
            self.tags.clear();
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    fn device(&self, com_port: &str) -> Outcome<&DeviceRecord> {
        self.devices
            .iter()
            .find(|d| d.com_port == com_port)
            .ok_or_else(|| format!("Device on {com_port} not found"))
    }

    /// Select the device on `com_port`. Returns the selected record.
    pub fn select(&mut self, com_port: &str) -> Outcome<DeviceRecord> {
        let device = self.device(com_port)?.clone();
        if self.selected.as_deref() != Some(com_port) {
            self.tags.clear();
        }
        self.selected = Some(com_port.to_string());
        Ok(device)
    }

    /// Probe the device on `com_port` without selecting it.
    pub fn test(&self, com_port: &str) -> Outcome<()> {
        self.device(com_port)?;
        if !self.online {
            return Err("Reader offline".to_string());
        }
        Ok(())
    }

    /// Tags in the field of the selected device.
    pub fn read(&self) -> Outcome<Vec<TagRecord>> {
        if self.selected.is_none() {
            return Err("No device selected".to_string());
        }
        if !self.online {
            return Err("Reader offline".to_string());
        }
        Ok(self.tags.iter().map(TagRecord::new).collect())
    }

    /// Replace the tags in the field.
    pub fn present_tags<S: AsRef<str>>(&mut self, uids: &[S]) {
        self.tags = uids.iter().map(|u| u.as_ref().to_string()).collect();
    }

    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub(crate) fn record_request(&mut self) {
        self.requests += 1;
    }

    /// Requests served since start.
    pub fn requests(&self) -> usize {
        self.requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> EmulatorState {
        EmulatorState::new("secret")
            .with_device(DeviceRecord::new("R-01", "COM3", "Gate A"))
            .with_device(DeviceRecord::new("R-02", "COM4", "Gate B"))
    }

    #[test]
    fn test_key_matches() {
        let state = state();
        assert!(state.key_matches("secret"));
        assert!(!state.key_matches("secreT"));
        assert!(!state.key_matches(""));
    }

    #[test]
    fn test_read_requires_selection() {
        let mut state = state();
        assert_eq!(state.read(), Err("No device selected".to_string()));

        state.select("COM3").unwrap();
        state.present_tags(&["E200"]);
        assert_eq!(state.read().unwrap(), vec![TagRecord::new("E200")]);
        // Reads do not consume the tag.
        assert_eq!(state.read().unwrap().len(), 1);
    }

    #[test]
    fn test_switching_device_clears_field() {
        let mut state = state();
        state.select("COM3").unwrap();
        state.present_tags(&["E200"]);

        state.select("COM3").unwrap();
        assert_eq!(state.read().unwrap().len(), 1);

        state.select("COM4").unwrap();
        assert!(state.read().unwrap().is_empty());
    }

    #[test]
    fn test_detach_selected_device() {
        let mut state = state();
        state.select("COM3").unwrap();
        state.detach("COM3");

        assert_eq!(state.selected(), None);
        assert_eq!(state.devices().len(), 1);
        assert!(state.select("COM3").is_err());
    }

    #[test]
    fn test_offline_reader() {
        let mut state = state();
        state.select("COM3").unwrap();
        state.set_online(false);

        assert_eq!(state.read(), Err("Reader offline".to_string()));
        assert!(state.test("COM3").is_err());
        assert!(state.test("COM9").is_err());
    }

    #[test]
    fn test_attach_replaces_same_com_port() {
        let mut state = state();
        state.attach(DeviceRecord::new("R-09", "COM3", "Spare"));

        assert_eq!(state.devices().len(), 2);
        assert!(state.devices().iter().any(|d| d.device_id == "R-09"));
    }
}
