//! Client configuration.
//!
//! ## Configuration Sources
//! ```text
//! 1. Environment variables (highest priority)
//!    TAGPORT_HOST=127.0.0.1
//!    TAGPORT_PORT_START=10000
//!
//! 2. TOML config file
//!    ~/.config/tagport/tagport.toml (Linux)
//!
//! 3. Default values (lowest priority)
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [service]
//! host = "127.0.0.1"
//! port_start = 10000
//! port_end = 11000
//! discovery_key = "nonestopparkingxinchao"
//!
//! [discovery]
//! concurrency = 25
//! probe_timeout_ms = 100
//! task_ceiling_ms = 3000
//!
//! [timeouts]
//! enumerate_ms = 2000
//! control_ms = 5000
//! test_ms = 3000
//! read_ms = 5000
//!
//! [storage]
//! database_path = "tagport.db"
//! device_key = "rfid_reader_device"
//! ```

use crate::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the reader service is looked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Host the reader service runs on.
    pub host: String,
    /// First port probed (inclusive).
    pub port_start: u16,
    /// Last port probed (inclusive).
    pub port_end: u16,
    /// Shared secret sent with every discovery probe.
    pub discovery_key: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVICE_HOST.to_string(),
            port_start: DEFAULT_PORT_RANGE_START,
            port_end: DEFAULT_PORT_RANGE_END,
            discovery_key: DEFAULT_DISCOVERY_KEY.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Ports probed during discovery.
    #[must_use]
    pub fn port_range(&self) -> RangeInclusive<u16> {
        self.port_start..=self.port_end
    }
}

/// Discovery scan tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Probes in flight at once.
    pub concurrency: usize,
    /// Timeout of a single probe request.
    pub probe_timeout_ms: u64,
    /// Hard ceiling per task, enforced by the task runner.
    pub task_ceiling_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY_LIMIT,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            task_ceiling_ms: DEFAULT_TASK_CEILING_MS,
        }
    }
}

impl DiscoveryConfig {
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    #[must_use]
    pub fn task_ceiling(&self) -> Duration {
        Duration::from_millis(self.task_ceiling_ms)
    }
}

/// Per-operation timeouts for calls to a known service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub enumerate_ms: u64,
    pub control_ms: u64,
    pub test_ms: u64,
    pub read_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            enumerate_ms: DEFAULT_ENUMERATE_TIMEOUT_MS,
            control_ms: DEFAULT_CONTROL_TIMEOUT_MS,
            test_ms: DEFAULT_TEST_TIMEOUT_MS,
            read_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

/// Local persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database holding the registry and the device store.
    pub database_path: String,
    /// Key of the persisted device record.
    pub device_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            device_key: DEVICE_STORAGE_KEY.to_string(),
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagportConfig {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl TagportConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`tagport.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parse a TOML file without applying environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Render as the TOML accepted by [`from_file`](Self::from_file).
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.service.port_start > self.service.port_end {
            return Err(Error::InvalidPortRange {
                start: self.service.port_start,
                end: self.service.port_end,
            });
        }

        if self.service.host.trim().is_empty() {
            return Err(Error::Config("service.host must not be empty".into()));
        }

        if self.service.discovery_key.is_empty() {
            return Err(Error::Config(
                "service.discovery_key must not be empty".into(),
            ));
        }

        if self.discovery.concurrency == 0 {
            return Err(Error::Config(
                "discovery.concurrency must be greater than 0".into(),
            ));
        }

        if self.storage.device_key.is_empty() {
            return Err(Error::Config("storage.device_key must not be empty".into()));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("TAGPORT_HOST") {
            debug!(host = %host, "Overriding service host from environment");
            self.service.host = host;
        }

        if let Ok(port) = std::env::var("TAGPORT_PORT_START") {
            match port.parse::<u16>() {
                Ok(p) => self.service.port_start = p,
                Err(_) => warn!(value = %port, "Ignoring invalid TAGPORT_PORT_START"),
            }
        }

        if let Ok(port) = std::env::var("TAGPORT_PORT_END") {
            match port.parse::<u16>() {
                Ok(p) => self.service.port_end = p,
                Err(_) => warn!(value = %port, "Ignoring invalid TAGPORT_PORT_END"),
            }
        }

        if let Ok(limit) = std::env::var("TAGPORT_CONCURRENCY") {
            match limit.parse::<usize>() {
                Ok(l) => self.discovery.concurrency = l,
                Err(_) => warn!(value = %limit, "Ignoring invalid TAGPORT_CONCURRENCY"),
            }
        }

        if let Ok(key) = std::env::var("TAGPORT_DISCOVERY_KEY") {
            self.service.discovery_key = key;
        }

        if let Ok(path) = std::env::var("TAGPORT_DATABASE") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = path;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tagport", "tagport")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}
