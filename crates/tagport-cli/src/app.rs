//! Wiring of the storage, network and reader layers for one CLI run.

use crate::console::{ConsoleNavigator, ConsoleNotifier};
use anyhow::{Context, Result};
use std::sync::Arc;
use tagport_core::{DeviceDescriptor, TagportConfig};
use tagport_network::HttpReaderService;
use tagport_reader::{ConnectionManager, ManagerSettings};
use tagport_storage::{
    Database, DatabaseConfig, SqliteDeviceStore, SqliteReaderRepository, SqliteTagRepository,
};
use tracing::debug;

pub type Manager = ConnectionManager<HttpReaderService, SqliteReaderRepository, SqliteDeviceStore>;

/// Open database plus the configuration it was opened with.
pub struct App {
    config: TagportConfig,
    db: Database,
}

impl App {
    pub async fn open(config: TagportConfig) -> Result<Self> {
        let db = Database::new(DatabaseConfig::from_config(&config))
            .await
            .with_context(|| format!("Failed to open database {}", config.storage.database_path))?;
        debug!(path = %config.storage.database_path, "Database ready");
        Ok(Self { config, db })
    }

    pub fn config(&self) -> &TagportConfig {
        &self.config
    }

    pub fn readers(&self) -> SqliteReaderRepository {
        SqliteReaderRepository::new(self.db.pool().clone())
    }

    pub fn tags(&self) -> SqliteTagRepository {
        SqliteTagRepository::new(self.db.pool().clone())
    }

    /// A connection manager backed by this database.
    pub fn manager(&self) -> Result<Manager> {
        let service = HttpReaderService::from_config(&self.config)
            .context("Failed to build the reader service client")?;

        Ok(ConnectionManager::new(
            service,
            self.readers(),
            SqliteDeviceStore::new(self.db.pool().clone()),
            Arc::new(ConsoleNotifier),
        )
        .with_settings(ManagerSettings::from_config(&self.config))
        .with_navigator(Arc::new(ConsoleNavigator)))
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}

/// Pick the device with `reader_id`, narrowed by `com_port` when given.
pub fn find_device<'a>(
    devices: &'a [DeviceDescriptor],
    reader_id: &str,
    com_port: Option<&str>,
) -> Option<&'a DeviceDescriptor> {
    devices
        .iter()
        .filter(|d| d.reader_id == reader_id)
        .find(|d| com_port.is_none_or(|port| d.com_port == port))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(reader_id: &str, com_port: &str) -> DeviceDescriptor {
        DeviceDescriptor {
            reader_id: reader_id.to_string(),
            com_port: com_port.to_string(),
            reader_name: "Gate".to_string(),
            host: "127.0.0.1".to_string(),
            port: 10005,
            is_registered_in_system: true,
        }
    }

    #[test]
    fn test_find_device() {
        let devices = vec![device("R-01", "COM3"), device("R-01", "COM4"), device("R-02", "COM5")];

        assert_eq!(find_device(&devices, "R-01", None).unwrap().com_port, "COM3");
        assert_eq!(find_device(&devices, "R-01", Some("COM4")).unwrap().com_port, "COM4");
        assert!(find_device(&devices, "R-01", Some("COM5")).is_none());
        assert!(find_device(&devices, "R-09", None).is_none());
    }
}
