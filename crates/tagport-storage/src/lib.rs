//! Storage layer for the tagport client.
//!
//! This crate provides SQLite-backed implementations of the collaborators the
//! reader subsystem delegates to:
//!
//! - [`SqliteReaderRepository`] - registered readers; the connection
//!   manager's `ReaderRegistry`
//! - [`SqliteDeviceStore`] - client-scoped key/value store holding the
//!   persisted device record
//! - [`SqliteTagRepository`] - tags, partners and vehicles; the assignment
//!   workflow's `TagAssigner`
//!
//! [`Database`] owns the connection pool and applies the embedded migrations
//! from the workspace `migrations/` directory.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use tagport_network::HttpReaderService;
//! use tagport_reader::{ConnectionManager, TracingNotifier};
//! use tagport_storage::{Database, DatabaseConfig, SqliteDeviceStore, SqliteReaderRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("tagport.db")).await?;
//!
//! let manager = ConnectionManager::new(
//!     HttpReaderService::new("my-discovery-key", Default::default())?,
//!     SqliteReaderRepository::new(db.pool().clone()),
//!     SqliteDeviceStore::new(db.pool().clone()),
//!     Arc::new(TracingNotifier),
//! );
//! manager.initialize().await;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod messages;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use repositories::{
    ReaderRepository, SqliteDeviceStore, SqliteReaderRepository, SqliteTagRepository,
    TagRepository,
};
