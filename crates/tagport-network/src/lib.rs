//! Reader-service client layer for Tagport
//!
//! This crate speaks the HTTP contract of the local reader service. It knows
//! nothing about discovery strategy, connection state or notifications; those
//! live in `tagport-reader`.
//!
//! # Components
//!
//! - **ReaderService**: the contract as an async trait
//! - **HttpReaderService**: `reqwest` implementation with per-call timeouts
//! - **MockReaderService**: scriptable in-process fake for tests
//! - **wire**: JSON bodies exchanged with the service
//!
//! # Example
//!
//! ```no_run
//! use tagport_core::{ServiceEndpoint, TagportConfig};
//! use tagport_network::{HttpReaderService, ReaderService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = HttpReaderService::from_config(&TagportConfig::default())?;
//! let tags = service.read_tags(&ServiceEndpoint::new("127.0.0.1", 10005)).await?;
//! println!("{} tag(s) in field", tags.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
pub mod mock;
mod service;
pub mod wire;

pub use client::{HttpReaderService, ServiceTimeouts};
pub use error::{ErrorKind, Result, ServiceError};
pub use service::ReaderService;
