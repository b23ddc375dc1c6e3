//! Shared types, protocol constants and configuration for Tagport.
//!
//! Tagport locates a reader service running on an unknown local port,
//! tracks a single active reader connection, and reads RFID tags through it.
//! This crate holds the vocabulary the other crates share; it performs no
//! network I/O.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::TagportConfig;
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
