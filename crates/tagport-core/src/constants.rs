//! Core constants for the reader-service discovery and connection protocol.
//!
//! This module defines the fixed values of the local reader-service contract:
//! endpoint paths, the discovery handshake, the port range scanned during
//! discovery, and the default timeouts applied to every outbound call.
//!
//! # Discovery Handshake
//!
//! A reader service listens on an unknown port of the local machine. Discovery
//! probes each candidate port with:
//!
//! ```text
//! POST /api/v1/Discover   {"Key": "<shared secret>"}
//!                    <--  {"Success": true, "Message": "DISCOVER SERVICE SUCCESSFULLY"}
//! ```
//!
//! A port only counts as a reader service when the response is HTTP OK, the
//! `Success` flag is set, and the message equals [`DISCOVERY_ACK_V1`] exactly.
//!
//! # Usage
//!
//! ```
//! use tagport_core::constants::*;
//!
//! assert_eq!(DEFAULT_PORT_RANGE_END - DEFAULT_PORT_RANGE_START + 1, 1001);
//! assert_eq!(DEFAULT_CONCURRENCY_LIMIT, 25);
//!
//! use std::time::Duration;
//! let probe = Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS);
//! assert!(probe < Duration::from_millis(DEFAULT_TASK_CEILING_MS));
//! ```

// ============================================================================
// Service Location
// ============================================================================

/// Address of the local reader service.
///
/// The reader service always runs on the same machine as the client, so
/// discovery never leaves the loopback interface.
pub const DEFAULT_SERVICE_HOST: &str = "127.0.0.1";

/// First port probed during discovery (inclusive).
pub const DEFAULT_PORT_RANGE_START: u16 = 10000;

/// Last port probed during discovery (inclusive).
pub const DEFAULT_PORT_RANGE_END: u16 = 11000;

// ============================================================================
// Discovery Handshake
// ============================================================================

/// Shared secret sent in the `Key` field of every discovery probe.
pub const DEFAULT_DISCOVERY_KEY: &str = "nonestopparkingxinchao";

/// Acknowledgement message returned by a reader service, protocol version 1.
///
/// Compared by exact equality. A service that changes its wording is treated
/// as a different protocol version and will not be discovered.
pub const DISCOVERY_ACK_V1: &str = "DISCOVER SERVICE SUCCESSFULLY";

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Discovery handshake endpoint.
pub const PATH_DISCOVER: &str = "/api/v1/Discover";

/// Lists the physical devices attached to a service instance.
pub const PATH_GET_DEVICES: &str = "/api/v1/GetDevices";

/// Claims exclusive access to a com port on the service side.
pub const PATH_SET_DEVICE: &str = "/api/v1/SetDevice";

/// Side-channel probe of a single device.
pub const PATH_TEST_DEVICE: &str = "/api/v1/TestDevice";

/// Reads the tags currently in the field of the selected device.
pub const PATH_READ: &str = "/api/v1/read";

// ============================================================================
// Concurrency and Timeouts
// ============================================================================

/// Maximum number of discovery probes in flight at once.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 25;

/// Timeout for a single discovery probe (milliseconds).
///
/// Short on purpose: a live local service answers in a few milliseconds and
/// most of the 1001 candidate ports have nothing listening.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 100;

/// Hard ceiling applied by the task runner to every task (milliseconds).
///
/// Independent of the probe's own timeout, so a probe stuck below the HTTP
/// layer still releases its worker.
pub const DEFAULT_TASK_CEILING_MS: u64 = 3000;

/// Timeout for `GetDevices` (milliseconds).
pub const DEFAULT_ENUMERATE_TIMEOUT_MS: u64 = 2000;

/// Timeout for `SetDevice` (milliseconds).
pub const DEFAULT_CONTROL_TIMEOUT_MS: u64 = 5000;

/// Timeout for `TestDevice` (milliseconds).
pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 3000;

/// Timeout for `read` (milliseconds).
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5000;

// ============================================================================
// Local Persistence
// ============================================================================

/// Key under which the last connected device is persisted.
pub const DEVICE_STORAGE_KEY: &str = "rfid_reader_device";

/// Default SQLite database file for the local client.
pub const DEFAULT_DATABASE_PATH: &str = "tagport.db";

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "tagport.toml";
