//! Reader service emulator.
//!
//! Runs one or more in-process HTTP services that speak the reader-service
//! contract, so discovery, selection and tag reads can be exercised end to
//! end without hardware. Each [`EmulatorHandle`] owns one port and exposes
//! its [`EmulatorState`] for scripting.
//!
//! # Examples
//!
//! ```no_run
//! use tagport_emulator::{EmulatorServer, EmulatorState};
//! use tagport_network::wire::DeviceRecord;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let state = EmulatorState::new("my-discovery-key")
//!     .with_device(DeviceRecord::new("R-01", "COM3", "Gate A"));
//!
//! let handle = EmulatorServer::new(state)
//!     .start("127.0.0.1:10005".parse()?)
//!     .await?;
//!
//! handle.with_state(|s| s.present_tags(&["E2000017"]));
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod server;
pub mod state;

pub use error::{EmulatorError, Result};
pub use server::{EmulatorHandle, EmulatorServer};
pub use state::EmulatorState;
