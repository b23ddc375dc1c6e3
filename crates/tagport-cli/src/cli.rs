//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tagport_core::constants::DEFAULT_PORT_RANGE_START;
use tagport_network::wire::DeviceRecord;
use tagport_reader::AssignTarget;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured one
    #[arg(long, global = true)]
    pub database: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan the configured port range for reader services
    Discover,
    /// Connect to a discovered reader and remember it
    Connect {
        /// Reader id reported by the service
        reader_id: String,
        /// Pick the device on this com port when the id is ambiguous
        #[arg(long)]
        com_port: Option<String>,
    },
    /// Forget the remembered reader
    Disconnect,
    /// Restore the remembered reader and show the connection
    Status,
    /// Probe a discovered reader without connecting to it
    Test { reader_id: String },
    /// Print the configuration form of a discovered, registered reader
    Configure { reader_id: String },
    /// Read the tag in front of the connected reader
    Scan,
    /// Scan a tag and bind it to a partner or vehicle
    Assign {
        #[command(subcommand)]
        target: TargetArg,
    },
    /// Take back the tag of a partner or vehicle
    Revoke {
        #[command(subcommand)]
        target: TargetArg,
    },
    /// Register a discovered reader in the local registry
    Register {
        reader_id: String,
        #[arg(long)]
        location: Option<String>,
    },
    /// List registered readers
    Readers,
    /// Add a partner record
    AddPartner { name: String },
    /// Add a vehicle record
    AddVehicle { plate: String },
    /// List the tags bound to a partner or vehicle
    Tags {
        #[command(subcommand)]
        owner: TargetArg,
    },
    /// Run an emulated reader service
    Emulate(EmulateArgs),
    /// Show or write the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum TargetArg {
    Partner { id: i64 },
    Vehicle { id: i64 },
}

impl From<TargetArg> for AssignTarget {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Partner { id } => AssignTarget::Partner(id),
            TargetArg::Vehicle { id } => AssignTarget::Vehicle(id),
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct EmulateArgs {
    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT_RANGE_START)]
    pub port: u16,

    /// Attached device as READER_ID:COM_PORT[:NAME]; repeatable
    #[arg(long = "device", value_parser = parse_device)]
    pub devices: Vec<DeviceRecord>,

    /// Tag present in the field; repeatable
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parse `READER_ID:COM_PORT[:NAME]`. The name defaults to the reader id.
pub fn parse_device(raw: &str) -> Result<DeviceRecord, String> {
    let mut parts = raw.splitn(3, ':').map(str::trim);
    let reader_id = parts.next().unwrap_or_default();
    let com_port = parts.next().unwrap_or_default();
    if reader_id.is_empty() || com_port.is_empty() {
        return Err(format!("expected READER_ID:COM_PORT[:NAME], got '{raw}'"));
    }
    let name = parts.next().filter(|n| !n.is_empty()).unwrap_or(reader_id);
    Ok(DeviceRecord::new(reader_id, com_port, name))
}
