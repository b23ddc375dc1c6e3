//! Command execution.

use crate::app::{App, find_device};
use crate::cli::{Command, ConfigAction, EmulateArgs, TargetArg};
use anyhow::{Context, Result, anyhow, bail};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tagport_core::{DeviceDescriptor, TagportConfig};
use tagport_emulator::{EmulatorServer, EmulatorState};
use tagport_network::wire::DeviceRecord;
use tagport_reader::{
    AssignOutcome, AssignTarget, ReaderLocator, RestoreOutcome, ScanOutcome, SelectOutcome,
    scan_and_assign,
};
use tagport_storage::models::NewReader;
use tagport_storage::{ReaderRepository, TagRepository};
use tracing::info;

pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Run `command`. `config_path` is where `config init` writes.
    pub async fn execute(
        command: Command,
        config: TagportConfig,
        config_path: Option<PathBuf>,
    ) -> Result<()> {
        match command {
            Command::Emulate(args) => emulate(args, &config).await,
            Command::Config { action } => config_command(action, &config, config_path),
            command => {
                let app = App::open(config).await?;
                let result = Self::with_app(&app, command).await;
                app.close().await;
                result
            }
        }
    }

    async fn with_app(app: &App, command: Command) -> Result<()> {
        match command {
            Command::Discover => discover(app).await,
            Command::Connect { reader_id, com_port } => {
                connect(app, &reader_id, com_port.as_deref()).await
            }
            Command::Disconnect => disconnect(app).await,
            Command::Status => status(app).await,
            Command::Test { reader_id } => test(app, &reader_id).await,
            Command::Configure { reader_id } => configure(app, &reader_id).await,
            Command::Scan => scan(app).await,
            Command::Assign { target } => assign(app, target.into()).await,
            Command::Revoke { target } => revoke(app, target.into()).await,
            Command::Register { reader_id, location } => register(app, &reader_id, location).await,
            Command::Readers => readers(app).await,
            Command::AddPartner { name } => {
                let id = app.tags().create_partner(&name).await?;
                println!("partner {id}: {name}");
                Ok(())
            }
            Command::AddVehicle { plate } => {
                let id = app.tags().create_vehicle(&plate).await?;
                println!("vehicle {id}: {plate}");
                Ok(())
            }
            Command::Tags { owner } => tags(app, owner).await,
            other => bail!("{other:?} does not use the database"),
        }
    }
}

fn print_devices(devices: &[DeviceDescriptor]) {
    for d in devices {
        let mark = if d.is_registered_in_system { "registered" } else { "unregistered" };
        println!(
            "{:<12} {:<14} {:<20} {}:{:<6} {mark}",
            d.reader_id, d.com_port, d.reader_name, d.host, d.port
        );
    }
}

async fn discover(app: &App) -> Result<()> {
    let devices = app.manager()?.show_device_selection().await;
    print_devices(&devices);
    Ok(())
}

async fn discovered(
    app: &App,
    reader_id: &str,
    com_port: Option<&str>,
) -> Result<DeviceDescriptor> {
    let devices = app.manager()?.show_device_selection().await;
    find_device(&devices, reader_id, com_port)
        .cloned()
        .ok_or_else(|| anyhow!("Reader {reader_id} was not found on any reader service"))
}

async fn connect(app: &App, reader_id: &str, com_port: Option<&str>) -> Result<()> {
    let manager = app.manager()?;
    manager.initialize().await;

    let devices = manager.show_device_selection().await;
    let device = find_device(&devices, reader_id, com_port)
        .ok_or_else(|| anyhow!("Reader {reader_id} was not found on any reader service"))?;

    match manager.select(device).await {
        SelectOutcome::Connected(_) | SelectOutcome::AlreadyConnected => Ok(()),
        SelectOutcome::NotRegistered => bail!("Register {reader_id} before connecting to it"),
        SelectOutcome::Failed(e) => Err(e).context("SetDevice failed"),
        outcome => bail!("Connection not completed: {outcome:?}"),
    }
}

async fn disconnect(app: &App) -> Result<()> {
    let manager = app.manager()?;
    manager.initialize().await;
    manager.disconnect().await;
    Ok(())
}

async fn status(app: &App) -> Result<()> {
    let manager = app.manager()?;
    let outcome = manager.initialize().await;
    let session = manager.session();
    match session.connected_reader() {
        Some(reader) => println!("{}: {reader}", session.status()),
        None => println!("{}", session.status()),
    }
    match outcome {
        RestoreOutcome::Failed(e) => bail!("Could not read the saved device: {e}"),
        _ => Ok(()),
    }
}

async fn test(app: &App, reader_id: &str) -> Result<()> {
    let device = discovered(app, reader_id, None).await?;
    if app.manager()?.test_device(&device).await {
        Ok(())
    } else {
        bail!("Test failed for {reader_id}")
    }
}

async fn configure(app: &App, reader_id: &str) -> Result<()> {
    let device = discovered(app, reader_id, None).await?;
    match app.manager()?.open_device_config(&device).await {
        Some(_) => Ok(()),
        None => bail!("Cannot configure {reader_id}"),
    }
}

async fn scan(app: &App) -> Result<()> {
    let manager = app.manager()?;
    manager.initialize().await;
    match manager.scan().await {
        ScanOutcome::Tag(uid) => {
            println!("{uid}");
            Ok(())
        }
        ScanOutcome::NoTag => Ok(()),
        outcome => bail!("Scan failed: {outcome:?}"),
    }
}

async fn assign(app: &App, target: AssignTarget) -> Result<()> {
    let manager = Arc::new(app.manager()?);
    manager.initialize().await;

    let locator = ReaderLocator::new();
    if manager.session().is_connected() {
        locator.register(manager.clone());
    }

    let notifier = crate::console::ConsoleNotifier;
    let outcome = scan_and_assign(&locator, &app.tags(), &notifier, target).await;
    locator.unregister(&manager);

    match outcome {
        AssignOutcome::Assigned { .. } | AssignOutcome::NoTag => Ok(()),
        AssignOutcome::ReaderUnavailable => bail!("No reader connected"),
        AssignOutcome::Rejected { tag, .. } => bail!("Tag {tag} was not assigned to {target}"),
        AssignOutcome::Failed { error, .. } => bail!(error),
    }
}

async fn revoke(app: &App, target: AssignTarget) -> Result<()> {
    match app.tags().revoke(target).await? {
        Some(uid) => println!("Tag {uid} revoked from {target}"),
        None => println!("{target} has no tag"),
    }
    Ok(())
}

async fn register(app: &App, reader_id: &str, location: Option<String>) -> Result<()> {
    let device = discovered(app, reader_id, None).await?;
    let repo = app.readers();
    let record = NewReader {
        location,
        ..NewReader::from_descriptor(&device)
    };

    let id = match repo.find_by_reader_id(reader_id).await? {
        Some(existing) => {
            repo.update(existing.id, &record).await?;
            existing.id
        }
        None => repo.create(&record).await?,
    };
    info!(reader_id, id, "Reader registered");
    println!("reader {id}: {reader_id} ({}) at {}:{}", device.com_port, device.host, device.port);
    Ok(())
}

async fn readers(app: &App) -> Result<()> {
    for r in app.readers().find_all().await? {
        let endpoint = match (&r.ip_address, r.port) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            _ => "-".to_string(),
        };
        println!(
            "{:<4} {:<12} {:<20} {:<8} {:<22} {}",
            r.id,
            r.reader_id,
            r.name,
            r.com_port.as_deref().unwrap_or("-"),
            endpoint,
            r.location.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

async fn tags(app: &App, owner: TargetArg) -> Result<()> {
    for tag in app.tags().find_by_owner(owner.into()).await? {
        println!("{:<24} {}", tag.uid, tag.status);
    }
    Ok(())
}

async fn emulate(args: EmulateArgs, config: &TagportConfig) -> Result<()> {
    let devices = if args.devices.is_empty() {
        vec![DeviceRecord::new("R-01", "COM3", "Emulated reader")]
    } else {
        args.devices
    };

    let mut state = EmulatorState::new(config.service.discovery_key.as_str());
    for device in devices {
        state = state.with_device(device);
    }
    state.present_tags(args.tags.as_slice());

    let addr: SocketAddr = format!("{}:{}", config.service.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.service.host, args.port))?;
    let handle = EmulatorServer::new(state).start(addr).await?;
    println!("Emulating a reader service on {}. Press Ctrl-C to stop.", handle.addr());

    tokio::signal::ctrl_c().await?;
    handle.shutdown().await;
    Ok(())
}

fn config_command(
    action: ConfigAction,
    config: &TagportConfig,
    config_path: Option<PathBuf>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigAction::Init { force } => {
            let path = config_path
                .or_else(TagportConfig::default_config_path)
                .context("No configuration directory available; pass --config")?;
            if path.exists() && !force {
                bail!("{} already exists; use --force to overwrite", path.display());
            }
            TagportConfig::default().save(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
