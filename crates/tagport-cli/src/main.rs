//! Tagport CLI entry point

use clap::Parser;
use tagport_cli::cli::Cli;
use tagport_cli::commands::CommandDispatcher;
use tagport_core::TagportConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = TagportConfig::load(cli.config.clone())?;
    if let Some(database) = &cli.database {
        config.storage.database_path = database.clone();
    }

    if let Err(e) = CommandDispatcher::execute(cli.command, config, cli.config).await {
        error!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}

/// `RUST_LOG` wins over `--verbose`.
fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn,tagport=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
