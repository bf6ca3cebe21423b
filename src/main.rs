//! Task Tracker
//!
//! REST API over a single SQLite task table, plus command-line client
//! commands that go through the client task store.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use task_tracker::cli::commands::run_client_command;
use task_tracker::cli::{Cli, Command};
use task_tracker::client::{HttpTaskApi, TaskStore};
use task_tracker::config::Config;
use task_tracker::db::Database;
use task_tracker::logging::{LogTarget, init_logging};
use task_tracker::server::start_server;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut config = Config::resolve(cli.config.as_deref())?;

    // Override from CLI arguments
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.clone();
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(api_url) = &cli.api_url {
        config.client.base_url = api_url.clone();
    }

    match cli.command {
        Some(Command::Serve) | None => run_server(config).await,
        Some(command) => {
            let store = TaskStore::new(HttpTaskApi::new(config.client.base_url.clone()));
            run_client_command(&store, command).await
        }
    }
}

/// Run the HTTP API until Ctrl-C.
async fn run_server(config: Config) -> Result<()> {
    config.ensure_db_dir()?;

    let db = Arc::new(Database::open(&config.server.db_path)?);
    info!(
        db_path = %config.server.db_path.display(),
        environment = ?config.server.environment,
        "Database ready"
    );

    let (shutdown_tx, _addr) = start_server(db, &config.server).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(());

    Ok(())
}
