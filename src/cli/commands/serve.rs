//! Run the HTTP API.

use std::path::Path;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{self, AppState};
use crate::cli::ServeArgs;
use crate::config::ServerConfig;
use crate::error::Result;

use super::{block_on, open_or_create_store, CLI_ACTOR};

/// Execute the serve command. Blocks until Ctrl-C.
///
/// The database is created if missing. With `--seed`, an empty database
/// gets the demo data first.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the address cannot
/// be bound.
pub fn execute(db: Option<&Path>, args: &ServeArgs) -> Result<()> {
    let (mut storage, target) = open_or_create_store(db)?;
    if args.seed {
        if storage.is_empty()? {
            let report = storage.seed_demo(CLI_ACTOR)?;
            info!(contacts = report.contacts, deals = report.deals, "Seeded demo data");
        } else {
            warn!("Database already has data; skipping --seed");
        }
    }

    let config = ServerConfig::new(&args.host, args.port);
    info!(database = %target, "Opening store");
    let state = AppState::new(storage);

    block_on(run(config, state))?
}

async fn run(config: ServerConfig, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    println!("API running on http://{}", listener.local_addr()?);
    api::serve(listener, state, &config, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
