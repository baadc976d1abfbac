//! Command implementations.

pub mod company;
pub mod completions;
pub mod init;
pub mod leaderboard;
pub mod overview;
pub mod render;
pub mod seed;
pub mod serve;
pub mod version;
pub mod view;

use std::future::Future;
use std::path::Path;

use serde::Serialize;

use crate::client::{load_view, ApiClient, FallbackPolicy, ViewState};
use crate::config::{resolve_db_target, DbTarget};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;

/// Actor recorded for mutations made from the command line.
pub(crate) const CLI_ACTOR: &str = "cli";

/// Open an existing store.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] if the database file does not exist.
pub(crate) fn open_store(db: Option<&Path>) -> Result<SqliteStorage> {
    match resolve_db_target(db)? {
        DbTarget::Memory => SqliteStorage::open_memory(),
        DbTarget::File(path) => {
            if !path.exists() {
                return Err(Error::NotInitialized);
            }
            SqliteStorage::open(&path)
        }
    }
}

/// Open the store, creating the file and its directory if needed.
pub(crate) fn open_or_create_store(db: Option<&Path>) -> Result<(SqliteStorage, DbTarget)> {
    let target = resolve_db_target(db)?;
    let storage = match &target {
        DbTarget::Memory => SqliteStorage::open_memory()?,
        DbTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            SqliteStorage::open(path)?
        }
    };
    Ok((storage, target))
}

/// Run a future to completion on a fresh runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let payload = serde_json::to_string(value)?;
    println!("{payload}");
    Ok(())
}

/// Fetch everything the view needs from `server`.
pub(crate) fn fetch_view(server: &str, demo_fallback: bool) -> Result<ViewState> {
    let client = ApiClient::new(server)?;
    let fallback = if demo_fallback {
        FallbackPolicy::Demo
    } else {
        FallbackPolicy::Strict
    };
    block_on(async { load_view(&client, fallback).await })
}

/// Fail with the first load error unless demo data took over.
pub(crate) fn require_loaded(state: &ViewState) -> Result<()> {
    match state.errors.first() {
        Some(err) => Err(Error::LoadFailed {
            resource: err.resource.to_string(),
            message: err.message.clone(),
        }),
        None => Ok(()),
    }
}
