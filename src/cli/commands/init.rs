//! Create the database file and apply the schema.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::{resolve_db_target, DbTarget};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    recreated: bool,
}

/// Execute the init command.
///
/// With `force`, an existing database (and its WAL side files) is removed
/// first.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if the file exists and `force`
/// is not set, or an I/O or database error.
pub fn execute(db: Option<&Path>, force: bool, json: bool) -> Result<()> {
    let path = match resolve_db_target(db)? {
        DbTarget::File(path) => path,
        DbTarget::Memory => {
            return Err(Error::InvalidArgument(
                "init needs a database file, not :memory:".to_string(),
            ));
        }
    };

    let existed = path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized { path });
    }
    if existed {
        remove_database(&path)?;
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    SqliteStorage::open(&path)?;
    info!(database = %path.display(), recreated = existed, "Initialized database");

    if json {
        let output = InitOutput {
            database: path,
            recreated: existed,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
    } else {
        println!("Initialized Salesesy database");
        println!("  Database: {}", path.display());
        println!();
        println!("Next: run 'salesesy seed' for demo data, then 'salesesy serve'.");
    }

    Ok(())
}

fn remove_database(path: &Path) -> Result<()> {
    fs::remove_file(path)?;
    for suffix in ["-wal", "-shm"] {
        let mut side = path.as_os_str().to_owned();
        side.push(suffix);
        let side = PathBuf::from(side);
        if side.exists() {
            fs::remove_file(side)?;
        }
    }
    Ok(())
}
