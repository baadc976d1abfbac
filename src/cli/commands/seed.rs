//! Insert demo data.

use std::path::Path;

use crate::error::{Error, Result};

use super::{open_store, print_json, CLI_ACTOR};

/// Execute the seed command.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] without a database,
/// [`Error::InvalidArgument`] if the database already holds data and
/// `reset` is not set, or a database error.
pub fn execute(db: Option<&Path>, reset: bool, json: bool) -> Result<()> {
    let mut storage = open_store(db)?;

    if reset {
        storage.clear_all(CLI_ACTOR)?;
    } else if !storage.is_empty()? {
        return Err(Error::InvalidArgument(
            "Database already has data; pass --reset to replace it".to_string(),
        ));
    }

    let report = storage.seed_demo(CLI_ACTOR)?;

    if json {
        return print_json(&report);
    }
    println!(
        "Seeded demo data: {} pipeline, {} stages, {} contacts, {} deals, {} tasks.",
        report.pipelines, report.stages, report.contacts, report.deals, report.tasks
    );
    Ok(())
}
