//! Version command implementation.

use serde::Serialize;

use crate::error::Result;
use crate::storage::schema::CURRENT_SCHEMA_VERSION;

use super::print_json;

#[derive(Serialize)]
struct VersionOutput {
    version: &'static str,
    schema: i32,
    build: &'static str,
}

/// Print the crate version, the schema version it writes, and the build
/// profile.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = VersionOutput {
        version: env!("CARGO_PKG_VERSION"),
        schema: CURRENT_SCHEMA_VERSION,
        build: if cfg!(debug_assertions) { "dev" } else { "release" },
    };

    if json {
        return print_json(&output);
    }
    println!(
        "salesesy {} (schema v{}, {})",
        output.version, output.schema, output.build
    );
    Ok(())
}
