//! Dashboard figures from a running API.

use crate::cli::RemoteArgs;
use crate::error::Result;

use super::render::print_overview;
use super::{fetch_view, print_json, require_loaded};

/// Execute the overview command.
///
/// # Errors
///
/// Returns [`crate::Error::LoadFailed`] if a resource cannot be fetched
/// and `--demo-fallback` is not set.
pub fn execute(remote: &RemoteArgs, json: bool) -> Result<()> {
    let state = fetch_view(&remote.server, remote.demo_fallback)?;
    require_loaded(&state)?;

    let overview = state.overview();
    if json {
        return print_json(&overview);
    }

    if state.is_demo() {
        println!("(API unavailable, showing demo data)\n");
    }
    print_overview(&overview);
    Ok(())
}
