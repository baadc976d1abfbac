//! Company leaderboard from a running API.

use crate::cli::RemoteArgs;
use crate::error::Result;

use super::render::print_leaderboard;
use super::{fetch_view, print_json, require_loaded};

/// Execute the leaderboard command.
///
/// # Errors
///
/// Returns [`crate::Error::LoadFailed`] if contacts or deals cannot be
/// fetched and `--demo-fallback` is not set.
pub fn execute(remote: &RemoteArgs, limit: Option<usize>, json: bool) -> Result<()> {
    let state = fetch_view(&remote.server, remote.demo_fallback)?;
    require_loaded(&state)?;

    let mut board = state.leaderboard();
    if json {
        if let Some(limit) = limit {
            board.companies.truncate(limit);
        }
        return print_json(&board);
    }

    if state.is_demo() {
        println!("(API unavailable, showing demo data)\n");
    }
    print_leaderboard(&board, limit);
    Ok(())
}
