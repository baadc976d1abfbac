//! Aggregations over contacts, deals, stages and tasks.
//!
//! - [`company`] - Per-company summary computed from the store
//! - [`leaderboard`] - Company grouping over already-fetched lists
//! - [`overview`] - Dashboard figures over already-fetched lists
//!
//! The leaderboard and overview functions are pure: they take slices and
//! recompute everything on each call.

pub mod company;
pub mod leaderboard;
pub mod overview;

pub use company::{company_profile, summarize_company, UNKNOWN_STAGE};
pub use leaderboard::{build_leaderboard, CompanyRow, Leaderboard, LeaderboardTotals};
pub use overview::{build_overview, DealTotals, Overview, StageSnapshot};
