//! SQLite storage layer for Salesesy.
//!
//! This module provides the persistence layer using SQLite with:
//! - WAL mode for concurrent reads
//! - Transaction discipline for atomic writes
//! - Embedded, idempotent migrations
//!
//! # Submodules
//!
//! - [`listing`] - Pagination and sort allow-lists
//! - [`schema`] - Database schema definitions
//! - [`seed`] - Demo data
//! - [`sqlite`] - Main SQLite storage implementation

pub mod listing;
pub mod migrations;
pub mod schema;
pub mod seed;
pub mod sqlite;

pub use listing::{ListOptions, SortOrder};
pub use seed::SeedReport;
pub use sqlite::{MutationContext, SqliteStorage};

use chrono::{DateTime, SecondsFormat, Utc};

/// Storage form of a timestamp: RFC 3339, UTC, millisecond precision.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current time in storage form.
#[must_use]
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format_sorts_lexically() {
        let early = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 11, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(early), "2024-01-02T03:04:05.000Z");
        assert!(format_timestamp(early) < format_timestamp(late));
    }
}
