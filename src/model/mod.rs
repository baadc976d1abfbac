//! Data models for Salesesy.
//!
//! This module contains all domain models:
//! - Contact
//! - Deal
//! - Pipeline and Stage
//! - Task (with its `RelatedTo` reference)
//! - Company key and company summary

pub mod company;
pub mod contact;
pub mod deal;
pub mod pipeline;
pub mod task;

pub use company::{CompanyKey, CompanyProfile, CompanySummary, StageBreakdown, UNASSIGNED};
pub use contact::{Contact, ContactPatch, NewContact};
pub use deal::{Deal, DealPatch, NewDeal};
pub use pipeline::{
    NewPipeline, NewStage, Pipeline, PipelineCatalog, PipelineWithStages, Stage,
};
pub use task::{NewTask, RelatedTo, Task, TaskPatch, TaskStatus};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Generate an opaque identifier such as `ct_3f2a9c01b7de`.
#[must_use]
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", &uuid::Uuid::new_v4().simple().to_string()[..12])
}

/// Parse a timestamp leniently.
///
/// Accepts RFC 3339 (any offset, normalized to UTC) and SQLite's
/// `YYYY-MM-DD HH:MM:SS[.fff]` form, read as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Serde helper: a missing, null, non-string or unparseable timestamp
/// becomes `None` instead of failing the whole record.
///
/// # Errors
///
/// Only fails if the underlying deserializer fails to produce a value.
pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(parse_timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_id_shape() {
        let id = new_id("ct");
        assert!(id.starts_with("ct_"));
        assert_eq!(id.len(), 15);
        assert_ne!(new_id("ct"), new_id("ct"));
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("   "), None);
    }
}
