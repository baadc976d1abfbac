//! Company key and company summary models.
//!
//! There is no company table: a company is whatever string contacts and
//! deals carry in their `company` field, grouped by a normalized key.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Contact, Deal, Task};

/// Display name of the bucket holding records without a company.
pub const UNASSIGNED: &str = "Unassigned";

/// Grouping key for a company: the trimmed, lower-cased company name.
///
/// "Acme Inc.", " ACME INC. " and "acme inc." share one key;
/// "Acme" and "Acme Inc." do not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CompanyKey(String);

impl CompanyKey {
    /// Normalize a raw company name. Returns `None` for blank input.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_lowercase()))
        }
    }

    /// Key of the `Unassigned` bucket.
    #[must_use]
    pub fn unassigned() -> Self {
        Self(UNASSIGNED.to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stage name to deal count, in insertion order.
///
/// Serialized as a JSON object whose key order is the insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageBreakdown(Vec<(String, u64)>);

impl StageBreakdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one deal in `stage`. New stages are appended.
    pub fn record(&mut self, stage: &str) {
        self.add(stage, 1);
    }

    /// Add `count` deals to `stage`. New stages are appended.
    pub fn add(&mut self, stage: &str, count: u64) {
        if let Some(entry) = self.0.iter_mut().find(|(name, _)| name == stage) {
            entry.1 += count;
        } else {
            self.0.push((stage.to_string(), count));
        }
    }

    /// Reorder by count, highest first. Stable, so equal counts keep
    /// their first-occurrence order.
    pub fn sort_by_count_desc(&mut self) {
        self.0.sort_by(|a, b| b.1.cmp(&a.1));
    }

    #[must_use]
    pub fn get(&self, stage: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, count)| *count)
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, count)| count).sum()
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, u64)] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for StageBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (stage, count) in &self.0 {
            map.serialize_entry(stage, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StageBreakdown {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BreakdownVisitor;

        impl<'de> Visitor<'de> for BreakdownVisitor {
            type Value = StageBreakdown;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of stage name to deal count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut breakdown = StageBreakdown::new();
                while let Some((stage, count)) = access.next_entry::<String, u64>()? {
                    breakdown.add(&stage, count);
                }
                Ok(breakdown)
            }
        }

        deserializer.deserialize_map(BreakdownVisitor)
    }
}

/// Summary statistics for one company, as shown on its profile page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    /// Canonical display name (as stored, not normalized)
    pub name: String,
    pub contacts_count: usize,
    pub deals_count: usize,
    /// Sum of the company's deal amounts
    pub pipeline_value: f64,
    /// Distinct deal owners in first-seen order
    pub owners: Vec<String>,
    pub last_activity: Option<DateTime<Utc>>,
    pub stage_breakdown: StageBreakdown,
}

/// Everything the company profile view needs in one payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub summary: CompanySummary,
    pub contacts: Vec<Contact>,
    pub deals: Vec<Deal>,
    pub tasks: Vec<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_case_and_whitespace() {
        let a = CompanyKey::normalize("Acme Inc.").unwrap();
        let b = CompanyKey::normalize("  ACME INC.  ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "acme inc.");
        assert_ne!(a, CompanyKey::normalize("Acme").unwrap());
        assert!(CompanyKey::normalize("   ").is_none());
    }

    #[test]
    fn test_breakdown_keeps_insertion_order_on_the_wire() {
        let mut breakdown = StageBreakdown::new();
        breakdown.record("Proposal");
        breakdown.record("New");
        breakdown.record("Proposal");

        let json = serde_json::to_string(&breakdown).unwrap();
        assert_eq!(json, r#"{"Proposal":2,"New":1}"#);

        let back: StageBreakdown = serde_json::from_str(&json).unwrap();
        assert_eq!(back, breakdown);
        assert_eq!(back.total(), 3);
    }

    #[test]
    fn test_breakdown_sort_is_stable() {
        let mut breakdown = StageBreakdown::new();
        breakdown.record("Won");
        breakdown.record("New");
        breakdown.record("Lost");
        breakdown.record("Lost");
        breakdown.sort_by_count_desc();

        let names: Vec<&str> = breakdown.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Lost", "Won", "New"]);
    }
}
