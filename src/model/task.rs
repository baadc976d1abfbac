//! Task model.
//!
//! Tasks point at the record they concern through [`RelatedTo`]. On the
//! wire and in the database the reference is two loose columns,
//! `related_type` and `related_id`; in code it is a tagged union.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_timestamp, CompanyKey};

/// Task status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Parse a stored value. Unknown values read as `Open`.
    #[must_use]
    pub fn from_stored(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "in_progress" => Self::InProgress,
            "done" => Self::Done,
            _ => Self::Open,
        }
    }
}

/// What a task is about.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "RelatedColumns", from = "RelatedColumns")]
pub enum RelatedTo {
    #[default]
    None,
    /// A company, by normalized key
    Company(CompanyKey),
    /// A contact, by id
    Contact(String),
    /// A deal, by id
    Deal(String),
}

/// Kind names accepted for `related_type`, lower-case.
pub const COMPANY_KINDS: [&str; 3] = ["company", "organisation", "organization"];

impl RelatedTo {
    /// Build from the two loose columns.
    ///
    /// Company ids are normalized to a [`CompanyKey`]. An unknown kind, or
    /// a kind without an id, yields `RelatedTo::None`.
    #[must_use]
    pub fn from_columns(kind: Option<&str>, id: Option<&str>) -> Self {
        let (Some(kind), Some(id)) = (kind, id) else {
            return Self::None;
        };
        let id = id.trim();
        if id.is_empty() {
            return Self::None;
        }
        match kind.trim().to_lowercase().as_str() {
            k if COMPANY_KINDS.contains(&k) => {
                CompanyKey::normalize(id).map_or(Self::None, Self::Company)
            }
            "contact" => Self::Contact(id.to_string()),
            "deal" => Self::Deal(id.to_string()),
            _ => Self::None,
        }
    }

    /// Split into `(related_type, related_id)` column values.
    #[must_use]
    pub fn to_columns(&self) -> (Option<&'static str>, Option<&str>) {
        match self {
            Self::None => (None, None),
            Self::Company(key) => (Some("company"), Some(key.as_str())),
            Self::Contact(id) => (Some("contact"), Some(id.as_str())),
            Self::Deal(id) => (Some("deal"), Some(id.as_str())),
        }
    }

    /// Whether this task belongs on the given company's profile.
    #[must_use]
    pub fn is_company(&self, key: &CompanyKey) -> bool {
        matches!(self, Self::Company(k) if k == key)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RelatedColumns {
    #[serde(default)]
    related_type: Option<String>,
    #[serde(default)]
    related_id: Option<String>,
}

impl From<RelatedColumns> for RelatedTo {
    fn from(columns: RelatedColumns) -> Self {
        Self::from_columns(columns.related_type.as_deref(), columns.related_id.as_deref())
    }
}

impl From<RelatedTo> for RelatedColumns {
    fn from(related: RelatedTo) -> Self {
        let (kind, id) = related.to_columns();
        Self {
            related_type: kind.map(str::to_string),
            related_id: id.map(str::to_string),
        }
    }
}

/// A follow-up item with an optional due date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub subject: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub related: RelatedTo,
    pub owner: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Validated input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub subject: String,
    pub due_at: Option<DateTime<Utc>>,
    pub related: RelatedTo,
    pub owner: Option<String>,
    pub status: TaskStatus,
}

/// Validated partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub subject: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub related: Option<RelatedTo>,
    pub owner: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.due_at.is_none()
            && self.related.is_none()
            && self.owner.is_none()
            && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_synonyms_normalize() {
        let related = RelatedTo::from_columns(Some("Organisation"), Some(" Acme Inc. "));
        let key = CompanyKey::normalize("acme inc.").unwrap();
        assert_eq!(related, RelatedTo::Company(key.clone()));
        assert!(related.is_company(&key));
        assert_eq!(related.to_columns(), (Some("company"), Some("acme inc.")));
    }

    #[test]
    fn test_unknown_or_partial_reference_is_none() {
        assert_eq!(RelatedTo::from_columns(Some("planet"), Some("mars")), RelatedTo::None);
        assert_eq!(RelatedTo::from_columns(Some("deal"), None), RelatedTo::None);
        assert_eq!(RelatedTo::from_columns(None, Some("d_1")), RelatedTo::None);
    }

    #[test]
    fn test_task_wire_format_keeps_loose_columns() {
        let task = Task {
            id: "task_1".to_string(),
            subject: "Call back".to_string(),
            due_at: None,
            related: RelatedTo::Deal("deal_9".to_string()),
            owner: Some("Ava".to_string()),
            status: TaskStatus::InProgress,
            created_at: None,
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["related_type"], "deal");
        assert_eq!(json["related_id"], "deal_9");
        assert_eq!(json["status"], "in_progress");

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_status_from_stored() {
        assert_eq!(TaskStatus::from_stored("done"), TaskStatus::Done);
        assert_eq!(TaskStatus::from_stored("IN_PROGRESS"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::from_stored("whatever"), TaskStatus::Open);
    }
}
