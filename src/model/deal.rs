//! Deal model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_timestamp, CompanyKey};

/// An opportunity with a monetary amount, placed on a pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    pub pipeline_id: Option<String>,
    pub stage_id: Option<String>,
    pub company: Option<String>,
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Joined from `stages` on read
    #[serde(default)]
    pub stage_name: Option<String>,

    /// Joined from `pipelines` on read
    #[serde(default)]
    pub pipeline_name: Option<String>,
}

impl Deal {
    #[must_use]
    pub fn company_key(&self) -> Option<CompanyKey> {
        self.company.as_deref().and_then(CompanyKey::normalize)
    }
}

/// Validated input for creating a deal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDeal {
    pub name: String,
    pub amount: Option<f64>,
    pub pipeline_id: Option<String>,
    pub stage_id: Option<String>,
    pub company: Option<String>,
    pub owner: Option<String>,
}

/// Validated partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealPatch {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub pipeline_id: Option<String>,
    pub stage_id: Option<String>,
    pub company: Option<String>,
    pub owner: Option<String>,
}

impl DealPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.amount.is_none()
            && self.pipeline_id.is_none()
            && self.stage_id.is_none()
            && self.company.is_none()
            && self.owner.is_none()
    }
}
