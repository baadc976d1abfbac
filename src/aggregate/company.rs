//! Company aggregation.
//!
//! A company has no row of its own. Its profile is assembled from the
//! contacts and deals whose `company` normalizes to the requested key,
//! plus the tasks that point at that key.

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{CompanyKey, CompanyProfile, CompanySummary, Contact, Deal, StageBreakdown};
use crate::storage::SqliteStorage;

/// Breakdown bucket for deals whose stage cannot be resolved.
pub const UNKNOWN_STAGE: &str = "Unknown";

/// Compute the summary for one company.
///
/// `contacts` are expected in last-name/first-name order and `deals`
/// newest first; the canonical name is taken from the first of them that
/// carries a non-blank company. Returns `None` when both lists are empty.
#[must_use]
pub fn summarize_company(raw_name: &str, contacts: &[Contact], deals: &[Deal]) -> Option<CompanySummary> {
    if contacts.is_empty() && deals.is_empty() {
        return None;
    }

    let name = contacts
        .iter()
        .filter_map(|c| c.company.as_deref())
        .chain(deals.iter().filter_map(|d| d.company.as_deref()))
        .map(str::trim)
        .find(|company| !company.is_empty())
        .unwrap_or_else(|| raw_name.trim())
        .to_string();

    let mut owners: Vec<String> = Vec::new();
    let mut stage_breakdown = StageBreakdown::new();
    let mut pipeline_value = 0.0;

    for deal in deals {
        pipeline_value += deal.amount;
        if let Some(owner) = deal.owner.as_deref().filter(|o| !o.is_empty()) {
            if !owners.iter().any(|seen| seen == owner) {
                owners.push(owner.to_string());
            }
        }
        let stage = deal
            .stage_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_STAGE);
        stage_breakdown.record(stage);
    }

    let last_activity = contacts
        .iter()
        .filter_map(|c| c.updated_at)
        .chain(deals.iter().filter_map(|d| d.updated_at))
        .max();

    Some(CompanySummary {
        name,
        contacts_count: contacts.len(),
        deals_count: deals.len(),
        pipeline_value,
        owners,
        last_activity,
        stage_breakdown,
    })
}

/// Load everything the company profile shows.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a blank identifier,
/// [`Error::CompanyNotFound`] when no contact or deal matches, or a
/// database error.
pub fn company_profile(storage: &SqliteStorage, raw_name: &str) -> Result<CompanyProfile> {
    let key = CompanyKey::normalize(raw_name)
        .ok_or_else(|| Error::Validation("Company identifier is required.".to_string()))?;

    let contacts = storage.contacts_for_company(&key)?;
    let deals = storage.deals_for_company(&key)?;

    let summary = summarize_company(raw_name, &contacts, &deals).ok_or_else(|| {
        Error::CompanyNotFound {
            key: key.to_string(),
        }
    })?;
    let tasks = storage.company_tasks(&key)?;

    debug!(
        company = %key,
        contacts = contacts.len(),
        deals = deals.len(),
        tasks = tasks.len(),
        "Assembled company profile"
    );

    Ok(CompanyProfile {
        summary,
        contacts,
        deals,
        tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_timestamp, NewContact, NewDeal, NewTask, RelatedTo};

    fn contact(company: Option<&str>, updated_at: &str) -> Contact {
        Contact {
            id: "ct_1".to_string(),
            first_name: Some("Ava".to_string()),
            last_name: Some("Nowak".to_string()),
            email: None,
            phone: None,
            title: None,
            address: None,
            company: company.map(str::to_string),
            created_at: None,
            updated_at: parse_timestamp(updated_at),
        }
    }

    fn deal(amount: f64, stage: Option<&str>, owner: Option<&str>, updated_at: &str) -> Deal {
        Deal {
            id: "deal_1".to_string(),
            name: "Deal".to_string(),
            amount,
            pipeline_id: None,
            stage_id: None,
            company: Some("ACME inc.".to_string()),
            owner: owner.map(str::to_string),
            created_at: None,
            updated_at: parse_timestamp(updated_at),
            stage_name: stage.map(str::to_string),
            pipeline_name: None,
        }
    }

    #[test]
    fn test_no_records_is_not_found() {
        assert!(summarize_company("acme", &[], &[]).is_none());
    }

    #[test]
    fn test_summary_figures() {
        let contacts = vec![contact(Some(" Acme Inc. "), "2024-03-01T00:00:00Z")];
        let deals = vec![
            deal(100.0, Some("Proposal"), Some("Ava"), "2024-03-05T00:00:00Z"),
            deal(50.5, None, Some("Jan"), "2024-02-01T00:00:00Z"),
            deal(0.0, Some("Proposal"), Some("Ava"), "garbage"),
        ];

        let summary = summarize_company("acme inc.", &contacts, &deals).unwrap();
        assert_eq!(summary.name, "Acme Inc.");
        assert_eq!(summary.contacts_count, 1);
        assert_eq!(summary.deals_count, 3);
        assert!((summary.pipeline_value - 150.5).abs() < f64::EPSILON);
        assert_eq!(summary.owners, vec!["Ava", "Jan"]);
        assert_eq!(summary.stage_breakdown.get("Proposal"), Some(2));
        assert_eq!(summary.stage_breakdown.get(UNKNOWN_STAGE), Some(1));
        assert_eq!(summary.stage_breakdown.total(), summary.deals_count as u64);
        assert_eq!(summary.last_activity, parse_timestamp("2024-03-05T00:00:00Z"));
    }

    #[test]
    fn test_name_falls_back_to_deals_then_input() {
        let deals = vec![deal(1.0, None, None, "")];
        let summary = summarize_company("acme inc.", &[contact(Some("  "), "")], &deals).unwrap();
        assert_eq!(summary.name, "ACME inc.");
        assert!(summary.last_activity.is_none());

        let summary = summarize_company(" Raw Input ", &[contact(None, "")], &[]).unwrap();
        assert_eq!(summary.name, "Raw Input");
    }

    #[test]
    fn test_company_profile_from_store() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .create_contact(
                &NewContact {
                    first_name: Some("Ava".to_string()),
                    last_name: Some("Nowak".to_string()),
                    company: Some("Acme Inc.".to_string()),
                    ..NewContact::default()
                },
                "test",
            )
            .unwrap();
        storage
            .create_deal(
                &NewDeal {
                    name: "Website redesign".to_string(),
                    amount: Some(40000.0),
                    company: Some("Acme Inc.".to_string()),
                    ..NewDeal::default()
                },
                "test",
            )
            .unwrap();
        storage
            .create_task(
                &NewTask {
                    subject: "Follow up".to_string(),
                    related: RelatedTo::Company(CompanyKey::normalize("acme inc.").unwrap()),
                    ..NewTask::default()
                },
                "test",
            )
            .unwrap();

        let profile = company_profile(&storage, "ACME INC.").unwrap();
        assert_eq!(profile.summary.name, "Acme Inc.");
        assert_eq!(profile.summary.contacts_count, 1);
        assert!((profile.summary.pipeline_value - 40000.0).abs() < f64::EPSILON);
        assert_eq!(profile.tasks.len(), 1);

        let missing = company_profile(&storage, "Globex").unwrap_err();
        assert!(matches!(missing, Error::CompanyNotFound { .. }));

        let blank = company_profile(&storage, "   ").unwrap_err();
        assert_eq!(blank.to_string(), "Company identifier is required.");
    }
}
