//! Demo data for a fresh database.

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::model::{CompanyKey, NewContact, NewDeal, NewPipeline, NewStage, NewTask, RelatedTo};
use crate::storage::SqliteStorage;

/// Stages of the demo pipeline with their win probabilities.
pub const DEMO_STAGES: [(&str, f64); 6] = [
    ("New", 0.1),
    ("Qualified", 0.3),
    ("Proposal", 0.6),
    ("Negotiation", 0.8),
    ("Won", 1.0),
    ("Lost", 0.0),
];

/// `(first, last, email, phone, company)`
const DEMO_CONTACTS: [(&str, &str, &str, &str, &str); 3] = [
    ("Ava", "Nowak", "ava.nowak@example.com", "+48 123 456 789", "Acme"),
    ("Jan", "Kowalski", "jan.kowalski@example.com", "+48 987 654 321", "Globex"),
    ("Ola", "Zielińska", "ola.z@example.com", "+48 555 222 111", "Initech"),
];

/// `(name, amount, company, owner)`, all placed in the first stage
const DEMO_DEALS: [(&str, f64, &str, &str); 2] = [
    ("Website redesign", 15000.0, "Acme", "Ava"),
    ("Annual subscription", 2400.0, "Globex", "Jan"),
];

/// What a seed run inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub pipelines: usize,
    pub stages: usize,
    pub contacts: usize,
    pub deals: usize,
    pub tasks: usize,
}

impl SqliteStorage {
    /// Insert the demo pipeline, contacts, deals and a company task.
    ///
    /// Rows are added alongside whatever exists; callers decide whether
    /// to clear first.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails.
    pub fn seed_demo(&mut self, actor: &str) -> Result<SeedReport> {
        let pipeline = self.create_pipeline(
            &NewPipeline {
                name: "Sales Pipeline".to_string(),
                stages: DEMO_STAGES
                    .iter()
                    .map(|&(name, probability)| NewStage {
                        name: name.to_string(),
                        probability,
                        order_index: None,
                    })
                    .collect(),
            },
            actor,
        )?;

        let mut report = SeedReport {
            pipelines: 1,
            stages: pipeline.stages.len(),
            ..SeedReport::default()
        };

        for (first, last, email, phone, company) in DEMO_CONTACTS {
            self.create_contact(
                &NewContact {
                    first_name: Some(first.to_string()),
                    last_name: Some(last.to_string()),
                    email: Some(email.to_string()),
                    phone: Some(phone.to_string()),
                    company: Some(company.to_string()),
                    ..NewContact::default()
                },
                actor,
            )?;
            report.contacts += 1;
        }

        let first_stage = pipeline.stages.first().map(|stage| stage.id.clone());
        for (name, amount, company, owner) in DEMO_DEALS {
            self.create_deal(
                &NewDeal {
                    name: name.to_string(),
                    amount: Some(amount),
                    pipeline_id: Some(pipeline.pipeline.id.clone()),
                    stage_id: first_stage.clone(),
                    company: Some(company.to_string()),
                    owner: Some(owner.to_string()),
                },
                actor,
            )?;
            report.deals += 1;
        }

        self.create_task(
            &NewTask {
                subject: "Kick-off call with Acme".to_string(),
                due_at: Some(chrono::Utc::now() + chrono::Duration::days(2)),
                related: CompanyKey::normalize("Acme").map_or(RelatedTo::None, RelatedTo::Company),
                owner: Some("Ava".to_string()),
                ..NewTask::default()
            },
            actor,
        )?;
        report.tasks += 1;

        info!(?report, "Seeded demo data");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ListOptions;

    #[test]
    fn test_seed_demo() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let report = storage.seed_demo("test").unwrap();

        assert_eq!(
            report,
            SeedReport {
                pipelines: 1,
                stages: 6,
                contacts: 3,
                deals: 2,
                tasks: 1,
            }
        );
        assert!(!storage.is_empty().unwrap());

        let deals = storage.list_deals(&ListOptions::default()).unwrap();
        assert!(deals.iter().all(|d| d.stage_name.as_deref() == Some("New")));

        let acme = CompanyKey::normalize("acme").unwrap();
        assert_eq!(storage.company_tasks(&acme).unwrap().len(), 1);

        storage.clear_all("test").unwrap();
        assert!(storage.is_empty().unwrap());
    }
}
