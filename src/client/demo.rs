//! Bundled sample data shown when the API cannot be reached and the
//! caller allows falling back to it.

use crate::model::{
    parse_timestamp, Contact, Deal, Pipeline, PipelineCatalog, RelatedTo, Stage, Task, TaskStatus,
};

const PIPELINE_ID: &str = "pipe-sales";
const PIPELINE_NAME: &str = "Sales Pipeline";

/// `(id, name, probability)` in display order
const STAGES: [(&str, &str, f64); 5] = [
    ("stage-new", "New", 0.1),
    ("stage-qualified", "Qualified", 0.3),
    ("stage-proposal", "Proposal", 0.6),
    ("stage-negotiation", "Negotiation", 0.8),
    ("stage-won", "Won", 1.0),
];

/// `(id, name, amount, stage index, company, owner, updated_at)`
#[rustfmt::skip]
const DEALS: [(&str, &str, f64, usize, &str, &str, &str); 10] = [
    ("deal-1", "Email automation pilot", 25000.0, 0, "Globex Corporation", "Ava", "2024-03-29T10:35:00Z"),
    ("deal-2", "Website redesign", 40000.0, 0, "Acme Inc.", "Ola", "2024-03-30T09:10:00Z"),
    ("deal-3", "Field enablement suite", 32000.0, 1, "Initech", "Jan", "2024-03-28T14:22:00Z"),
    ("deal-4", "Predictive dashboards", 52000.0, 1, "Stark Industries", "Ava", "2024-03-30T16:48:00Z"),
    ("deal-5", "Security revamp", 66000.0, 2, "Wayne Enterprises", "Ola", "2024-03-28T11:05:00Z"),
    ("deal-6", "Lifecycle marketing", 54000.0, 2, "Wonka Labs", "Jan", "2024-03-27T09:51:00Z"),
    ("deal-7", "Enterprise support expansion", 85000.0, 3, "Globex Corporation", "Ava", "2024-03-31T17:20:00Z"),
    ("deal-8", "Ops analytics rollout", 15000.0, 3, "Stark Industries", "Jan", "2024-03-30T13:44:00Z"),
    ("deal-9", "Customer success suite", 34000.0, 4, "Pied Piper", "Ola", "2024-03-24T08:17:00Z"),
    ("deal-10", "Quarterly training", 25000.0, 4, "Acme Inc.", "Ava", "2024-03-26T15:02:00Z"),
];

/// `(id, first, last, email, phone, company, title, created_at, updated_at)`
#[rustfmt::skip]
const CONTACTS: [(&str, &str, &str, &str, &str, &str, &str, &str, &str); 7] = [
    ("contact-ava", "Ava", "Nowak", "ava.nowak@example.com", "+48 123 456 789", "Acme Inc.", "Operations lead", "2024-03-20T09:00:00Z", "2024-03-31T11:05:00Z"),
    ("contact-jan", "Jan", "Kowalski", "jan.kowalski@example.com", "+48 987 654 321", "Globex Corporation", "Account executive", "2024-03-18T10:15:00Z", "2024-03-30T16:20:00Z"),
    ("contact-ola", "Ola", "Zielinska", "ola.z@example.com", "+48 555 222 111", "Initech", "Marketing lead", "2024-03-15T08:45:00Z", "2024-03-28T09:45:00Z"),
    ("contact-victor", "Victor", "Chen", "victor.chen@globex.com", "+48 345 987 654", "Globex Corporation", "CTO", "2024-03-12T11:30:00Z", "2024-03-29T08:12:00Z"),
    ("contact-sam", "Sam", "Lee", "sam.lee@acme.com", "+48 444 333 111", "Acme Inc.", "CFO", "2024-03-10T07:20:00Z", "2024-03-27T12:45:00Z"),
    ("contact-pepper", "Pepper", "Potts", "pepper@stark.com", "+1 555 0100", "Stark Industries", "COO", "2024-03-08T15:10:00Z", "2024-03-30T16:48:00Z"),
    ("contact-bruce", "Bruce", "Wayne", "bruce@wayneenterprises.com", "+1 555 0199", "Wayne Enterprises", "CEO", "2024-03-05T09:50:00Z", "2024-03-29T14:10:00Z"),
];

/// `(id, subject, due_at, related_type, related_id, owner, created_at)`
#[rustfmt::skip]
const TASKS: [(&str, &str, &str, &str, &str, &str, &str); 5] = [
    ("task-1", "Send renewal proposal", "2024-04-02T10:00:00Z", "deal", "deal-7", "Ava", "2024-03-28T09:12:00Z"),
    ("task-2", "Prep discovery agenda", "2024-04-03T09:30:00Z", "deal", "deal-3", "Jan", "2024-03-29T14:08:00Z"),
    ("task-3", "Email call recap", "2024-04-04T16:00:00Z", "deal", "deal-6", "Ola", "2024-03-30T11:27:00Z"),
    ("task-4", "Schedule onboarding", "2024-04-05T13:00:00Z", "company", "Globex", "Ava", "2024-03-28T08:15:00Z"),
    ("task-5", "Close lost feedback", "2024-04-01T12:00:00Z", "deal", "deal-10", "Jan", "2024-03-26T10:42:00Z"),
];

#[must_use]
pub fn catalog() -> PipelineCatalog {
    PipelineCatalog {
        pipelines: vec![Pipeline {
            id: PIPELINE_ID.to_string(),
            name: PIPELINE_NAME.to_string(),
        }],
        stages: (0_i64..)
            .zip(STAGES)
            .map(|(order_index, (id, name, probability))| Stage {
                id: id.to_string(),
                pipeline_id: PIPELINE_ID.to_string(),
                name: name.to_string(),
                order_index,
                probability,
            })
            .collect(),
    }
}

#[must_use]
pub fn contacts() -> Vec<Contact> {
    CONTACTS
        .iter()
        .map(|&(id, first, last, email, phone, company, title, created, updated)| Contact {
            id: id.to_string(),
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
            title: Some(title.to_string()),
            address: None,
            company: Some(company.to_string()),
            created_at: parse_timestamp(created),
            updated_at: parse_timestamp(updated),
        })
        .collect()
}

#[must_use]
pub fn deals() -> Vec<Deal> {
    DEALS
        .iter()
        .map(|&(id, name, amount, stage, company, owner, updated)| {
            let (stage_id, stage_name, _) = STAGES[stage];
            Deal {
                id: id.to_string(),
                name: name.to_string(),
                amount,
                pipeline_id: Some(PIPELINE_ID.to_string()),
                stage_id: Some(stage_id.to_string()),
                company: Some(company.to_string()),
                owner: Some(owner.to_string()),
                created_at: None,
                updated_at: parse_timestamp(updated),
                stage_name: Some(stage_name.to_string()),
                pipeline_name: Some(PIPELINE_NAME.to_string()),
            }
        })
        .collect()
}

#[must_use]
pub fn tasks() -> Vec<Task> {
    TASKS
        .iter()
        .map(|&(id, subject, due, kind, related_id, owner, created)| Task {
            id: id.to_string(),
            subject: subject.to_string(),
            due_at: parse_timestamp(due),
            related: RelatedTo::from_columns(Some(kind), Some(related_id)),
            owner: Some(owner.to_string()),
            status: TaskStatus::Open,
            created_at: parse_timestamp(created),
        })
        .collect()
}
