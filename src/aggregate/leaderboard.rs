//! Company leaderboard over fetched contact and deal lists.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{CompanyKey, Contact, Deal, StageBreakdown, UNASSIGNED};

/// One company bucket on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRow {
    pub key: CompanyKey,
    /// First-seen spelling of the company, or `Unassigned`
    pub name: String,
    pub contact_count: usize,
    pub deal_count: usize,
    pub pipeline_value: f64,
    pub owners: Vec<String>,
    /// Stage counts, largest first
    pub stage_breakdown: StageBreakdown,
    pub last_activity: Option<DateTime<Utc>>,
}

impl CompanyRow {
    fn new(key: CompanyKey, name: String) -> Self {
        Self {
            key,
            name,
            contact_count: 0,
            deal_count: 0,
            pipeline_value: 0.0,
            owners: Vec::new(),
            stage_breakdown: StageBreakdown::new(),
            last_activity: None,
        }
    }

    fn touch(&mut self, at: Option<DateTime<Utc>>) {
        if at > self.last_activity {
            self.last_activity = at;
        }
    }
}

/// Figures across the whole leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardTotals {
    pub company_count: usize,
    pub deal_count: usize,
    pub pipeline_value: f64,
    /// Pipeline value per deal, 0 without deals
    pub average_deal: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    /// Highest pipeline value first, ties by deal count
    pub companies: Vec<CompanyRow>,
    pub totals: LeaderboardTotals,
    /// Deals per stage summed over all companies, largest first
    pub stage_tally: StageBreakdown,
}

impl Leaderboard {
    /// The company with the highest pipeline value.
    #[must_use]
    pub fn top(&self) -> Option<&CompanyRow> {
        self.companies.first()
    }
}

/// Group contacts and deals by normalized company and rank the groups.
///
/// Records without a company land in the `Unassigned` bucket. Missing
/// timestamps are ignored for last activity; deals without a stage name
/// are left out of the stage breakdown.
#[must_use]
pub fn build_leaderboard(contacts: &[Contact], deals: &[Deal]) -> Leaderboard {
    let mut rows: Vec<CompanyRow> = Vec::new();
    let mut index: HashMap<CompanyKey, usize> = HashMap::new();

    let mut bucket = |company: Option<&str>| -> usize {
        let trimmed = company.map(str::trim).filter(|c| !c.is_empty());
        let (key, name) = match trimmed.and_then(|c| CompanyKey::normalize(c).map(|k| (k, c))) {
            Some((key, name)) => (key, name.to_string()),
            None => (CompanyKey::unassigned(), UNASSIGNED.to_string()),
        };
        *index.entry(key.clone()).or_insert_with(|| {
            rows.push(CompanyRow::new(key, name));
            rows.len() - 1
        })
    };

    let mut placements = Vec::with_capacity(contacts.len() + deals.len());
    for contact in contacts {
        placements.push(bucket(contact.company.as_deref()));
    }
    for deal in deals {
        placements.push(bucket(deal.company.as_deref()));
    }

    let (contact_slots, deal_slots) = placements.split_at(contacts.len());
    for (contact, &slot) in contacts.iter().zip(contact_slots) {
        let row = &mut rows[slot];
        row.contact_count += 1;
        row.touch(contact.updated_at);
    }
    for (deal, &slot) in deals.iter().zip(deal_slots) {
        let row = &mut rows[slot];
        row.deal_count += 1;
        row.pipeline_value += deal.amount;
        if let Some(owner) = deal.owner.as_deref().filter(|o| !o.is_empty()) {
            if !row.owners.iter().any(|seen| seen == owner) {
                row.owners.push(owner.to_string());
            }
        }
        if let Some(stage) = deal.stage_name.as_deref().filter(|s| !s.is_empty()) {
            row.stage_breakdown.record(stage);
        }
        row.touch(deal.updated_at);
    }

    for row in &mut rows {
        row.stage_breakdown.sort_by_count_desc();
    }
    rows.sort_by(|a, b| {
        b.pipeline_value
            .total_cmp(&a.pipeline_value)
            .then_with(|| b.deal_count.cmp(&a.deal_count))
    });

    let deal_count: usize = rows.iter().map(|r| r.deal_count).sum();
    let pipeline_value: f64 = rows.iter().map(|r| r.pipeline_value).sum();
    let totals = LeaderboardTotals {
        company_count: rows.len(),
        deal_count,
        pipeline_value,
        average_deal: if deal_count == 0 {
            0.0
        } else {
            pipeline_value / deal_count as f64
        },
    };

    let mut stage_tally = StageBreakdown::new();
    for row in &rows {
        for (stage, count) in row.stage_breakdown.entries() {
            stage_tally.add(stage, *count);
        }
    }
    stage_tally.sort_by_count_desc();

    Leaderboard {
        companies: rows,
        totals,
        stage_tally,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_timestamp;

    fn contact(company: Option<&str>, updated_at: Option<&str>) -> Contact {
        Contact {
            id: "ct".to_string(),
            first_name: Some("A".to_string()),
            last_name: None,
            email: None,
            phone: None,
            title: None,
            address: None,
            company: company.map(str::to_string),
            created_at: None,
            updated_at: updated_at.and_then(parse_timestamp),
        }
    }

    fn deal(company: Option<&str>, amount: f64, stage: Option<&str>, owner: Option<&str>) -> Deal {
        Deal {
            id: "deal".to_string(),
            name: "D".to_string(),
            amount,
            pipeline_id: None,
            stage_id: None,
            company: company.map(str::to_string),
            owner: owner.map(str::to_string),
            created_at: None,
            updated_at: None,
            stage_name: stage.map(str::to_string),
            pipeline_name: None,
        }
    }

    #[test]
    fn test_ties_break_on_deal_count() {
        let deals = vec![
            deal(Some("A"), 60.0, None, None),
            deal(Some("A"), 40.0, None, None),
            deal(Some("B"), 50.0, None, None),
            deal(Some("B"), 25.0, None, None),
            deal(Some("B"), 25.0, None, None),
        ];
        let board = build_leaderboard(&[], &deals);
        let names: Vec<&str> = board.companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_variants_collapse_and_blank_is_unassigned() {
        let contacts = vec![
            contact(Some("Acme Inc."), Some("2024-03-01T00:00:00Z")),
            contact(Some("  ACME INC. "), Some("not a date")),
            contact(Some("Acme"), None),
            contact(None, None),
            contact(Some("   "), None),
        ];
        let board = build_leaderboard(&contacts, &[]);

        let acme = board
            .companies
            .iter()
            .find(|c| c.key.as_str() == "acme inc.")
            .unwrap();
        assert_eq!(acme.name, "Acme Inc.");
        assert_eq!(acme.contact_count, 2);
        assert_eq!(acme.last_activity, parse_timestamp("2024-03-01T00:00:00Z"));

        let unassigned = board.companies.iter().find(|c| c.name == UNASSIGNED).unwrap();
        assert_eq!(unassigned.contact_count, 2);
        assert_eq!(board.totals.company_count, 3);
    }

    #[test]
    fn test_totals_and_stage_tally() {
        let deals = vec![
            deal(Some("A"), 100.0, Some("New"), Some("Ava")),
            deal(Some("A"), 50.0, Some("Won"), Some("Ava")),
            deal(Some("B"), 30.0, Some("Won"), Some("Jan")),
            deal(Some("B"), 20.0, None, None),
        ];
        let board = build_leaderboard(&[], &deals);

        assert_eq!(board.totals.deal_count, 4);
        assert!((board.totals.pipeline_value - 200.0).abs() < f64::EPSILON);
        assert!((board.totals.average_deal - 50.0).abs() < f64::EPSILON);

        let tally: Vec<(&str, u64)> = board
            .stage_tally
            .entries()
            .iter()
            .map(|(s, c)| (s.as_str(), *c))
            .collect();
        assert_eq!(tally, vec![("Won", 2), ("New", 1)]);

        let top = board.top().unwrap();
        assert_eq!(top.name, "A");
        assert_eq!(top.owners, vec!["Ava"]);
    }

    #[test]
    fn test_empty_input() {
        let board = build_leaderboard(&[], &[]);
        assert!(board.companies.is_empty());
        assert_eq!(board.totals, LeaderboardTotals::default());
        assert!(board.top().is_none());
    }
}
