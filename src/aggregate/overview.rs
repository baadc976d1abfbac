//! Dashboard overview figures.

use std::cmp::Ordering;

use serde::Serialize;

use crate::model::{Deal, PipelineCatalog, Stage, Task};

/// How many deals and tasks the overview lists.
pub const OVERVIEW_LIST_LEN: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DealTotals {
    pub count: usize,
    pub total: f64,
    /// Amounts weighted by their stage's win probability
    pub expected: f64,
    pub average: f64,
}

/// Deals sitting in one stage of the primary pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSnapshot {
    pub stage: Stage,
    pub count: usize,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub totals: DealTotals,
    /// Name of the pipeline the snapshot covers
    pub pipeline: Option<String>,
    pub snapshot: Vec<StageSnapshot>,
    pub top_deals: Vec<Deal>,
    pub upcoming_tasks: Vec<Task>,
}

/// Compute dashboard figures from fetched lists.
///
/// Deals whose stage is unknown count with probability 0. The snapshot
/// covers the first pipeline of the catalog, in stage order.
#[must_use]
pub fn build_overview(catalog: &PipelineCatalog, deals: &[Deal], tasks: &[Task]) -> Overview {
    let total: f64 = deals.iter().map(|d| d.amount).sum();
    let expected: f64 = deals
        .iter()
        .map(|deal| {
            let probability = deal
                .stage_id
                .as_deref()
                .and_then(|id| catalog.stage(id))
                .map_or(0.0, |stage| stage.probability);
            deal.amount * probability
        })
        .sum();

    let totals = DealTotals {
        count: deals.len(),
        total,
        expected,
        average: if deals.is_empty() {
            0.0
        } else {
            total / deals.len() as f64
        },
    };

    let primary = catalog.primary();
    let snapshot = primary
        .map(|pipeline| {
            catalog
                .stages_of(&pipeline.id)
                .into_iter()
                .map(|stage| {
                    let in_stage = deals.iter().filter(|deal| {
                        deal.pipeline_id.as_deref() == Some(stage.pipeline_id.as_str())
                            && deal.stage_id.as_deref() == Some(stage.id.as_str())
                    });
                    let (count, amount) =
                        in_stage.fold((0, 0.0), |(n, sum), deal| (n + 1, sum + deal.amount));
                    StageSnapshot {
                        stage: stage.clone(),
                        count,
                        amount,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let mut top_deals = deals.to_vec();
    top_deals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    top_deals.truncate(OVERVIEW_LIST_LEN);

    let mut upcoming_tasks = tasks.to_vec();
    upcoming_tasks.sort_by(|a, b| match (a.due_at, b.due_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    upcoming_tasks.truncate(OVERVIEW_LIST_LEN);

    Overview {
        totals,
        pipeline: primary.map(|p| p.name.clone()),
        snapshot,
        top_deals,
        upcoming_tasks,
    }
}
