//! Pipeline and stage models.
//!
//! A pipeline is a named sales process; its stages are ordered by
//! `order_index` and carry a win probability used to weight expected
//! revenue.

use serde::{Deserialize, Serialize};

/// A named sales process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: String,
    pub name: String,
}

/// A step within a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub pipeline_id: String,
    pub name: String,
    /// Display order within the pipeline
    pub order_index: i64,
    /// Win probability in `0.0..=1.0`
    #[serde(default)]
    pub probability: f64,
}

/// `GET /api/pipelines` payload: every pipeline and every stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineCatalog {
    pub pipelines: Vec<Pipeline>,
    pub stages: Vec<Stage>,
}

impl PipelineCatalog {
    /// The first pipeline, which dashboards treat as primary.
    #[must_use]
    pub fn primary(&self) -> Option<&Pipeline> {
        self.pipelines.first()
    }

    /// Stages of one pipeline in display order.
    #[must_use]
    pub fn stages_of(&self, pipeline_id: &str) -> Vec<&Stage> {
        let mut stages: Vec<&Stage> = self
            .stages
            .iter()
            .filter(|stage| stage.pipeline_id == pipeline_id)
            .collect();
        stages.sort_by_key(|stage| stage.order_index);
        stages
    }

    #[must_use]
    pub fn stage(&self, stage_id: &str) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.id == stage_id)
    }
}

/// A pipeline together with its stages, as returned on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineWithStages {
    #[serde(flatten)]
    pub pipeline: Pipeline,
    pub stages: Vec<Stage>,
}

/// Validated input for creating a pipeline, optionally with its stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPipeline {
    pub name: String,
    pub stages: Vec<NewStage>,
}

/// Validated input for creating a stage.
///
/// `order_index` defaults to the end of the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewStage {
    pub name: String,
    pub probability: f64,
    pub order_index: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(id: &str, pipeline_id: &str, order_index: i64) -> Stage {
        Stage {
            id: id.to_string(),
            pipeline_id: pipeline_id.to_string(),
            name: id.to_uppercase(),
            order_index,
            probability: 0.5,
        }
    }

    #[test]
    fn test_stages_of_orders_by_index() {
        let catalog = PipelineCatalog {
            pipelines: vec![Pipeline {
                id: "p1".to_string(),
                name: "Sales".to_string(),
            }],
            stages: vec![stage("b", "p1", 1), stage("x", "p2", 0), stage("a", "p1", 0)],
        };

        let ids: Vec<&str> = catalog.stages_of("p1").iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(catalog.primary().map(|p| p.id.as_str()), Some("p1"));
        assert!(catalog.stage("x").is_some());
    }
}
