//! Pipeline and stage endpoints.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::Router;

use super::response::{ApiData, Deleted, JsonBody};
use super::{AppState, API_ACTOR};
use crate::error::Result;
use crate::model::{PipelineCatalog, PipelineWithStages, Stage};
use crate::validate;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pipelines", get(catalog).post(create_pipeline))
        .route("/pipelines/{id}", delete(delete_pipeline))
        .route("/stages", post(create_stage))
        .route("/stages/{id}", delete(delete_stage))
}

async fn catalog(State(state): State<AppState>) -> Result<ApiData<PipelineCatalog>> {
    let catalog = state.with_store(|store| store.pipeline_catalog()).await?;
    Ok(ApiData::new(catalog))
}

async fn create_pipeline(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> Result<ApiData<PipelineWithStages>> {
    let input = validate::pipeline_create(&body)?;
    let created = state
        .with_store(move |store| store.create_pipeline(&input, API_ACTOR))
        .await?;
    Ok(ApiData::new(created))
}

async fn delete_pipeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiData<Deleted>> {
    let deleted = state
        .with_store(move |store| store.delete_pipeline(&id, API_ACTOR))
        .await?;
    Ok(ApiData::new(Deleted { deleted }))
}

async fn create_stage(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> Result<ApiData<Stage>> {
    let (pipeline_id, input) = validate::stage_create(&body)?;
    let stage = state
        .with_store(move |store| store.create_stage(&pipeline_id, &input, API_ACTOR))
        .await?;
    Ok(ApiData::new(stage))
}

async fn delete_stage(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiData<Deleted>> {
    let deleted = state
        .with_store(move |store| store.delete_stage(&id, API_ACTOR))
        .await?;
    Ok(ApiData::new(Deleted { deleted }))
}
