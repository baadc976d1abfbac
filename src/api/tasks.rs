//! Task endpoints.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

use super::response::{ApiData, ApiQuery, Deleted, JsonBody};
use super::{AppState, ListQuery, API_ACTOR};
use crate::error::{Error, Result};
use crate::model::Task;
use crate::validate;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list).post(create))
        .route("/tasks/{id}", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<ApiData<Vec<Task>>> {
    let opts = query.into_options();
    let tasks = state.with_store(move |store| store.list_tasks(&opts)).await?;
    Ok(ApiData::new(tasks))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> Result<ApiData<Task>> {
    let input = validate::task_create(&body)?;
    let task = state
        .with_store(move |store| store.create_task(&input, API_ACTOR))
        .await?;
    Ok(ApiData::new(task))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiData<Task>> {
    let task = state
        .with_store(move |store| store.get_task(&id)?.ok_or(Error::TaskNotFound { id }))
        .await?;
    Ok(ApiData::new(task))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<ApiData<Task>> {
    let lookup = id.clone();
    let exists = state
        .with_store(move |store| Ok(store.get_task(&lookup)?.is_some()))
        .await?;
    if !exists {
        return Err(Error::TaskNotFound { id });
    }

    let patch = validate::task_patch(&body)?;
    let task = state
        .with_store(move |store| store.update_task(&id, &patch, API_ACTOR))
        .await?;
    Ok(ApiData::new(task))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiData<Deleted>> {
    let deleted = state
        .with_store(move |store| store.delete_task(&id, API_ACTOR))
        .await?;
    Ok(ApiData::new(Deleted { deleted }))
}
