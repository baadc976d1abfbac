//! Deal endpoints. Rows carry the joined stage and pipeline names.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

use super::response::{ApiData, ApiQuery, Deleted, JsonBody};
use super::{AppState, ListQuery, API_ACTOR};
use crate::error::{Error, Result};
use crate::model::Deal;
use crate::validate;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/deals", get(list).post(create))
        .route("/deals/{id}", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<ApiData<Vec<Deal>>> {
    let opts = query.into_options();
    let deals = state.with_store(move |store| store.list_deals(&opts)).await?;
    Ok(ApiData::new(deals))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> Result<ApiData<Deal>> {
    let input = validate::deal_create(&body)?;
    let deal = state
        .with_store(move |store| store.create_deal(&input, API_ACTOR))
        .await?;
    Ok(ApiData::new(deal))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiData<Deal>> {
    let deal = state
        .with_store(move |store| store.get_deal(&id)?.ok_or(Error::DealNotFound { id }))
        .await?;
    Ok(ApiData::new(deal))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<ApiData<Deal>> {
    let lookup = id.clone();
    let exists = state
        .with_store(move |store| Ok(store.get_deal(&lookup)?.is_some()))
        .await?;
    if !exists {
        return Err(Error::DealNotFound { id });
    }

    let patch = validate::deal_patch(&body)?;
    let deal = state
        .with_store(move |store| store.update_deal(&id, &patch, API_ACTOR))
        .await?;
    Ok(ApiData::new(deal))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiData<Deleted>> {
    let deleted = state
        .with_store(move |store| store.delete_deal(&id, API_ACTOR))
        .await?;
    Ok(ApiData::new(Deleted { deleted }))
}
