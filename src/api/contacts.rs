//! Contact endpoints.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

use super::response::{ApiData, ApiQuery, Deleted, JsonBody};
use super::{AppState, ListQuery, API_ACTOR};
use crate::error::{Error, Result};
use crate::model::Contact;
use crate::validate;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list).post(create))
        .route("/contacts/{id}", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<ApiData<Vec<Contact>>> {
    let opts = query.into_options();
    let contacts = state.with_store(move |store| store.list_contacts(&opts)).await?;
    Ok(ApiData::new(contacts))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> Result<ApiData<Contact>> {
    let input = validate::contact_create(&body)?;
    let contact = state
        .with_store(move |store| store.create_contact(&input, API_ACTOR))
        .await?;
    Ok(ApiData::new(contact))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiData<Contact>> {
    let contact = state
        .with_store(move |store| {
            store
                .get_contact(&id)?
                .ok_or(Error::ContactNotFound { id })
        })
        .await?;
    Ok(ApiData::new(contact))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<ApiData<Contact>> {
    let lookup = id.clone();
    let exists = state
        .with_store(move |store| Ok(store.get_contact(&lookup)?.is_some()))
        .await?;
    if !exists {
        return Err(Error::ContactNotFound { id });
    }

    let patch = validate::contact_patch(&body)?;
    let contact = state
        .with_store(move |store| store.update_contact(&id, &patch, API_ACTOR))
        .await?;
    Ok(ApiData::new(contact))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiData<Deleted>> {
    let deleted = state
        .with_store(move |store| store.delete_contact(&id, API_ACTOR))
        .await?;
    Ok(ApiData::new(Deleted { deleted }))
}
