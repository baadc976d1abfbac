//! Company profile endpoint.
//!
//! `GET /api/companies/{companyId}` where the id is any spelling of the
//! company name; it is normalized before matching.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

use super::response::ApiData;
use super::AppState;
use crate::aggregate::company_profile;
use crate::error::Result;
use crate::model::CompanyProfile;

pub fn routes() -> Router<AppState> {
    Router::new().route("/companies/{company_id}", get(show))
}

async fn show(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> Result<ApiData<CompanyProfile>> {
    let profile = state
        .with_store(move |store| company_profile(store, &company_id))
        .await?;
    Ok(ApiData::new(profile))
}
