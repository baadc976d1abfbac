//! HTTP client for the Salesesy API and the client-side view model.
//!
//! [`ApiClient`] unwraps the `{"data": ...}` envelope and turns
//! `{"error": {"message"}}` answers into [`Error::Api`]. [`load_view`]
//! fetches every resource the view needs and feeds the outcomes into a
//! [`ViewState`].

pub mod demo;
pub mod state;

use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{CompanyProfile, Contact, Deal, PipelineCatalog, PipelineWithStages, Stage, Task};

pub use state::{
    Action, DataSource, FallbackPolicy, Loaded, Modal, Resource, Tab, Theme, ViewState,
};

/// Request timeout for every call.
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// `GET /api/health` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeleteResult {
    pub deleted: bool,
}

/// Query parameters for list endpoints.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

impl ListParams {
    /// The largest page the API serves.
    #[must_use]
    pub fn max_page() -> Self {
        Self {
            limit: Some(200),
            ..Self::default()
        }
    }
}

/// Typed wrapper over the HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Create a client for the API at `base_url`, e.g. `http://localhost:4000`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is invalid, or [`Error::Http`]
    /// if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid server URL '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!("Invalid server URL '{base_url}'")));
        }
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, base })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// `base` + `/api/` + the given path segments, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("Invalid server URL '{}'", self.base)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn request<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        query: Option<&ListParams>,
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        debug!(%method, %url, "API request");

        let mut request = self.http.request(method, url);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            let envelope: Envelope<T> = response.json().await?;
            return Ok(envelope.data);
        }

        let text = response.text().await.unwrap_or_default();
        Err(api_error(status, &text))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str], query: Option<&ListParams>) -> Result<T> {
        self.request::<T, Value>(Method::GET, segments, query, None).await
    }

    /// # Errors
    ///
    /// Returns [`Error::Http`] if the server cannot be reached, or
    /// [`Error::Api`] for an error answer.
    pub async fn health(&self) -> Result<Health> {
        self.get(&["health"], None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::health`].
    pub async fn contacts(&self, params: &ListParams) -> Result<Vec<Contact>> {
        self.get(&["contacts"], Some(params)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::health`].
    pub async fn contact(&self, id: &str) -> Result<Contact> {
        self.get(&["contacts", id], None).await
    }

    /// Create a contact from a raw JSON body; the server validates it.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::health`]. Validation failures are [`Error::Api`]
    /// with status 400.
    pub async fn create_contact(&self, body: &Value) -> Result<Contact> {
        self.request(Method::POST, &["contacts"], None, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::create_contact`].
    pub async fn update_contact(&self, id: &str, body: &Value) -> Result<Contact> {
        self.request(Method::PUT, &["contacts", id], None, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::health`].
    pub async fn delete_contact(&self, id: &str) -> Result<bool> {
        let result: DeleteResult = self
            .request::<_, Value>(Method::DELETE, &["contacts", id], None, None)
            .await?;
        Ok(result.deleted)
    }

    /// # Errors
    ///
    /// See [`ApiClient::health`].
    pub async fn deals(&self, params: &ListParams) -> Result<Vec<Deal>> {
        self.get(&["deals"], Some(params)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::create_contact`].
    pub async fn create_deal(&self, body: &Value) -> Result<Deal> {
        self.request(Method::POST, &["deals"], None, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::create_contact`].
    pub async fn update_deal(&self, id: &str, body: &Value) -> Result<Deal> {
        self.request(Method::PUT, &["deals", id], None, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::health`].
    pub async fn tasks(&self, params: &ListParams) -> Result<Vec<Task>> {
        self.get(&["tasks"], Some(params)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::create_contact`].
    pub async fn create_task(&self, body: &Value) -> Result<Task> {
        self.request(Method::POST, &["tasks"], None, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::health`].
    pub async fn pipelines(&self) -> Result<PipelineCatalog> {
        self.get(&["pipelines"], None).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::create_contact`].
    pub async fn create_pipeline(&self, body: &Value) -> Result<PipelineWithStages> {
        self.request(Method::POST, &["pipelines"], None, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::create_contact`].
    pub async fn create_stage(&self, body: &Value) -> Result<Stage> {
        self.request(Method::POST, &["stages"], None, Some(body)).await
    }

    /// Company profile by any spelling of its name.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::health`]. An unknown company is [`Error::Api`]
    /// with status 404.
    pub async fn company(&self, name: &str) -> Result<CompanyProfile> {
        self.get(&["companies", name], None).await
    }
}

/// Build [`Error::Api`] from a non-success answer, preferring the
/// envelope's message over the status reason.
fn api_error(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    Error::Api {
        status: status.as_u16(),
        message,
    }
}

fn outcome<T>(resource: Resource, result: Result<T>, wrap: fn(T) -> Loaded) -> Action {
    match result {
        Ok(value) => Action::Loaded(wrap(value)),
        Err(err) => Action::LoadFailed {
            resource,
            message: err.to_string(),
        },
    }
}

/// Fetch health, pipelines, contacts, deals and tasks concurrently and
/// build the view state from the outcomes.
pub async fn load_view(client: &ApiClient, fallback: FallbackPolicy) -> ViewState {
    let params = ListParams::max_page();
    let (health, pipelines, contacts, deals, tasks) = tokio::join!(
        client.health(),
        client.pipelines(),
        client.contacts(&params),
        client.deals(&params),
        client.tasks(&params),
    );

    let mut state = ViewState::new(fallback);
    state.apply_all([
        outcome(Resource::Health, health, |h| Loaded::Health(h.status)),
        outcome(Resource::Pipelines, pipelines, Loaded::Pipelines),
        outcome(Resource::Contacts, contacts, Loaded::Contacts),
        outcome(Resource::Deals, deals, Loaded::Deals),
        outcome(Resource::Tasks, tasks, Loaded::Tasks),
    ]);
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_segments() {
        let client = ApiClient::new("http://localhost:4000/").unwrap();
        let url = client.url(&["companies", "acme inc."]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/api/companies/acme%20inc.");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(ApiClient::new("not a url"), Err(Error::Config(_))));
        assert!(matches!(ApiClient::new("mailto:a@b.c"), Err(Error::Config(_))));
    }

    #[test]
    fn test_api_error_prefers_envelope_message() {
        let err = api_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":"VALIDATION_FAILED","message":"Deal name is required."}}"#,
        );
        assert_eq!(err.to_string(), "API error (400): Deal name is required.");

        let err = api_error(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.to_string(), "API error (502): Bad Gateway");
    }
}
