//! HTTP JSON API.
//!
//! Routes live under `/api`. Handlers validate input, then run store
//! calls on tokio's blocking pool against the single shared connection.
//!
//! # Submodules
//!
//! - [`companies`] - Company profile
//! - [`contacts`] - Contact CRUD
//! - [`deals`] - Deal CRUD
//! - [`pipelines`] - Pipelines and stages
//! - [`response`] - Envelopes and body parsing
//! - [`tasks`] - Task CRUD

pub mod companies;
pub mod contacts;
pub mod deals;
pub mod pipelines;
pub mod response;
pub mod tasks;

use std::sync::{Arc, Mutex};

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{CorsPolicy, ServerConfig, BODY_LIMIT_BYTES};
use crate::error::{Error, Result};
use crate::storage::{ListOptions, SqliteStorage};

pub use response::{ApiData, Deleted};

/// Actor recorded for mutations made through the API.
pub(crate) const API_ACTOR: &str = "api";

/// Shared handler state: one store behind a mutex.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Mutex<SqliteStorage>>,
}

impl AppState {
    #[must_use]
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// Run `f` against the store on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or [`Error::Other`] if the lock is
    /// poisoned or the blocking task panics.
    pub async fn with_store<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut SqliteStorage) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let mut guard = storage
                .lock()
                .map_err(|_| Error::Other("Store lock poisoned".to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| Error::Other(format!("Store task failed: {e}")))?
    }
}

/// `limit`, `offset`, `sort`, `order` (or `sortDirection` / `direction`)
/// and `q`, all as raw strings so bad numbers fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    limit: Option<String>,
    offset: Option<String>,
    sort: Option<String>,
    order: Option<String>,
    #[serde(rename = "sortDirection")]
    sort_direction: Option<String>,
    direction: Option<String>,
    q: Option<String>,
}

impl ListQuery {
    #[must_use]
    pub fn into_options(self) -> ListOptions {
        let order = self.order.or(self.sort_direction).or(self.direction);
        ListOptions::from_query(
            self.limit.as_deref(),
            self.offset.as_deref(),
            self.sort.as_deref(),
            order.as_deref(),
            self.q.as_deref(),
        )
    }
}

async fn health() -> ApiData<serde_json::Value> {
    ApiData::new(json!({ "status": "ok" }))
}

/// The API router with permissive CORS.
pub fn router(state: AppState) -> Router {
    router_with_cors(state, CorsLayer::permissive())
}

/// The API router with the given CORS layer, request tracing and the
/// body size limit.
pub fn router_with_cors(state: AppState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(contacts::routes())
        .merge(deals::routes())
        .merge(tasks::routes())
        .merge(pipelines::routes())
        .merge(companies::routes());

    Router::new()
        .nest("/api", api)
        .fallback(response::route_not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the CORS layer for a policy.
#[must_use]
pub fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    match policy {
        CorsPolicy::AnyOrigin => CorsLayer::permissive(),
        CorsPolicy::Origins(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(%origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(Any)
        }
    }
}

/// Serve the API on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`Error::Io`] if the server fails.
pub async fn serve<S>(listener: TcpListener, state: AppState, config: &ServerConfig, shutdown: S) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let app = router_with_cors(state, cors_layer(&config.cors));
    let addr = listener.local_addr()?;
    info!(%addr, environment = config.environment.as_str(), "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("API stopped");
    Ok(())
}
