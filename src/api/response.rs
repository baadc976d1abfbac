//! Response envelopes and request extractors.
//!
//! Success bodies are `{"data": ...}`; failures are
//! `{"error": {"code", "message"}}` with the status from
//! [`Error::http_status`]. [`JsonBody`] and [`ApiQuery`] turn axum's
//! extractor rejections into [`Error`] so they use the same envelope.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use crate::config::BODY_LIMIT_BYTES;
use crate::error::Error;

/// Wraps a payload in the `{"data": ...}` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiData<T> {
    pub data: T,
}

impl<T> ApiData<T> {
    pub const fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiData<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Result of a DELETE.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self, code = self.error_code().as_str(), "Request failed");
        }
        (status, Json(self.to_structured_json())).into_response()
    }
}

/// Untyped JSON request body; field checks happen in `validate`.
#[derive(Debug)]
pub struct JsonBody(pub Value);

impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                Error::PayloadTooLarge {
                    limit: BODY_LIMIT_BYTES,
                }
            } else {
                Error::Validation(rejection.body_text())
            }
        })?;
        Ok(Self(parse_body(&body)?))
    }
}

/// Query-string extractor whose rejection is a validation error.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::try_from_uri(&parts.uri)
            .map_err(|rejection| Error::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Parse a JSON request body. An empty body reads as `{}`.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the body is not valid JSON.
pub fn parse_body(body: &Bytes) -> Result<Value, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body)
        .map_err(|_| Error::Validation("Request body must be valid JSON.".to_string()))
}

/// Fallback for unknown routes.
pub async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": { "code": "NOT_FOUND", "message": "Not found" } })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(&Bytes::from_static(b"")).unwrap(), json!({}));
        assert_eq!(parse_body(&Bytes::from_static(b" \n")).unwrap(), json!({}));
        assert_eq!(
            parse_body(&Bytes::from_static(br#"{"a":1}"#)).unwrap(),
            json!({ "a": 1 })
        );
        assert!(matches!(
            parse_body(&Bytes::from_static(b"{nope")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_error_status() {
        let response = Error::Validation("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = Error::DealNotFound { id: "d".to_string() }.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = Error::Other("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
