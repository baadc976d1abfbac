//! Error types for Salesesy.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - HTTP status mapping for the API (400 validation, 404 not found, 413 body too large, 500 otherwise)
//! - Category-based exit codes for the CLI (2=db, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output in the API's `{ "error": { "message" } }` envelope

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Salesesy operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    ContactNotFound,
    DealNotFound,
    TaskNotFound,
    CompanyNotFound,

    // Validation (exit 4)
    ValidationFailed,
    InvalidArgument,
    PayloadTooLarge,

    // Client (exit 6)
    RequestFailed,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ContactNotFound => "CONTACT_NOT_FOUND",
            Self::DealNotFound => "DEAL_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::CompanyNotFound => "COMPANY_NOT_FOUND",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::RequestFailed => "REQUEST_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::ContactNotFound
            | Self::DealNotFound
            | Self::TaskNotFound
            | Self::CompanyNotFound => 3,
            Self::ValidationFailed | Self::InvalidArgument | Self::PayloadTooLarge => 4,
            Self::RequestFailed => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// HTTP status code used when the error crosses the API boundary.
    ///
    /// Validation (400), not-found (404) and oversized bodies (413) are
    /// client-visible; everything else is a generic 500.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::ValidationFailed | Self::InvalidArgument => 400,
            Self::ContactNotFound
            | Self::DealNotFound
            | Self::TaskNotFound
            | Self::CompanyNotFound => 404,
            Self::PayloadTooLarge => 413,
            _ => 500,
        }
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in Salesesy operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `salesesy init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Contact not found: {id}")]
    ContactNotFound { id: String },

    #[error("Deal not found: {id}")]
    DealNotFound { id: String },

    #[error("Task not found: {id}")]
    TaskNotFound { id: String },

    #[error("Company not found.")]
    CompanyNotFound { key: String },

    /// Field-shape or required-combination violation. The message is
    /// shown to API callers verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success answer from the API, carrying its error message.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A resource the view needs could not be fetched.
    #[error("Could not load {resource}: {message}")]
    LoadFailed { resource: String, message: String },

    #[error("Request body is larger than {limit} bytes.")]
    PayloadTooLarge { limit: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::ContactNotFound { .. } => ErrorCode::ContactNotFound,
            Self::DealNotFound { .. } => ErrorCode::DealNotFound,
            Self::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            Self::CompanyNotFound { .. } => ErrorCode::CompanyNotFound,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
            Self::Http(_) | Self::Api { .. } | Self::LoadFailed { .. } => ErrorCode::RequestFailed,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// HTTP status, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.error_code().http_status()
    }

    /// Whether the message may be shown to API callers.
    ///
    /// Database and internal failures are reported generically so that
    /// SQL text never leaks into responses.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }

    /// Message for the API error envelope.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            "Internal server error.".to_string()
        }
    }

    /// Context-aware recovery hint for humans at the terminal.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `salesesy init` to create the database".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::CompanyNotFound { key } => Some(format!(
                "No contacts or deals reference '{key}'. Use `salesesy leaderboard` to see known companies."
            )),

            Self::Http(_) | Self::LoadFailed { .. } => Some(
                "Is the API running? Start it with `salesesy serve`, or pass --demo-fallback."
                    .to_string(),
            ),

            Self::ContactNotFound { .. }
            | Self::DealNotFound { .. }
            | Self::TaskNotFound { .. }
            | Self::Validation(_)
            | Self::PayloadTooLarge { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Api { .. }
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation in the API error envelope.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.public_message(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(Error::Validation("bad".into()).http_status(), 400);
        assert_eq!(Error::ContactNotFound { id: "x".into() }.http_status(), 404);
        assert_eq!(
            Error::CompanyNotFound { key: "acme".into() }.http_status(),
            404
        );
        assert_eq!(Error::PayloadTooLarge { limit: 10 }.http_status(), 413);
        assert_eq!(Error::Other("boom".into()).http_status(), 500);
        assert_eq!(
            Error::Database(rusqlite::Error::QueryReturnedNoRows).http_status(),
            500
        );
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = Error::Database(rusqlite::Error::InvalidQuery);
        let json = err.to_structured_json();
        assert_eq!(json["error"]["message"], "Internal server error.");
        assert_eq!(json["error"]["code"], "DATABASE_ERROR");
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = Error::Validation("Deal name is required.".into());
        let json = err.to_structured_json();
        assert_eq!(json["error"]["message"], "Deal name is required.");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::NotInitialized.exit_code(), 2);
        assert_eq!(Error::TaskNotFound { id: "t".into() }.exit_code(), 3);
        assert_eq!(Error::Validation("v".into()).exit_code(), 4);
    }
}
