//! Configuration management.
//!
//! Settings resolve in this order: CLI flag, environment variable (clap
//! reads both), `.env` file (loaded by [`load_dotenv`] before parsing),
//! built-in default. This module holds the defaults and the pieces that
//! are not plain flags: database location, deployment environment, CORS
//! origins and the `LOG_LEVEL` switch.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default port for `salesesy serve`.
pub const DEFAULT_PORT: u16 = 4000;

/// Default bind address for `salesesy serve`.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default API base URL for the client commands.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:4000";

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Path value that selects an in-memory database.
pub const MEMORY_DB: &str = ":memory:";

/// Load `.env` from the current directory or its parents, if present.
///
/// Returns the file that was loaded. Variables already set win.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    Memory,
    File(PathBuf),
}

impl DbTarget {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == MEMORY_DB {
            Self::Memory
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

impl std::fmt::Display for DbTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str(MEMORY_DB),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Platform data directory, e.g. `~/.local/share/salesesy`.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "salesesy").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `SALESESY_TEST_DB=1` (or any non-empty
/// value other than `0`/`false`). It redirects the default database to an
/// isolated file.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("SALESESY_TEST_DB")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

/// Get the test database path: `<data dir>/test/salesesy.db`.
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("test").join("salesesy.db"))
}

/// Resolve the database location.
///
/// Priority:
/// 1. `explicit` (the `--db` flag or `SALESESY_DB`)
/// 2. `SALESESY_TEST_DB` → isolated test database
/// 3. `<data dir>/salesesy.db`
///
/// # Errors
///
/// Returns [`Error::Config`] if no data directory can be determined.
pub fn resolve_db_target(explicit: Option<&Path>) -> Result<DbTarget> {
    if let Some(path) = explicit {
        return Ok(DbTarget::from_path(path));
    }

    let path = if is_test_mode() {
        test_db_path()
    } else {
        data_dir().map(|dir| dir.join("salesesy.db"))
    };

    path.map(DbTarget::File).ok_or_else(|| {
        Error::Config("Could not determine a data directory; pass --db or set SALESESY_DB".to_string())
    })
}

/// Deployment environment from `SALESESY_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    /// Parse a value; anything unrecognised is development.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "test" => Self::Test,
            _ => Self::Development,
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        std::env::var("SALESESY_ENV")
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Which origins may call the API from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    AnyOrigin,
    Origins(Vec<String>),
}

impl CorsPolicy {
    /// Production honours `origins` (an empty list allows none); other
    /// environments allow any origin.
    #[must_use]
    pub fn for_environment(environment: Environment, origins: Option<&str>) -> Self {
        match environment {
            Environment::Production => Self::Origins(
                origins
                    .unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            Environment::Development | Environment::Test => Self::AnyOrigin,
        }
    }
}

/// Everything `salesesy serve` needs besides the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub cors: CorsPolicy,
}

impl ServerConfig {
    /// Combine listen flags with `SALESESY_ENV` and `SALESESY_CORS_ORIGINS`.
    #[must_use]
    pub fn new(host: &str, port: u16) -> Self {
        let environment = Environment::from_env();
        let origins = std::env::var("SALESESY_CORS_ORIGINS").ok();
        Self {
            host: host.to_string(),
            port,
            environment,
            cors: CorsPolicy::for_environment(environment, origins.as_deref()),
        }
    }

    /// Host and port for binding. IPv6 hosts may be given with or
    /// without brackets.
    #[must_use]
    pub fn bind_addr(&self) -> (&str, u16) {
        let host = self.host.trim();
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        (host, self.port)
    }
}

/// Whether `LOG_LEVEL` asks for silence (`silent`, `none` or `off`).
#[must_use]
pub fn logging_disabled(log_level: Option<&str>) -> bool {
    log_level.is_some_and(|level| {
        matches!(level.trim().to_lowercase().as_str(), "silent" | "none" | "off")
    })
}
