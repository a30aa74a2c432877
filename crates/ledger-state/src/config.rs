//! Connection configuration for the SurrealDB ledger backend
//!
//! Resolution order (first match wins):
//! 1. Cloud credentials: `LEDGER_DB_ENDPOINT`, `LEDGER_DB_USERNAME`,
//!    `LEDGER_DB_PASSWORD`, plus optional `LEDGER_DB_NAMESPACE`,
//!    `LEDGER_DB_DATABASE`, `LEDGER_DB_ROOT`
//! 2. `LEDGER_DB_URL`, any SurrealDB connection string
//! 3. Local persistence under `.itemledger/db`

use std::path::PathBuf;

use crate::error::StateError;

pub const ENV_ENDPOINT: &str = "LEDGER_DB_ENDPOINT";
pub const ENV_USERNAME: &str = "LEDGER_DB_USERNAME";
pub const ENV_PASSWORD: &str = "LEDGER_DB_PASSWORD";
pub const ENV_NAMESPACE: &str = "LEDGER_DB_NAMESPACE";
pub const ENV_DATABASE: &str = "LEDGER_DB_DATABASE";
pub const ENV_ROOT: &str = "LEDGER_DB_ROOT";
pub const ENV_URL: &str = "LEDGER_DB_URL";

pub const DEFAULT_NAMESPACE: &str = "ledger";
pub const DEFAULT_DATABASE: &str = "items";
pub const DEFAULT_LOCAL_PATH: &str = ".itemledger/db";

/// Configuration for an authenticated (cloud or remote) SurrealDB connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    /// Database username
    pub username: String,
    /// Database password
    pub password: String,
    /// Namespace (default: "ledger")
    pub namespace: String,
    /// Database name (default: "items")
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl CloudConfig {
    /// Create a new configuration for a database user
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            is_root: false,
        }
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Set whether this is a root user
    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, StateError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| StateError::Config(format!("{name} not set")))
        };
        let endpoint = required(ENV_ENDPOINT)?;
        let username = required(ENV_USERNAME)?;
        let password = required(ENV_PASSWORD)?;
        let namespace = lookup(ENV_NAMESPACE).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let database = lookup(ENV_DATABASE).unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let is_root = lookup(ENV_ROOT)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            password,
            namespace,
            database,
            is_root,
        })
    }
}

/// Where a SurrealDB-backed ledger should connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// Authenticated remote connection
    Cloud(CloudConfig),
    /// Unauthenticated connection string (`mem://`, `ws://…`, `surrealkv://…`)
    Url(String),
    /// Local on-disk SurrealKV directory
    Local(PathBuf),
}

impl ConnectTarget {
    /// Resolve the target from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the target from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Ok(config) = CloudConfig::from_lookup(&lookup) {
            return ConnectTarget::Cloud(config);
        }
        if let Some(url) = lookup(ENV_URL).filter(|u| !u.trim().is_empty()) {
            return ConnectTarget::Url(url);
        }
        ConnectTarget::Local(PathBuf::from(DEFAULT_LOCAL_PATH))
    }
}
