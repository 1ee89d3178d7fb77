//! Database connection configuration.
//!
//! Built once at process start and handed to the gateway by reference.
//! Keys follow the tool's `.env` format:
//!
//! ```text
//! user=postgres.your_project_id
//! password=your_password
//! host=aws-0-region.pooler.supabase.com
//! port=6543
//! dbname=postgres
//! ```

use std::fmt;

use tracing::error;

use crate::defaults;
use crate::error::{Error, Result};

/// Environment key for the database user.
pub const ENV_USER: &str = "user";
/// Environment key for the database password.
pub const ENV_PASSWORD: &str = "password";
/// Environment key for the database host.
pub const ENV_HOST: &str = "host";
/// Environment key for the database port.
pub const ENV_PORT: &str = "port";
/// Environment key for the database name.
pub const ENV_DBNAME: &str = "dbname";
/// Optional schema search path (comma-separated schemas).
pub const ENV_SEARCH_PATH: &str = "DB_SEARCH_PATH";
/// Optional prepared statement cache size; `0` disables caching.
pub const ENV_STATEMENT_CACHE_CAPACITY: &str = "DB_STATEMENT_CACHE_CAPACITY";

/// Connection parameters that must all be non-empty.
pub const REQUIRED_KEYS: [&str; 5] = [ENV_USER, ENV_PASSWORD, ENV_HOST, ENV_PORT, ENV_DBNAME];

/// Connection parameters for the PostgreSQL backend.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    /// Kept as text so an unset or malformed value can be reported instead of
    /// failing at load time.
    pub port: String,
    pub dbname: String,
    /// Sets `search_path` on every connection when present.
    pub search_path: Option<String>,
    /// Prepared statements cached per connection. Transaction-mode poolers
    /// (PgBouncer, Supabase port 6543) need `0`.
    pub statement_cache_capacity: usize,
}

impl DbConfig {
    /// Build a configuration from explicit values.
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            host: host.into(),
            port: port.to_string(),
            dbname: dbname.into(),
            search_path: None,
            statement_cache_capacity: defaults::STATEMENT_CACHE_CAPACITY,
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// Missing keys become empty strings; call [`DbConfig::validate`] to find
    /// out which ones.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();

        let statement_cache_capacity = match lookup(ENV_STATEMENT_CACHE_CAPACITY) {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                Error::Config(format!(
                    "{} must be a non-negative integer, got '{}'",
                    ENV_STATEMENT_CACHE_CAPACITY, raw
                ))
            })?,
            None => defaults::STATEMENT_CACHE_CAPACITY,
        };

        let search_path = Some(get(ENV_SEARCH_PATH)).filter(|s| !s.is_empty());

        Ok(Self {
            user: get(ENV_USER),
            // Passwords are taken verbatim; surrounding spaces may be significant.
            password: lookup(ENV_PASSWORD).unwrap_or_default(),
            host: get(ENV_HOST),
            port: get(ENV_PORT),
            dbname: get(ENV_DBNAME),
            search_path,
            statement_cache_capacity,
        })
    }

    /// Set the schema search path.
    pub fn search_path(mut self, search_path: impl Into<String>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Set the per-connection prepared statement cache size.
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    /// Names of required parameters that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let values = [
            &self.user,
            &self.password,
            &self.host,
            &self.port,
            &self.dbname,
        ];
        REQUIRED_KEYS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| *key)
            .collect()
    }

    /// Check that every required parameter is set.
    ///
    /// Logs the missing keys and returns `false` instead of failing, so the
    /// caller decides how to react.
    pub fn validate(&self) -> bool {
        let missing = self.missing_fields();
        if missing.is_empty() {
            return true;
        }
        error!(
            subsystem = "config",
            missing = %missing.join(", "),
            "Missing required environment variables"
        );
        false
    }

    /// Validate and return the numeric port.
    pub fn require_valid(&self) -> Result<u16> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }
        self.port.parse::<u16>().map_err(|_| {
            Error::Config(format!("port must be a number between 0 and 65535, got '{}'", self.port))
        })
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("search_path", &self.search_path)
            .field("statement_cache_capacity", &self.statement_cache_capacity)
            .finish()
    }
}
