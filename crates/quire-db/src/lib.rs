//! # quire-db
//!
//! PostgreSQL persistence layer for quire.
//!
//! This crate provides:
//! - Connection pool management and the persistence [`Gateway`]
//! - Idempotent schema setup for `entries`, `tags`, and `entry_tags`
//! - [`PgEntryRepository`], the implementation of [`EntryRepository`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use quire_db::{CreateEntryRequest, Database, DbConfig, EntryRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DbConfig::from_env()?;
//!     let db = Database::new(&config);
//!     db.gateway.initialize_schema().await;
//!
//!     let id = db
//!         .entries
//!         .create(CreateEntryRequest::new("Hello", "First entry").tags(["greeting"]))
//!         .await?;
//!
//!     println!("Created entry: {}", id);
//!     Ok(())
//! }
//! ```
pub mod entries;
pub mod gateway;
pub mod pool;
pub mod schema;

// Test fixtures for integration tests
pub mod test_fixtures;

// Re-export core types
pub use quire_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use entries::PgEntryRepository;
pub use gateway::Gateway;
pub use pool::{connect_options, create_lazy_pool, log_pool_metrics, PoolConfig};

/// Combined database context: the gateway plus the repository built on it.
#[derive(Debug, Clone)]
pub struct Database {
    /// Connection lifecycle and schema setup.
    pub gateway: Gateway,
    /// Entry and tag queries.
    pub entries: PgEntryRepository,
}

impl Database {
    /// Create a database context with default pool settings.
    pub fn new(config: &DbConfig) -> Self {
        Self::from_gateway(Gateway::new(config))
    }

    /// Create with custom pool configuration.
    pub fn with_pool_config(config: &DbConfig, pool_config: PoolConfig) -> Self {
        Self::from_gateway(Gateway::with_pool_config(config, pool_config))
    }

    /// Wrap an existing gateway.
    pub fn from_gateway(gateway: Gateway) -> Self {
        Self {
            entries: PgEntryRepository::new(gateway.clone()),
            gateway,
        }
    }

    /// Close pooled connections.
    pub async fn close(&self) {
        self.gateway.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
