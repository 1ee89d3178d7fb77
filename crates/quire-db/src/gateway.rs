//! Persistence gateway: connection acquisition, scoped use, and schema setup.
//!
//! The gateway is the only place connections come from. Repository calls
//! borrow one connection for the duration of a single operation through
//! [`Gateway::with_connection`] or [`Gateway::transaction`]; nothing is held
//! across calls.

use std::time::Instant;

use futures::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::{Connection, Postgres};
use tracing::{debug, error, info, warn};

use quire_core::{DbConfig, Error, Result};

use crate::pool::{connect_options, create_lazy_pool, log_pool_metrics, PoolConfig};
use crate::schema;

/// Owns connectivity configuration and the connection pool.
#[derive(Clone)]
pub struct Gateway {
    config: DbConfig,
    /// `Err` holds the reason the configuration was rejected.
    pool: std::result::Result<PgPool, String>,
}

impl Gateway {
    /// Create a gateway with default pool settings.
    ///
    /// Never fails: an invalid configuration is reported by [`Gateway::acquire`].
    /// Must be called inside a Tokio runtime when the configuration is valid.
    pub fn new(config: &DbConfig) -> Self {
        Self::with_pool_config(config, PoolConfig::default())
    }

    /// Create a gateway with custom pool settings.
    pub fn with_pool_config(config: &DbConfig, pool_config: PoolConfig) -> Self {
        let pool = connect_options(config)
            .map(|options| create_lazy_pool(options, &pool_config))
            .map_err(|e| match e {
                Error::Config(reason) => reason,
                other => other.to_string(),
            });

        Self {
            config: config.clone(),
            pool,
        }
    }

    /// The configuration this gateway was built from.
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// The underlying pool, if the configuration was valid.
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref().ok()
    }

    /// Check that all required connection parameters are present.
    pub fn validate_configuration(&self) -> bool {
        self.config.validate()
    }

    /// Acquire a connection from the pool.
    ///
    /// The connection returns to the pool when dropped.
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>> {
        let pool = self.pool.as_ref().map_err(|reason| {
            error!(
                subsystem = "database",
                component = "gateway",
                op = "acquire",
                error = %reason,
                "Refusing to connect with invalid configuration"
            );
            Error::Connection(format!("invalid database configuration: {}", reason))
        })?;

        let start = Instant::now();
        let conn = pool.acquire().await.map_err(|e| {
            error!(
                subsystem = "database",
                component = "gateway",
                op = "acquire",
                host = %self.config.host,
                port = %self.config.port,
                error = %e,
                "Database connection failed"
            );
            Error::connection(format!(
                "{}:{}/{}: {}",
                self.config.host, self.config.port, self.config.dbname, e
            ))
        })?;

        debug!(
            subsystem = "database",
            component = "gateway",
            op = "acquire",
            duration_ms = start.elapsed().as_millis() as u64,
            "Database connection established"
        );
        Ok(conn)
    }

    /// Run `f` on one acquired connection, releasing it on every exit path.
    ///
    /// ```rust,ignore
    /// let count = gateway
    ///     .with_connection(|conn| {
    ///         Box::pin(async move {
    ///             let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
    ///                 .fetch_one(&mut *conn)
    ///                 .await?;
    ///             Ok(n)
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T>>,
    {
        let mut conn = self.acquire().await?;
        let result = f(&mut *conn).await;
        drop(conn);

        if let Err(e) = &result {
            debug!(
                subsystem = "database",
                component = "gateway",
                error = %e,
                "Database operation failed"
            );
        }
        debug!(subsystem = "database", component = "gateway", "Database connection released");
        result
    }

    /// Run `f` inside a transaction on one acquired connection.
    ///
    /// Commits when `f` succeeds. On error the transaction is rolled back
    /// before the connection is released; a dropped (cancelled) future rolls
    /// back as well.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T>>,
    {
        let mut conn = self.acquire().await?;
        let mut tx = conn.begin().await?;

        match f(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        subsystem = "database",
                        component = "gateway",
                        op = "rollback",
                        error = %rollback_err,
                        "Rollback failed"
                    );
                }
                error!(
                    subsystem = "database",
                    component = "gateway",
                    error = %e,
                    "Database operation failed, transaction rolled back"
                );
                Err(e)
            }
        }
    }

    /// Round-trip a trivial query. Never errors; failures are logged.
    pub async fn test_connection(&self) -> bool {
        let result = self
            .with_connection(|conn| {
                Box::pin(async move {
                    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&mut *conn).await?;
                    Ok(one)
                })
            })
            .await;

        match result {
            Ok(_) => {
                info!(
                    subsystem = "database",
                    component = "gateway",
                    op = "test_connection",
                    "Database connection test successful"
                );
                true
            }
            Err(e) => {
                error!(
                    subsystem = "database",
                    component = "gateway",
                    op = "test_connection",
                    error = %e,
                    "Database connection test failed"
                );
                false
            }
        }
    }

    /// Create tables and indexes if they do not exist.
    pub async fn try_initialize_schema(&self) -> Result<()> {
        let start = Instant::now();
        self.transaction(|conn| {
            Box::pin(async move {
                for statement in schema::statements() {
                    sqlx::query(statement).execute(&mut *conn).await?;
                }
                Ok(())
            })
        })
        .await?;

        info!(
            subsystem = "database",
            component = "schema",
            op = "initialize",
            duration_ms = start.elapsed().as_millis() as u64,
            "Database initialized successfully"
        );
        Ok(())
    }

    /// Create tables and indexes if they do not exist.
    ///
    /// Returns `false` on any failure, after logging the cause. Safe to call
    /// repeatedly.
    pub async fn initialize_schema(&self) -> bool {
        match self.try_initialize_schema().await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    subsystem = "database",
                    component = "schema",
                    op = "initialize",
                    error = %e,
                    "Database initialization failed"
                );
                false
            }
        }
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        if let Ok(pool) = &self.pool {
            log_pool_metrics(pool);
            pool.close().await;
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("pool_ready", &self.pool.is_ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn incomplete_config() -> DbConfig {
        let mut config = DbConfig::new("quire", "secret", "localhost", 5432, "quire");
        config.password.clear();
        config.dbname.clear();
        config
    }

    #[test]
    fn test_invalid_config_does_not_build_pool() {
        let gateway = Gateway::new(&incomplete_config());
        assert!(gateway.pool().is_none());
        assert!(!gateway.validate_configuration());
    }

    #[tokio::test]
    async fn test_acquire_with_invalid_config_is_connection_error() {
        let gateway = Gateway::new(&incomplete_config());
        let err = gateway.acquire().await.unwrap_err();

        match &err {
            Error::Connection(msg) => {
                assert!(msg.contains("invalid database configuration"));
                assert!(msg.contains("password, dbname"));
                assert!(!msg.contains("Configuration error"), "{}", msg);
            }
            other => panic!("Expected Connection error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probes_report_false_instead_of_failing() {
        let gateway = Gateway::new(&incomplete_config());
        assert!(!gateway.test_connection().await);
        assert!(!gateway.initialize_schema().await);
        gateway.close().await;
    }

    #[tokio::test]
    async fn test_with_connection_propagates_acquire_error() {
        let gateway = Gateway::new(&incomplete_config());
        let result = gateway
            .with_connection(|_conn| Box::pin(async move { Ok(()) }))
            .await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_error_names_target() {
        let config = DbConfig::new("quire", "secret", "127.0.0.1", 1, "quire");
        let gateway = Gateway::with_pool_config(
            &config,
            PoolConfig::default().connect_timeout(Duration::from_secs(1)),
        );
        assert!(gateway.validate_configuration());

        let err = gateway.acquire().await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Connection error:"), "{}", msg);
        assert!(msg.contains("127.0.0.1:1/quire"), "{}", msg);
        gateway.close().await;
    }

    #[test]
    fn test_debug_hides_password() {
        let mut config = DbConfig::new("quire", "secret", "localhost", 5432, "quire");
        config.port = "not-a-port".to_string();
        let gateway = Gateway::new(&config);
        let debug = format!("{:?}", gateway);
        assert!(debug.contains("pool_ready: false"));
        assert!(!debug.contains("secret"));
    }
}
