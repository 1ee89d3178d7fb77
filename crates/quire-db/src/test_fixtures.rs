//! Test fixtures for database integration tests.
//!
//! Each [`TestDatabase`] gets its own schema, so tests can run against a
//! shared server without seeing each other's rows.
//!
//! ## Configuration
//!
//! Connection parameters come from the usual `user`/`password`/`host`/`port`/
//! `dbname` keys. When any of them is missing, the `DEFAULT_TEST_*`
//! constants are used.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_db::test_fixtures::TestDatabase;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let test_db = TestDatabase::new().await;
//!     // Run your tests against test_db.db ...
//!     test_db.cleanup().await;
//! }
//! ```

use uuid::Uuid;

use crate::{Database, DbConfig, Gateway};

/// Default test database user.
pub const DEFAULT_TEST_USER: &str = "quire";
/// Default test database password.
pub const DEFAULT_TEST_PASSWORD: &str = "quire";
/// Default test database host.
pub const DEFAULT_TEST_HOST: &str = "localhost";
/// Default test database port. Avoids clashing with a local production server.
pub const DEFAULT_TEST_PORT: u16 = 15432;
/// Default test database name.
pub const DEFAULT_TEST_DBNAME: &str = "quire_test";

/// Connection parameters for the test server.
pub fn test_config() -> DbConfig {
    DbConfig::from_env()
        .ok()
        .filter(|config| config.missing_fields().is_empty())
        .unwrap_or_else(|| {
            DbConfig::new(
                DEFAULT_TEST_USER,
                DEFAULT_TEST_PASSWORD,
                DEFAULT_TEST_HOST,
                DEFAULT_TEST_PORT,
                DEFAULT_TEST_DBNAME,
            )
        })
}

/// An initialized, isolated schema on the test server.
pub struct TestDatabase {
    /// Gateway scoped to the test schema.
    pub gateway: Gateway,
    pub db: Database,
    schema_name: String,
    admin: Gateway,
}

impl TestDatabase {
    /// Create a fresh schema and apply the entry schema inside it.
    ///
    /// Panics if the test server is unreachable.
    pub async fn new() -> Self {
        let base = test_config();
        let admin = Gateway::new(&base);
        let schema_name = format!("test_{}", Uuid::new_v4().simple());

        // The extension is database-wide; keep it in public so every test
        // schema resolves uuid_generate_v4 through its search path.
        let _ = admin
            .with_connection(|conn| {
                Box::pin(async move {
                    sqlx::query(r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp" SCHEMA public"#)
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .await;

        let create = format!("CREATE SCHEMA {}", schema_name);
        admin
            .with_connection(move |conn| {
                Box::pin(async move {
                    sqlx::query(&create).execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .await
            .expect("Failed to create test schema");

        let config = base.search_path(format!("{},public", schema_name));
        let db = Database::new(&config);
        assert!(
            db.gateway.initialize_schema().await,
            "Failed to initialize test schema {}",
            schema_name
        );

        Self {
            gateway: db.gateway.clone(),
            db,
            schema_name,
            admin,
        }
    }

    /// Name of the schema backing this instance.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Drop the test schema and close both pools.
    pub async fn cleanup(self) {
        self.db.close().await;

        let drop = format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema_name);
        let result = self
            .admin
            .with_connection(move |conn| {
                Box::pin(async move {
                    sqlx::query(&drop).execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .await;
        if let Err(e) = result {
            eprintln!("Failed to drop test schema {}: {}", self.schema_name, e);
        }
        self.admin.close().await;
    }
}
