//! PostgreSQL client implementation
//!
//! Connection pooling, TLS selection and statement helpers.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{IndexerError, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolError, RecyclingMethod};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

const MIGRATION_SQL: &str = include_str!("../../../migrations/001_initial_schema.sql");

/// Pooled PostgreSQL client
pub struct PostgreSQLClient {
    pool: Pool,
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// No connection is opened until the first query.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the pool
    /// cannot be built.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                IndexerError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
            })?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match config.ssl_mode.as_str() {
            "disable" => {
                pg_config.ssl_mode(SslMode::Disable);
                Manager::from_config(pg_config, NoTls, manager_config)
            }
            mode => {
                pg_config.ssl_mode(if mode == "require" {
                    SslMode::Require
                } else {
                    SslMode::Prefer
                });
                let connector = native_tls::TlsConnector::builder().build().map_err(|e| {
                    IndexerError::Connection(format!("Failed to build TLS connector: {e}"))
                })?;
                let tls = postgres_native_tls::MakeTlsConnector::new(connector);
                Manager::from_config(pg_config, tls, manager_config)
            }
        };

        let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                IndexerError::Database(format!("Failed to create connection pool: {e}"))
            })?;

        Ok(Self { pool, config })
    }

    /// Get a connection and run a trivial query
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| IndexerError::Connection(format!("Connection test failed: {e}")))?;

        tracing::info!(
            target = %self.connection_string_safe(),
            "PostgreSQL connection test successful"
        );
        Ok(())
    }

    /// Run the schema migration; every statement is idempotent
    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .batch_execute(MIGRATION_SQL)
            .await
            .map_err(|e| IndexerError::Database(format!("Failed to execute migration: {e}")))?;

        tracing::info!("PostgreSQL schema initialized successfully");
        Ok(())
    }

    /// Check out a pooled connection
    ///
    /// A login rejected by the server maps to [`IndexerError::Authentication`];
    /// every other pool failure is a connection error.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(pool_error)
    }

    /// Execute a query with the configured statement timeout
    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.timed_connection().await?;

        client
            .query(query, params)
            .await
            .map_err(|e| IndexerError::Database(format!("Query failed: {e}")))
    }

    /// Execute a query expecting at most one row
    pub async fn query_opt(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>> {
        let client = self.timed_connection().await?;

        client
            .query_opt(query, params)
            .await
            .map_err(|e| IndexerError::Database(format!("Query failed: {e}")))
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(&self, statement: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        let client = self.timed_connection().await?;

        client
            .execute(statement, params)
            .await
            .map_err(|e| IndexerError::Database(format!("Statement execution failed: {e}")))
    }

    async fn timed_connection(&self) -> Result<deadpool_postgres::Object> {
        let client = self.get_connection().await?;

        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client.execute(&timeout_query, &[]).await.map_err(|e| {
            IndexerError::Database(format!("Failed to set statement timeout: {e}"))
        })?;

        Ok(client)
    }

    /// Connection string with credentials removed
    pub fn connection_string_safe(&self) -> String {
        redact_connection_string(self.config.connection_string.expose_secret().as_ref())
    }

    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

fn pool_error(err: PoolError) -> IndexerError {
    let code = match &err {
        PoolError::Backend(e) => e.code(),
        _ => None,
    };

    if is_auth_failure(code) {
        IndexerError::Authentication(format!("PostgreSQL rejected the login: {err}"))
    } else {
        IndexerError::Connection(format!("Failed to get connection from pool: {err}"))
    }
}

fn is_auth_failure(code: Option<&SqlState>) -> bool {
    matches!(
        code,
        Some(c) if *c == SqlState::INVALID_PASSWORD
            || *c == SqlState::INVALID_AUTHORIZATION_SPECIFICATION
    )
}

fn redact_connection_string(conn: &str) -> String {
    conn.rsplit_once('@')
        .map(|(_, host)| format!("postgresql://***@{host}"))
        .unwrap_or_else(|| "postgresql://***".to_string())
}
