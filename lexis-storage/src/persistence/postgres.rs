//! PostgreSQL executor on a deadpool-postgres connection pool.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts,
};
use lexis_core::{ConfigError, LexisError, LexisResult, StorageError};
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;

use super::sql::{validate_table_name, SqlDialect, SqlExecutor, SqlPersistence};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct SqlConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Table holding the content rows
    pub table: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Timeout for acquiring a connection
    pub timeout: Duration,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "lexis".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            table: "inline_content".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl SqlConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// Environment variables:
    /// - `LEXIS_DB_HOST` (default: localhost)
    /// - `LEXIS_DB_PORT` (default: 5432)
    /// - `LEXIS_DB_NAME` (default: lexis)
    /// - `LEXIS_DB_USER` (default: postgres)
    /// - `LEXIS_DB_PASSWORD` (default: empty)
    /// - `LEXIS_DB_TABLE` (default: inline_content)
    /// - `LEXIS_DB_POOL_SIZE` (default: 16)
    /// - `LEXIS_DB_TIMEOUT` in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("LEXIS_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("LEXIS_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("LEXIS_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("LEXIS_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("LEXIS_DB_PASSWORD").unwrap_or_default(),
            table: std::env::var("LEXIS_DB_TABLE").unwrap_or(defaults.table),
            max_size: std::env::var("LEXIS_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("LEXIS_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Check the settings that would otherwise only fail on first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_table_name(&self.table)?;
        if self.host.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "host".to_string(),
            });
        }
        if self.max_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_size".to_string(),
                value: "0".to_string(),
                reason: "pool needs at least one connection".to_string(),
            });
        }
        Ok(())
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened until the first statement runs.
    pub fn create_pool(&self) -> LexisResult<Pool> {
        self.validate()?;

        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(self.max_size);
        let mut timeouts = Timeouts::default();
        timeouts.wait = Some(self.timeout);
        timeouts.create = Some(self.timeout);
        timeouts.recycle = Some(self.timeout);
        pool_config.timeouts = timeouts;
        cfg.pool = Some(pool_config);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| persistence_error("create pool", e))
    }

    /// Build a ready-to-use SQL persistence layer over a fresh pool.
    pub fn connect(&self) -> LexisResult<SqlPersistence<PgExecutor>> {
        let pool = self.create_pool()?;
        SqlPersistence::new(PgExecutor::new(pool), &self.table)
    }
}

fn persistence_error(operation: &str, e: impl std::fmt::Display) -> LexisError {
    LexisError::Storage(StorageError::PersistenceFailed {
        operation: operation.to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// EXECUTOR
// ============================================================================

/// SQL executor that runs statements on a pooled PostgreSQL connection.
#[derive(Clone)]
pub struct PgExecutor {
    pool: Pool,
}

impl PgExecutor {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn get_conn(&self) -> LexisResult<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| persistence_error("acquire connection", e))
    }
}

fn bind<'a>(args: &'a [&'a str]) -> Vec<&'a (dyn ToSql + Sync)> {
    args.iter().map(|a| a as &(dyn ToSql + Sync)).collect()
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::Postgres
    }

    async fn fetch_pairs(&self, sql: &str, args: &[&str]) -> LexisResult<Vec<(String, String)>> {
        let conn = self.get_conn().await?;
        let params = bind(args);

        let rows = conn
            .query(sql, &params)
            .await
            .map_err(|e| persistence_error("query", e))?;

        rows.iter()
            .map(|row| {
                let name: String = row.try_get(0).map_err(|e| persistence_error("decode", e))?;
                let content: String =
                    row.try_get(1).map_err(|e| persistence_error("decode", e))?;
                Ok((name, content))
            })
            .collect()
    }

    async fn execute(&self, sql: &str, args: &[&str]) -> LexisResult<u64> {
        let conn = self.get_conn().await?;
        let params = bind(args);

        conn.execute(sql, &params)
            .await
            .map_err(|e| persistence_error("execute", e))
    }
}
