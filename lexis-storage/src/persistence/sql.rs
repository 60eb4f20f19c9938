//! SQL persistence driver.
//!
//! The statements are fixed at construction: the executor reports its
//! dialect once, and the matching insert-or-update clause is rendered into
//! the upsert statement. No driver-name inspection happens per call.
//!
//! Expected table shape (dialect-neutral):
//!
//! ```text
//! namespace  VARCHAR NOT NULL
//! name       VARCHAR NOT NULL
//! locale     VARCHAR NOT NULL
//! content    TEXT    NOT NULL
//! UNIQUE (namespace, name, locale)
//! ```

use async_trait::async_trait;
use lexis_core::{ConfigError, LexisResult, NamespaceBlock, StorageError};
use once_cell::sync::Lazy;
use regex::Regex;

use super::traits::PersistenceLayer;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}(\.[A-Za-z_][A-Za-z0-9_]{0,62})?$")
        .expect("identifier regex is valid")
});

/// SQL engines whose upsert clause is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    /// `ON DUPLICATE KEY UPDATE`, `?` placeholders.
    MySql,
    /// `ON CONFLICT ... DO UPDATE`, `$n` placeholders.
    Postgres,
}

impl SqlDialect {
    /// Map a driver or connection-scheme name to a dialect.
    ///
    /// Recognizes anything mentioning `mysql` (including `mariadb`), and
    /// `pgsql`/`postgres`. Any other engine fails fast rather than risking a
    /// write that cannot express insert-or-update.
    pub fn from_driver_name(driver: &str) -> Result<Self, StorageError> {
        let lower = driver.to_ascii_lowercase();

        if lower.contains("mysql") || lower.contains("mariadb") {
            Ok(Self::MySql)
        } else if lower.contains("pgsql") || lower.contains("postgre") {
            Ok(Self::Postgres)
        } else {
            Err(StorageError::UnsupportedBackend {
                driver: driver.to_string(),
            })
        }
    }

    fn placeholder(self, index: usize) -> String {
        match self {
            Self::MySql => "?".to_string(),
            Self::Postgres => format!("${index}"),
        }
    }

    /// Statement reading one block. Binds: namespace, locale.
    pub fn select_block_sql(self, table: &str) -> String {
        format!(
            "SELECT name, content FROM {table} WHERE namespace = {} AND locale = {}",
            self.placeholder(1),
            self.placeholder(2),
        )
    }

    /// Statement upserting one row. Binds: namespace, name, locale, content.
    pub fn upsert_sql(self, table: &str) -> String {
        let insert = format!(
            "INSERT INTO {table} (namespace, name, locale, content) VALUES ({}, {}, {}, {})",
            self.placeholder(1),
            self.placeholder(2),
            self.placeholder(3),
            self.placeholder(4),
        );

        match self {
            Self::MySql => format!("{insert} ON DUPLICATE KEY UPDATE content = VALUES(content)"),
            Self::Postgres => format!(
                "{insert} ON CONFLICT (namespace, name, locale) DO UPDATE SET content = EXCLUDED.content"
            ),
        }
    }
}

/// Runs statements against a concrete SQL engine.
///
/// Arguments are always text and bound positionally in the order the
/// statement documents.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// The dialect this engine speaks.
    fn dialect(&self) -> SqlDialect;

    /// Run a query returning (name, content) rows.
    async fn fetch_pairs(&self, sql: &str, args: &[&str]) -> LexisResult<Vec<(String, String)>>;

    /// Run a statement, returning the number of affected rows.
    async fn execute(&self, sql: &str, args: &[&str]) -> LexisResult<u64>;
}

/// Check that a table name is a plain (optionally schema-qualified) identifier.
pub fn validate_table_name(table: &str) -> Result<(), ConfigError> {
    if IDENTIFIER.is_match(table) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: "table".to_string(),
            value: table.to_string(),
            reason: "must be a plain SQL identifier".to_string(),
        })
    }
}

/// Persistence layer over a SQL table.
#[derive(Debug)]
pub struct SqlPersistence<E: SqlExecutor> {
    executor: E,
    dialect: SqlDialect,
    select_sql: String,
    upsert_sql: String,
}

impl<E: SqlExecutor> SqlPersistence<E> {
    /// Build the driver, rendering both statements for the executor's dialect.
    pub fn new(executor: E, table: &str) -> LexisResult<Self> {
        validate_table_name(table)?;

        let dialect = executor.dialect();
        Ok(Self {
            select_sql: dialect.select_block_sql(table),
            upsert_sql: dialect.upsert_sql(table),
            dialect,
            executor,
        })
    }

    /// Build the driver from a configured driver or connection-scheme name.
    ///
    /// The name must map to a known dialect (`UnsupportedBackend` otherwise)
    /// and agree with the dialect the executor speaks.
    pub fn for_driver(executor: E, driver: &str, table: &str) -> LexisResult<Self> {
        let dialect = SqlDialect::from_driver_name(driver)?;
        if dialect != executor.dialect() {
            return Err(ConfigError::InvalidValue {
                field: "driver".to_string(),
                value: driver.to_string(),
                reason: format!("executor speaks {:?}", executor.dialect()),
            }
            .into());
        }
        Self::new(executor, table)
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}

#[async_trait]
impl<E: SqlExecutor> PersistenceLayer for SqlPersistence<E> {
    async fn get_namespace_content(
        &self,
        namespace: &str,
        locale: &str,
    ) -> LexisResult<NamespaceBlock> {
        let rows = self
            .executor
            .fetch_pairs(&self.select_sql, &[namespace, locale])
            .await?;

        Ok(rows.into_iter().collect())
    }

    async fn save_content(
        &self,
        namespace: &str,
        name: &str,
        locale: &str,
        content: &str,
    ) -> LexisResult<()> {
        self.executor
            .execute(&self.upsert_sql, &[namespace, name, locale, content])
            .await?;
        Ok(())
    }
}
