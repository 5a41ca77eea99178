//! Database driver implementations.
//!
//! - [`mysql`]: MySQL/MariaDB dialect and driver
//! - [`postgres`]: PostgreSQL dialect and driver
//! - [`common`]: Shared utilities (TLS)
//!
//! # Architecture
//!
//! Each driver module provides a `Dialect` (pure SQL rules) and a `Driver`
//! (one live connection). The set of engines is closed, so both are
//! dispatched through enums rather than trait objects: the compiler
//! generates a match instead of a vtable call.
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/`
//! 2. Implement `Dialect` and `Driver`
//! 3. Add a variant to `DialectImpl` and `DriverImpl`
//! 4. Accept the new type name in `config::validation`

pub mod common;
#[cfg(test)]
pub(crate) mod fake;
pub mod mysql;
pub mod postgres;

pub use common::{SslMode, TlsBuilder};
pub use mysql::{MysqlDialect, MysqlDriver};
pub use postgres::{PostgresDialect, PostgresDriver};

use async_trait::async_trait;

use crate::config::{is_postgres, DatabaseConfig};
use crate::core::schema::{ColumnDefinition, ConstraintDefinition, LiveColumn, LiveConstraint, TableStructure};
use crate::core::traits::{Dialect, Driver};
use crate::core::value::Row;
use crate::dialect::CanonicalType;
use crate::error::{Result, SyncError};

/// Enum-based static dispatch for dialects.
#[derive(Debug, Clone)]
pub enum DialectImpl {
    Mysql(MysqlDialect),
    Postgres(PostgresDialect),
}

impl DialectImpl {
    /// Create a dialect implementation from a database type string.
    ///
    /// # Errors
    ///
    /// Returns an error if the database type is not recognized.
    pub fn from_db_type(db_type: &str) -> Result<Self> {
        match db_type.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DialectImpl::Mysql(MysqlDialect::new())),
            other if is_postgres(other) => Ok(DialectImpl::Postgres(PostgresDialect::new())),
            other => Err(SyncError::Config(format!(
                "Unknown database type: '{}'. Supported types: mysql, postgresql",
                other
            ))),
        }
    }
}

impl Dialect for DialectImpl {
    fn name(&self) -> &str {
        match self {
            DialectImpl::Mysql(d) => d.name(),
            DialectImpl::Postgres(d) => d.name(),
        }
    }

    fn quote_ident(&self, name: &str) -> String {
        match self {
            DialectImpl::Mysql(d) => d.quote_ident(name),
            DialectImpl::Postgres(d) => d.quote_ident(name),
        }
    }

    fn escape_string(&self, value: &str) -> String {
        match self {
            DialectImpl::Mysql(d) => d.escape_string(value),
            DialectImpl::Postgres(d) => d.escape_string(value),
        }
    }

    fn date_style(&self) -> &'static str {
        match self {
            DialectImpl::Mysql(d) => d.date_style(),
            DialectImpl::Postgres(d) => d.date_style(),
        }
    }

    fn normalize_type(&self, column: &LiveColumn) -> CanonicalType {
        match self {
            DialectImpl::Mysql(d) => d.normalize_type(column),
            DialectImpl::Postgres(d) => d.normalize_type(column),
        }
    }

    fn column_sql(&self, column: &ColumnDefinition) -> String {
        match self {
            DialectImpl::Mysql(d) => d.column_sql(column),
            DialectImpl::Postgres(d) => d.column_sql(column),
        }
    }

    fn add_column(&self, table: &str, column: &ColumnDefinition) -> String {
        match self {
            DialectImpl::Mysql(d) => d.add_column(table, column),
            DialectImpl::Postgres(d) => d.add_column(table, column),
        }
    }

    fn modify_column(&self, table: &str, column: &ColumnDefinition) -> String {
        match self {
            DialectImpl::Mysql(d) => d.modify_column(table, column),
            DialectImpl::Postgres(d) => d.modify_column(table, column),
        }
    }

    fn drop_constraint(&self, table: &str, constraint: &LiveConstraint) -> String {
        match self {
            DialectImpl::Mysql(d) => d.drop_constraint(table, constraint),
            DialectImpl::Postgres(d) => d.drop_constraint(table, constraint),
        }
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        match self {
            DialectImpl::Mysql(d) => d.reserved_words(),
            DialectImpl::Postgres(d) => d.reserved_words(),
        }
    }

    fn table_options(&self) -> &str {
        match self {
            DialectImpl::Mysql(d) => d.table_options(),
            DialectImpl::Postgres(d) => d.table_options(),
        }
    }

    fn create_table(&self, table: &str, structure: &TableStructure) -> String {
        match self {
            DialectImpl::Mysql(d) => d.create_table(table, structure),
            DialectImpl::Postgres(d) => d.create_table(table, structure),
        }
    }

    fn add_constraint(&self, table: &str, constraint: &ConstraintDefinition) -> String {
        match self {
            DialectImpl::Mysql(d) => d.add_constraint(table, constraint),
            DialectImpl::Postgres(d) => d.add_constraint(table, constraint),
        }
    }
}

/// Enum-based static dispatch for live connections.
pub enum DriverImpl {
    Mysql(MysqlDriver),
    Postgres(PostgresDriver),
    #[cfg(test)]
    Fake(fake::FakeDriver),
}

impl DriverImpl {
    /// Open a connection for the configured engine.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        match DialectImpl::from_db_type(&config.r#type)? {
            DialectImpl::Mysql(_) => Ok(DriverImpl::Mysql(MysqlDriver::connect(config).await?)),
            DialectImpl::Postgres(_) => {
                Ok(DriverImpl::Postgres(PostgresDriver::connect(config).await?))
            }
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $d:ident => $call:expr) => {
        match $self {
            DriverImpl::Mysql($d) => $call,
            DriverImpl::Postgres($d) => $call,
            #[cfg(test)]
            DriverImpl::Fake($d) => $call,
        }
    };
}

#[async_trait]
impl Driver for DriverImpl {
    async fn exec(&mut self, sql: &str) -> bool {
        dispatch!(self, d => d.exec(sql).await)
    }

    async fn select(&mut self, sql: &str, limit: u64, offset: u64) -> Vec<Row> {
        dispatch!(self, d => d.select(sql, limit, offset).await)
    }

    async fn get_columns(&mut self, table: &str) -> Vec<LiveColumn> {
        dispatch!(self, d => d.get_columns(table).await)
    }

    async fn get_constraints(&mut self, table: &str) -> Vec<LiveConstraint> {
        dispatch!(self, d => d.get_constraints(table).await)
    }

    async fn get_tables(&mut self) -> Vec<String> {
        dispatch!(self, d => d.get_tables().await)
    }

    async fn lastval(&mut self) -> i64 {
        dispatch!(self, d => d.lastval().await)
    }

    async fn update_sequence(&mut self, table: &str, columns: &[LiveColumn]) {
        dispatch!(self, d => d.update_sequence(table, columns).await)
    }

    async fn version(&mut self) -> String {
        dispatch!(self, d => d.version().await)
    }

    async fn close(&mut self) -> bool {
        dispatch!(self, d => d.close().await)
    }

    fn last_error(&self) -> Option<&str> {
        dispatch!(self, d => d.last_error())
    }

    fn clear_last_error(&mut self) {
        dispatch!(self, d => d.clear_last_error())
    }

    async fn begin_transaction(&mut self) -> bool {
        dispatch!(self, d => d.begin_transaction().await)
    }

    async fn commit(&mut self) -> bool {
        dispatch!(self, d => d.commit().await)
    }

    async fn rollback(&mut self) -> bool {
        dispatch!(self, d => d.rollback().await)
    }
}
