//! # tablesync
//!
//! Database access and declarative schema synchronization for MySQL and
//! PostgreSQL.
//!
//! - **Drivers**: one live connection per engine behind a common contract
//! - **Database facade**: lazy connection, statement logging, error
//!   clearing, transaction flag and SQL literal encoding
//! - **Definitions**: per-table XML files with an override directory
//! - **Synchronization**: diff a definition against the live catalog and run
//!   the minimal `CREATE TABLE` / `ALTER TABLE` batch
//!
//! ## Example
//!
//! ```rust,no_run
//! use tablesync::{Config, Database, DatabaseUpdater};
//!
//! #[tokio::main]
//! async fn main() -> tablesync::Result<()> {
//!     let config = Config::load("config.yaml")?.with_env_overrides()?;
//!     let mut db = Database::new(&config.database)?;
//!     let updater = DatabaseUpdater::from_config(&config.schema);
//!     if updater.ensure(&mut db, "clientes").await? {
//!         println!("clientes is up to date");
//!     }
//!     db.close().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod database;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod schema;

// Re-exports for convenient access
pub use config::{Config, DatabaseConfig, SchemaConfig};
pub use crate::core::{
    ColumnDefinition, ColumnType, ConstraintDefinition, ConstraintKind, Dialect, Driver,
    LiveColumn, LiveConstraint, LiveTable, Row, SqlValue, TableStructure,
};
pub use database::Database;
pub use drivers::{DialectImpl, DriverImpl};
pub use error::{Result, SyncError};
pub use schema::{DatabaseUpdater, DefinitionReader};
