//! Table synchronization against the live database.

use tracing::{debug, info, warn};

use crate::config::SchemaConfig;
use crate::core::schema::{LiveTable, TableStructure};
use crate::core::traits::Dialect;
use crate::database::Database;
use crate::error::Result;

use super::differ::{plan_create, plan_update};
use super::reader::DefinitionReader;

/// Brings tables in line with their XML definitions.
#[derive(Debug, Clone)]
pub struct DatabaseUpdater {
    reader: DefinitionReader,
}

impl DatabaseUpdater {
    pub fn new(reader: DefinitionReader) -> Self {
        Self { reader }
    }

    pub fn from_config(schema: &SchemaConfig) -> Self {
        Self::new(DefinitionReader::from_config(schema))
    }

    pub fn reader(&self) -> &DefinitionReader {
        &self.reader
    }

    /// Statements `ensure` would run for `table`, without running them.
    ///
    /// The definition is read before the database is touched, so a broken
    /// definition never opens a connection.
    pub async fn plan(&self, db: &mut Database, table: &str) -> Result<Vec<String>> {
        let desired = self.reader.read(table)?;
        if !db.table_exists(table).await? {
            return Ok(vec![plan_create(db.dialect(), table, &desired)]);
        }
        let live = snapshot(db, table).await?;
        Ok(plan_update(db.dialect(), table, &desired, &live))
    }

    /// Create or alter `table` until it matches its definition.
    ///
    /// Returns `Ok(true)` when the table already matched or the DDL batch
    /// succeeded, `Ok(false)` when the batch failed. A failed batch is not
    /// rolled back.
    pub async fn ensure(&self, db: &mut Database, table: &str) -> Result<bool> {
        let statements = self.plan(db, table).await?;
        if statements.is_empty() {
            debug!("Table {} is up to date", table);
            return Ok(true);
        }

        info!("Synchronizing table {} ({} statements)", table, statements.len());
        let ok = db.exec(&statements.concat()).await?;
        if !ok {
            warn!("Synchronization of table {} failed", table);
        }
        Ok(ok)
    }

    pub async fn create_table(
        &self,
        db: &mut Database,
        table: &str,
        structure: &TableStructure,
    ) -> Result<bool> {
        let sql = plan_create(db.dialect(), table, structure);
        db.exec(&sql).await
    }

    /// Apply the delta between `structure` and the live table. Nothing is
    /// executed when there is no difference.
    pub async fn update_table(
        &self,
        db: &mut Database,
        table: &str,
        structure: &TableStructure,
    ) -> Result<bool> {
        let live = snapshot(db, table).await?;
        let statements = plan_update(db.dialect(), table, structure, &live);
        if statements.is_empty() {
            return Ok(true);
        }
        db.exec(&statements.concat()).await
    }

    pub async fn drop_table(&self, db: &mut Database, table: &str) -> Result<bool> {
        let sql = db.dialect().drop_table(table);
        info!("Dropping table {}", table);
        db.exec(&sql).await
    }

    pub async fn table_exists(&self, db: &mut Database, table: &str) -> Result<bool> {
        db.table_exists(table).await
    }
}

async fn snapshot(db: &mut Database, table: &str) -> Result<LiveTable> {
    Ok(LiveTable {
        columns: db.get_columns(table).await?,
        constraints: db.get_constraints(table).await?,
    })
}
