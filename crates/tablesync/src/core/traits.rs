//! Core traits for database-agnostic schema synchronization.
//!
//! - [`Dialect`]: pure SQL syntax strategy (quoting, escaping, type
//!   normalization, DDL rendering). No I/O.
//! - [`Driver`]: a live connection to one engine, with the statement-level
//!   error state the facade inspects and clears.
//!
//! # Design Patterns
//!
//! - **Strategy**: `Dialect` implementations are interchangeable SQL rules.
//! - **Template Method**: default `Dialect` methods assemble whole statements
//!   from the engine-specific fragments.

use async_trait::async_trait;

use crate::dialect::CanonicalType;

use super::schema::{
    ColumnDefinition, ConstraintDefinition, LiveColumn, LiveConstraint, TableStructure,
};
use super::value::Row;

/// SQL syntax strategy for one engine.
pub trait Dialect: Send + Sync {
    /// Dialect identifier ("mysql", "postgresql").
    fn name(&self) -> &str;

    /// Quote an identifier unconditionally, doubling embedded quote characters.
    ///
    /// - MySQL: `` `identifier` ``
    /// - PostgreSQL: `"identifier"`
    fn quote_ident(&self, name: &str) -> String;

    /// Escape a value for use between single quotes. Does not add the quotes.
    fn escape_string(&self, value: &str) -> String;

    /// chrono format string for dates.
    fn date_style(&self) -> &'static str;

    /// Map a live catalog column onto the canonical type vocabulary.
    fn normalize_type(&self, column: &LiveColumn) -> CanonicalType;

    /// Column fragment used by CREATE TABLE and ADD COLUMN.
    fn column_sql(&self, column: &ColumnDefinition) -> String;

    /// Statement adding a missing column.
    fn add_column(&self, table: &str, column: &ColumnDefinition) -> String;

    /// Statement bringing an existing column to its full desired definition.
    fn modify_column(&self, table: &str, column: &ColumnDefinition) -> String;

    /// Statement dropping a live constraint.
    fn drop_constraint(&self, table: &str, constraint: &LiveConstraint) -> String;

    /// Text appended after the closing parenthesis of CREATE TABLE.
    fn table_options(&self) -> &str {
        ""
    }

    /// Lowercase keywords that cannot appear as bare identifiers.
    fn reserved_words(&self) -> &'static [&'static str] {
        &[]
    }

    /// Identifier as written in generated DDL: bare when it is a plain
    /// lowercase identifier that is not a reserved word, quoted otherwise.
    fn ident(&self, name: &str) -> String {
        let mut chars = name.chars();
        let plain = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if plain && !self.reserved_words().iter().any(|word| *word == name) {
            name.to_string()
        } else {
            self.quote_ident(name)
        }
    }

    /// CREATE TABLE with every column, then every constraint, in declaration order.
    fn create_table(&self, table: &str, structure: &TableStructure) -> String {
        let items: Vec<String> = structure
            .columns
            .iter()
            .map(|c| self.column_sql(c))
            .chain(
                structure
                    .constraints
                    .iter()
                    .map(|c| format!("CONSTRAINT {} {}", self.ident(&c.name), c.definition)),
            )
            .collect();

        format!(
            "CREATE TABLE {} ({}){};",
            self.ident(table),
            items.join(", "),
            self.table_options()
        )
    }

    fn add_constraint(&self, table: &str, constraint: &ConstraintDefinition) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} {};",
            self.ident(table),
            self.ident(&constraint.name),
            constraint.definition
        )
    }

    fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {};", self.ident(table))
    }
}

/// A live connection to one database engine.
///
/// Statement methods (`exec`, `select` and the catalog helpers built on
/// them) never fail with `Err`: a failure is recorded in [`Driver::last_error`]
/// and reported through the return value. The error state is not cleared by
/// later successes; callers clear it with [`Driver::clear_last_error`].
#[async_trait]
pub trait Driver: Send {
    /// Execute statements without a result set. Multi-statement batches are
    /// drained completely before the final error state is reported.
    async fn exec(&mut self, sql: &str) -> bool;

    /// Run a query. `limit == 0` means no limit.
    async fn select(&mut self, sql: &str, limit: u64, offset: u64) -> Vec<Row>;

    /// Live columns of a table, in catalog order.
    async fn get_columns(&mut self, table: &str) -> Vec<LiveColumn>;

    /// Live constraints of a table.
    async fn get_constraints(&mut self, table: &str) -> Vec<LiveConstraint>;

    /// Base tables of the current database.
    async fn get_tables(&mut self) -> Vec<String>;

    /// Last auto-generated id on this connection, 0 if unknown.
    async fn lastval(&mut self) -> i64;

    /// Realign sequences behind serial columns with the data in `table`.
    async fn update_sequence(&mut self, table: &str, columns: &[LiveColumn]);

    /// Server version banner, e.g. `MYSQL 8.0.36`.
    async fn version(&mut self) -> String;

    /// Release the connection. Safe to call repeatedly.
    async fn close(&mut self) -> bool;

    fn last_error(&self) -> Option<&str>;

    fn clear_last_error(&mut self);

    async fn begin_transaction(&mut self) -> bool {
        self.exec("START TRANSACTION;").await
    }

    async fn commit(&mut self) -> bool {
        self.exec("COMMIT;").await
    }

    async fn rollback(&mut self) -> bool {
        self.exec("ROLLBACK;").await
    }
}

/// Append pagination to a query. `limit == 0` leaves it untouched.
pub(crate) fn paginate(sql: &str, limit: u64, offset: u64) -> String {
    if limit == 0 {
        return sql.to_string();
    }
    let trimmed = sql.trim_end().trim_end_matches(';').trim_end();
    format!("{} LIMIT {} OFFSET {};", trimmed, limit, offset)
}
