//! PostgreSQL SQL dialect (Strategy pattern).
//!
//! Double-quote identifiers, standard-conforming string literals and
//! `ALTER COLUMN` groups for column changes.

use crate::core::schema::{ColumnDefinition, LiveColumn, LiveConstraint};
use crate::core::traits::Dialect;
use crate::dialect::{normalize_postgres, CanonicalType};

/// Keywords PostgreSQL reserves for column names.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
    "column", "concurrently", "constraint", "create", "cross", "current_catalog",
    "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end", "except",
    "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant", "group", "having",
    "ilike", "in", "initially", "inner", "intersect", "into", "is", "isnull", "join", "lateral",
    "leading", "left", "like", "limit", "localtime", "localtimestamp", "natural", "not",
    "notnull", "null", "offset", "on", "only", "or", "order", "outer", "overlaps", "placing",
    "primary", "references", "returning", "right", "select", "session_user", "similar", "some",
    "symmetric", "system_user", "table", "tablesample", "then", "to", "trailing", "true",
    "union", "unique", "user", "using", "variadic", "verbose", "when", "where", "window",
    "with",
];

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgresql"
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED_WORDS
    }

    fn escape_string(&self, value: &str) -> String {
        // NUL is not representable in a PostgreSQL text value.
        value.replace('\0', "").replace('\'', "''")
    }

    fn date_style(&self) -> &'static str {
        "%Y-%m-%d"
    }

    fn normalize_type(&self, column: &LiveColumn) -> CanonicalType {
        normalize_postgres(&column.data_type, column.size)
    }

    fn column_sql(&self, column: &ColumnDefinition) -> String {
        if column.column_type.is_serial() {
            return format!("{} serial NOT NULL", self.ident(&column.name));
        }

        let mut sql = format!(
            "{} {}{}",
            self.ident(&column.name),
            column.column_type,
            if column.nullable { " NULL" } else { " NOT NULL" }
        );
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }

    fn add_column(&self, table: &str, column: &ColumnDefinition) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {};",
            self.ident(table),
            self.column_sql(column)
        )
    }

    fn modify_column(&self, table: &str, column: &ColumnDefinition) -> String {
        let name = self.ident(&column.name);
        let target_type = if column.column_type.is_serial() {
            "integer".to_string()
        } else {
            column.column_type.to_string()
        };

        let mut actions = vec![
            format!(
                "ALTER COLUMN {} TYPE {} USING {}::{}",
                name, target_type, name, target_type
            ),
            format!(
                "ALTER COLUMN {} {}",
                name,
                if column.nullable { "DROP NOT NULL" } else { "SET NOT NULL" }
            ),
        ];
        // The sequence default of a serial column is left alone.
        if !column.column_type.is_serial() {
            actions.push(match &column.default {
                Some(default) => format!("ALTER COLUMN {} SET DEFAULT {}", name, default),
                None => format!("ALTER COLUMN {} DROP DEFAULT", name),
            });
        }

        format!("ALTER TABLE {} {};", self.ident(table), actions.join(", "))
    }

    fn drop_constraint(&self, table: &str, constraint: &LiveConstraint) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {};",
            self.ident(table),
            self.ident(&constraint.name)
        )
    }
}
