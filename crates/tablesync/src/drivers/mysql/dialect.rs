//! MySQL/MariaDB SQL dialect (Strategy pattern).
//!
//! Backtick quoting, backslash string escaping and the `ALTER TABLE ...
//! ADD/MODIFY` DDL flavor with `ENGINE=InnoDB` tables.

use crate::core::schema::{ColumnDefinition, ColumnType, ConstraintKind, LiveColumn, LiveConstraint};
use crate::core::traits::Dialect;
use crate::dialect::{normalize_mysql, CanonicalType};

/// MySQL 8.0 reserved words.
const RESERVED_WORDS: &[&str] = &[
    "accessible", "add", "all", "alter", "analyze", "and", "as", "asc", "asensitive", "before",
    "between", "bigint", "binary", "blob", "both", "by", "call", "cascade", "case", "change",
    "char", "character", "check", "collate", "column", "condition", "constraint", "continue",
    "convert", "create", "cross", "cube", "cume_dist", "current_date", "current_time",
    "current_timestamp", "current_user", "cursor", "database", "databases", "day_hour",
    "day_microsecond", "day_minute", "day_second", "dec", "decimal", "declare", "default",
    "delayed", "delete", "dense_rank", "desc", "describe", "deterministic", "distinct",
    "distinctrow", "div", "double", "drop", "dual", "each", "else", "elseif", "empty",
    "enclosed", "escaped", "except", "exists", "exit", "explain", "false", "fetch",
    "first_value", "float", "float4", "float8", "for", "force", "foreign", "from", "fulltext",
    "function", "generated", "get", "grant", "group", "grouping", "groups", "having",
    "high_priority", "hour_microsecond", "hour_minute", "hour_second", "if", "ignore", "in",
    "index", "infile", "inner", "inout", "insensitive", "insert", "int", "int1", "int2", "int3",
    "int4", "int8", "integer", "intersect", "interval", "into", "io_after_gtids",
    "io_before_gtids", "is", "iterate", "join", "json_table", "key", "keys", "kill", "lag",
    "last_value", "lateral", "lead", "leading", "leave", "left", "like", "limit", "linear",
    "lines", "load", "localtime", "localtimestamp", "lock", "long", "longblob", "longtext",
    "loop", "low_priority", "master_bind", "master_ssl_verify_server_cert", "match", "maxvalue",
    "mediumblob", "mediumint", "mediumtext", "middleint", "minute_microsecond", "minute_second",
    "mod", "modifies", "natural", "no_write_to_binlog", "not", "nth_value", "ntile", "null",
    "numeric", "of", "on", "optimize", "optimizer_costs", "option", "optionally", "or", "order",
    "out", "outer", "outfile", "over", "partition", "percent_rank", "precision", "primary",
    "procedure", "purge", "range", "rank", "read", "read_write", "reads", "real", "recursive",
    "references", "regexp", "release", "rename", "repeat", "replace", "require", "resignal",
    "restrict", "return", "revoke", "right", "rlike", "row", "row_number", "rows", "schema",
    "schemas", "second_microsecond", "select", "sensitive", "separator", "set", "show",
    "signal", "smallint", "spatial", "specific", "sql", "sql_big_result", "sql_calc_found_rows",
    "sql_small_result", "sqlexception", "sqlstate", "sqlwarning", "ssl", "starting", "stored",
    "straight_join", "system", "table", "terminated", "then", "tinyblob", "tinyint", "tinytext",
    "to", "trailing", "trigger", "true", "undo", "union", "unique", "unlock", "unsigned",
    "update", "usage", "use", "using", "utc_date", "utc_time", "utc_timestamp", "values",
    "varbinary", "varchar", "varcharacter", "varying", "virtual", "when", "where", "while",
    "window", "with", "write", "xor", "year_month", "zerofill",
];

/// MySQL/MariaDB dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }

    fn type_sql(column_type: &ColumnType) -> String {
        match column_type {
            ColumnType::Varchar(size) => format!("varchar({})", size),
            other => other.to_string(),
        }
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED_WORDS
    }

    fn escape_string(&self, value: &str) -> String {
        // Same character set as mysql_real_escape_string.
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\0' => escaped.push_str("\\0"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\\' => escaped.push_str("\\\\"),
                '\'' => escaped.push_str("\\'"),
                '"' => escaped.push_str("\\\""),
                '\x1a' => escaped.push_str("\\Z"),
                other => escaped.push(other),
            }
        }
        escaped
    }

    fn date_style(&self) -> &'static str {
        "%Y-%m-%d"
    }

    fn normalize_type(&self, column: &LiveColumn) -> CanonicalType {
        normalize_mysql(&column.data_type, column.size)
    }

    fn column_sql(&self, column: &ColumnDefinition) -> String {
        if column.column_type.is_serial() {
            return format!("{} integer NOT NULL AUTO_INCREMENT", self.ident(&column.name));
        }

        let mut sql = format!(
            "{} {}{}",
            self.ident(&column.name),
            Self::type_sql(&column.column_type),
            if column.nullable { " NULL" } else { " NOT NULL" }
        );
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }

    fn add_column(&self, table: &str, column: &ColumnDefinition) -> String {
        format!("ALTER TABLE {} ADD {};", self.ident(table), self.column_sql(column))
    }

    fn modify_column(&self, table: &str, column: &ColumnDefinition) -> String {
        format!(
            "ALTER TABLE {} MODIFY {};",
            self.ident(table),
            self.column_sql(column)
        )
    }

    fn drop_constraint(&self, table: &str, constraint: &LiveConstraint) -> String {
        let action = match constraint.kind {
            ConstraintKind::ForeignKey => format!("DROP FOREIGN KEY {}", self.ident(&constraint.name)),
            ConstraintKind::PrimaryKey => "DROP PRIMARY KEY".to_string(),
            ConstraintKind::Check => format!("DROP CHECK {}", self.ident(&constraint.name)),
            ConstraintKind::Unique | ConstraintKind::Other => {
                format!("DROP INDEX {}", self.ident(&constraint.name))
            }
        };
        format!("ALTER TABLE {} {};", self.ident(table), action)
    }

    fn table_options(&self) -> &str {
        " ENGINE=InnoDB"
    }
}
