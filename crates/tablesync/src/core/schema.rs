//! Table structure types: the declarative side (column and constraint
//! definitions read from XML) and the live side (what a driver reports from
//! the system catalog).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column types accepted in a table definition.
///
/// The vocabulary is closed: anything [`ColumnType::parse`] rejects is a
/// definition error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Boolean,
    Date,
    DoublePrecision,
    Integer,
    /// Auto-incrementing integer surrogate key.
    Serial,
    /// `character varying(n)`.
    Varchar(u32),
    Text,
    Time,
    Timestamp,
}

impl ColumnType {
    /// Parse a definition type string.
    ///
    /// Matching is case-insensitive and tolerates surrounding whitespace.
    /// `character varying` must carry a positive length.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        let parsed = match lowered.as_str() {
            "boolean" => ColumnType::Boolean,
            "date" => ColumnType::Date,
            "double precision" => ColumnType::DoublePrecision,
            "integer" => ColumnType::Integer,
            "serial" => ColumnType::Serial,
            "text" => ColumnType::Text,
            "time" => ColumnType::Time,
            "timestamp" => ColumnType::Timestamp,
            other => {
                let size = other
                    .strip_prefix("character varying")?
                    .trim()
                    .strip_prefix('(')?
                    .strip_suffix(')')?
                    .trim()
                    .parse::<u32>()
                    .ok()?;
                if size == 0 {
                    return None;
                }
                ColumnType::Varchar(size)
            }
        };
        Some(parsed)
    }

    pub fn is_serial(&self) -> bool {
        matches!(self, ColumnType::Serial)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Boolean => f.write_str("boolean"),
            ColumnType::Date => f.write_str("date"),
            ColumnType::DoublePrecision => f.write_str("double precision"),
            ColumnType::Integer => f.write_str("integer"),
            ColumnType::Serial => f.write_str("serial"),
            ColumnType::Varchar(size) => write!(f, "character varying({})", size),
            ColumnType::Text => f.write_str("text"),
            ColumnType::Time => f.write_str("time"),
            ColumnType::Timestamp => f.write_str("timestamp"),
        }
    }
}

/// Desired column as declared in a table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    /// SQL default expression, verbatim from the definition.
    pub default: Option<String>,
}

impl ColumnDefinition {
    /// Build a column, enforcing the serial invariant: a serial column is
    /// never nullable and never carries a literal default, whatever was
    /// declared.
    pub fn new(
        name: impl Into<String>,
        column_type: ColumnType,
        nullable: bool,
        default: Option<String>,
    ) -> Self {
        let serial = column_type.is_serial();
        Self {
            name: name.into(),
            column_type,
            nullable: nullable && !serial,
            default: if serial { None } else { default },
        }
    }
}

/// Constraint categories, derived from the leading keywords of a constraint
/// definition or from the catalog's constraint type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
    Other,
}

impl ConstraintKind {
    /// Classify `PRIMARY KEY (id)`, `FOREIGN KEY ...`, `UNIQUE (...)`,
    /// `CHECK (...)` and bare catalog values such as `FOREIGN KEY`.
    pub fn classify(text: &str) -> Self {
        let normalized = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        if normalized.starts_with("PRIMARY KEY") {
            ConstraintKind::PrimaryKey
        } else if normalized.starts_with("FOREIGN KEY") {
            ConstraintKind::ForeignKey
        } else if normalized.starts_with("UNIQUE") {
            ConstraintKind::Unique
        } else if normalized.starts_with("CHECK") {
            ConstraintKind::Check
        } else {
            ConstraintKind::Other
        }
    }
}

/// Desired constraint as declared in a table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDefinition {
    pub name: String,
    /// Everything after `CONSTRAINT <name>`, e.g. `UNIQUE (codigo)`.
    pub definition: String,
}

impl ConstraintDefinition {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }

    pub fn kind(&self) -> ConstraintKind {
        ConstraintKind::classify(&self.definition)
    }
}

/// Desired structure of one table: ordered columns and constraints with
/// unique names. Built fresh for every synchronization and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStructure {
    pub columns: Vec<ColumnDefinition>,
    pub constraints: Vec<ConstraintDefinition>,
}

impl TableStructure {
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn constraint(&self, name: &str) -> Option<&ConstraintDefinition> {
        self.constraints.iter().find(|c| c.name == name)
    }
}

/// Column as reported by the live database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveColumn {
    pub name: String,
    /// Raw catalog type, e.g. `varchar(100)` or `character varying`.
    pub type_full: String,
    /// Type without size suffix, e.g. `varchar`.
    pub data_type: String,
    /// Length or display width when the catalog reports one, else 0.
    pub size: u32,
    pub nullable: bool,
    /// Raw catalog default, unnormalized.
    pub default: Option<String>,
}

impl LiveColumn {
    /// Split a MySQL-style `Type` value (`varchar(100)`, `int(11) unsigned`)
    /// into type head and size.
    pub fn from_type_full(
        name: impl Into<String>,
        type_full: impl Into<String>,
        nullable: bool,
        default: Option<String>,
    ) -> Self {
        let type_full = type_full.into();
        let (data_type, size) = match (type_full.find('('), type_full.find(')')) {
            (Some(open), Some(close)) if close > open => {
                let size = type_full[open + 1..close]
                    .split(',')
                    .next()
                    .and_then(|s| s.trim().parse::<u32>().ok())
                    .unwrap_or(0);
                (type_full[..open].trim().to_string(), size)
            }
            _ => (type_full.trim().to_string(), 0),
        };
        Self {
            name: name.into(),
            type_full,
            data_type,
            size,
            nullable,
            default,
        }
    }
}

/// Constraint as reported by the live database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveConstraint {
    pub name: String,
    pub kind: ConstraintKind,
}

impl LiveConstraint {
    pub fn new(name: impl Into<String>, catalog_type: &str) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::classify(catalog_type),
        }
    }
}

/// Snapshot of an existing table, taken for one diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveTable {
    pub columns: Vec<LiveColumn>,
    pub constraints: Vec<LiveConstraint>,
}

impl LiveTable {
    pub fn column(&self, name: &str) -> Option<&LiveColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn constraint(&self, name: &str) -> Option<&LiveConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn has_primary_key(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| c.kind == ConstraintKind::PrimaryKey)
    }
}
