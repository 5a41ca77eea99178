//! XML table definition reader.
//!
//! A definition lives in `<dir>/<table>.xml`. The override directory wins
//! over the base directory, so deployments can replace a shipped table
//! without touching it:
//!
//! ```xml
//! <table>
//!     <column>
//!         <name>codcliente</name>
//!         <type>character varying(10)</type>
//!         <null>NO</null>
//!     </column>
//!     <constraint>
//!         <name>clientes_pkey</name>
//!         <type>PRIMARY KEY (codcliente)</type>
//!     </constraint>
//! </table>
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::config::SchemaConfig;
use crate::core::schema::{ColumnDefinition, ColumnType, ConstraintDefinition, TableStructure};
use crate::error::{Result, SyncError};

#[derive(Debug, Deserialize)]
struct XmlTable {
    #[serde(rename = "column", default)]
    columns: Vec<XmlColumn>,
    #[serde(rename = "constraint", default)]
    constraints: Vec<XmlConstraint>,
}

#[derive(Debug, Deserialize)]
struct XmlColumn {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
    #[serde(default)]
    null: Option<String>,
    #[serde(default)]
    default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlConstraint {
    name: String,
    #[serde(rename = "type")]
    definition: String,
}

/// Resolves and parses table definitions.
#[derive(Debug, Clone)]
pub struct DefinitionReader {
    base_dir: PathBuf,
    override_dir: PathBuf,
}

impl DefinitionReader {
    pub fn new(base_dir: impl Into<PathBuf>, override_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            override_dir: override_dir.into(),
        }
    }

    pub fn from_config(schema: &SchemaConfig) -> Self {
        Self::new(&schema.base_dir, &schema.override_dir)
    }

    /// Path of the definition used for `table`.
    pub fn locate(&self, table: &str) -> Result<PathBuf> {
        check_table_name(table)?;
        let file = format!("{}.xml", table);
        [&self.override_dir, &self.base_dir]
            .into_iter()
            .map(|dir| dir.join(&file))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                SyncError::definition(
                    table,
                    format!(
                        "no definition file in {} or {}",
                        self.override_dir.display(),
                        self.base_dir.display()
                    ),
                )
            })
    }

    /// Locate, read and parse the definition of `table`.
    pub fn read(&self, table: &str) -> Result<TableStructure> {
        let path = self.locate(table)?;
        debug!("Reading definition of {} from {}", table, path.display());
        let xml = std::fs::read_to_string(&path)?;
        Self::parse(table, &xml)
    }

    /// Parse definition XML. Any invalid column aborts the whole table.
    pub fn parse(table: &str, xml: &str) -> Result<TableStructure> {
        let parsed: XmlTable = quick_xml::de::from_str(xml)
            .map_err(|e| SyncError::definition(table, format!("malformed XML: {}", e)))?;

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(parsed.columns.len());
        for column in parsed.columns {
            let name = column.name.trim().to_string();
            if name.is_empty() {
                return Err(SyncError::definition(table, "column without a name"));
            }
            if !seen.insert(name.clone()) {
                return Err(SyncError::definition(
                    table,
                    format!("duplicate column '{}'", name),
                ));
            }

            let column_type = ColumnType::parse(&column.column_type).ok_or_else(|| {
                SyncError::definition(
                    table,
                    format!(
                        "column '{}' has unsupported type '{}'",
                        name,
                        column.column_type.trim()
                    ),
                )
            })?;
            let nullable = !column
                .null
                .as_deref()
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("no"));
            let default = column
                .default
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty());

            columns.push(ColumnDefinition::new(name, column_type, nullable, default));
        }

        let mut seen = HashSet::new();
        let mut constraints = Vec::with_capacity(parsed.constraints.len());
        for constraint in parsed.constraints {
            let name = constraint.name.trim().to_string();
            let definition = constraint.definition.trim().to_string();
            if name.is_empty() || definition.is_empty() {
                return Err(SyncError::definition(
                    table,
                    "constraint needs both a name and a type",
                ));
            }
            if !seen.insert(name.clone()) {
                return Err(SyncError::definition(
                    table,
                    format!("duplicate constraint '{}'", name),
                ));
            }
            constraints.push(ConstraintDefinition::new(name, definition));
        }

        Ok(TableStructure {
            columns,
            constraints,
        })
    }

    /// Tables with a definition in either directory, sorted.
    pub fn available_tables(&self) -> Result<Vec<String>> {
        let mut tables = Vec::new();
        for dir in [&self.base_dir, &self.override_dir] {
            tables.extend(xml_stems(dir)?);
        }
        tables.sort();
        tables.dedup();
        Ok(tables)
    }
}

fn xml_stems(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut stems = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("xml") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.push(stem.to_string());
        }
    }
    Ok(stems)
}

fn check_table_name(table: &str) -> Result<()> {
    if table.is_empty() || table.contains(['/', '\\']) || table.contains("..") {
        return Err(SyncError::definition(table, "invalid table name"));
    }
    Ok(())
}
