//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection parameters for the live database.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Where table definitions are read from.
    #[serde(default)]
    pub schema: SchemaConfig,
}

/// Database connection configuration.
///
/// An empty `host` is accepted at load time; the facade refuses to connect
/// without one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Engine: "mysql" or "postgresql" (default: mysql).
    #[serde(default = "default_mysql")]
    pub r#type: String,

    /// Database host.
    #[serde(default)]
    pub host: String,

    /// Database port. Defaults to the engine's standard port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name.
    #[serde(default)]
    pub name: String,

    /// Username.
    #[serde(default)]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// TLS mode (default: "disable").
    #[serde(default = "default_disable")]
    pub ssl_mode: String,

    /// Enforce foreign keys on MySQL sessions (default: true).
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            r#type: default_mysql(),
            host: String::new(),
            port: None,
            name: String::new(),
            user: String::new(),
            password: String::new(),
            ssl_mode: default_disable(),
            foreign_keys: true,
        }
    }
}

impl DatabaseConfig {
    /// Port to connect to, falling back to the engine default.
    pub fn effective_port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None if is_postgres(&self.r#type) => 5432,
            None => 3306,
        }
    }
}

/// Locations of the XML table definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Shipped definitions (default: "Core/Table").
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Per-deployment overrides, checked first (default: "Dynamic/Table").
    #[serde(default = "default_override_dir")]
    pub override_dir: PathBuf,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            override_dir: default_override_dir(),
        }
    }
}

pub(crate) fn is_postgres(db_type: &str) -> bool {
    matches!(
        db_type.to_lowercase().as_str(),
        "postgres" | "postgresql" | "pg"
    )
}

fn default_mysql() -> String {
    "mysql".to_string()
}

fn default_disable() -> String {
    "disable".to_string()
}

fn default_true() -> bool {
    true
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("Core/Table")
}

fn default_override_dir() -> PathBuf {
    PathBuf::from("Dynamic/Table")
}
