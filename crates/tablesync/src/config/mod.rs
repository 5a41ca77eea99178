//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;
pub(crate) use types::is_postgres;

use crate::error::{Result, SyncError};
use std::path::Path;
use tracing::debug;

/// Prefix of the environment variables that override file values.
pub const ENV_PREFIX: &str = "TABLESYNC_";

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Apply `TABLESYNC_DB_*` environment variables on top of the loaded values.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| {
            std::env::var(format!("{}{}", ENV_PREFIX, key.to_uppercase())).ok()
        })
    }

    /// Apply overrides from an arbitrary key lookup (keys as in [`Config::get`]).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in CONNECTION_KEYS {
            if let Some(value) = lookup(key) {
                debug!("Overriding {} from environment", key);
                self.set(key, value)?;
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Look up a connection parameter by its flat key.
    ///
    /// Keys: `db_type`, `db_host`, `db_port`, `db_name`, `db_user`, `db_pass`.
    /// Lookup is case-insensitive; unset or unknown keys return `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        let db = &self.database;
        let value = match key.to_lowercase().as_str() {
            "db_type" => db.r#type.clone(),
            "db_host" => db.host.clone(),
            "db_port" => db.effective_port().to_string(),
            "db_name" => db.name.clone(),
            "db_user" => db.user.clone(),
            "db_pass" => db.password.clone(),
            _ => return None,
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let db = &mut self.database;
        match key {
            "db_type" => db.r#type = value,
            "db_host" => db.host = value,
            "db_port" => {
                let port = value.parse::<u16>().map_err(|_| {
                    SyncError::Config(format!("db_port must be a port number, got '{}'", value))
                })?;
                db.port = Some(port);
            }
            "db_name" => db.name = value,
            "db_user" => db.user = value,
            "db_pass" => db.password = value,
            _ => {}
        }
        Ok(())
    }
}

const CONNECTION_KEYS: [&str; 6] = [
    "db_type", "db_host", "db_port", "db_name", "db_user", "db_pass",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_yaml_with_defaults() {
        let config = Config::from_yaml(
            r#"
database:
  host: localhost
  name: erp
  user: root
"#,
        )
        .unwrap();

        assert_eq!(config.database.r#type, "mysql");
        assert_eq!(config.database.effective_port(), 3306);
        assert_eq!(config.schema.base_dir, std::path::PathBuf::from("Core/Table"));
        assert_eq!(config.schema.override_dir, std::path::PathBuf::from("Dynamic/Table"));
        assert!(config.database.foreign_keys);
    }

    #[test]
    fn test_postgres_default_port() {
        let config = Config::from_yaml("database:\n  type: postgresql\n  host: db\n").unwrap();
        assert_eq!(config.get("db_port").as_deref(), Some("5432"));
    }

    #[test]
    fn test_get_is_case_insensitive_and_skips_empty() {
        let config = Config::from_yaml("database:\n  host: db.local\n").unwrap();
        assert_eq!(config.get("DB_HOST").as_deref(), Some("db.local"));
        assert_eq!(config.get("db_pass"), None);
        assert_eq!(config.get("lang"), None);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let env: HashMap<&str, &str> =
            [("db_host", "override.local"), ("db_port", "3307")].into_iter().collect();
        let config = Config::from_yaml("database:\n  host: file.local\n")
            .unwrap()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.host, "override.local");
        assert_eq!(config.database.effective_port(), 3307);
    }

    #[test]
    fn test_override_with_bad_port_fails() {
        let result = Config::default()
            .with_overrides(|key| (key == "db_port").then(|| "abc".to_string()));
        assert!(result.is_err());
    }
}
