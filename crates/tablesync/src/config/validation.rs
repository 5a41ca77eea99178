//! Configuration validation.

use super::Config;
use crate::drivers::common::SslMode;
use crate::error::{Result, SyncError};

/// Validate the configuration.
///
/// Connection presence (`host`) is checked lazily by the facade, so a config
/// without one still validates.
pub fn validate(config: &Config) -> Result<()> {
    let db = &config.database;

    match db.r#type.to_lowercase().as_str() {
        "mysql" | "mariadb" | "postgres" | "postgresql" | "pg" => {}
        other => {
            return Err(SyncError::Config(format!(
                "database.type must be 'mysql' or 'postgresql', got '{}'",
                other
            )))
        }
    }

    if let Some(0) = db.port {
        return Err(SyncError::Config("database.port must be at least 1".into()));
    }

    SslMode::parse(&db.ssl_mode)?;

    if config.schema.base_dir.as_os_str().is_empty() {
        return Err(SyncError::Config("schema.base_dir is required".into()));
    }

    Ok(())
}
