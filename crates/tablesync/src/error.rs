//! Error types for the synchronization library.
//!
//! Statement failures are absent: the facade logs them with the offending
//! SQL, clears the driver error state and reports `false`. Failed catalog
//! reads are the exception and surface as [`SyncError::Catalog`].

use thiserror::Error;

/// Main error type for database and schema operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Missing or invalid configuration (no connection parameters, bad dialect).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The driver could not establish its connection.
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// A table definition could not be located, parsed or validated.
    #[error("Definition error for table {table}: {message}")]
    Definition { table: String, message: String },

    /// A catalog read (tables, columns, constraints) failed.
    #[error("Catalog error reading {what}: {message}")]
    Catalog { what: String, message: String },

    /// IO error (definition and config files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// MySQL driver error outside of statement execution
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// PostgreSQL driver error outside of statement execution
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

impl SyncError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        SyncError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Definition error
    pub fn definition(table: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::Definition {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Config(_) | SyncError::Yaml(_) => 2,
            SyncError::Connection { .. }
            | SyncError::Catalog { .. }
            | SyncError::MySql(_)
            | SyncError::Postgres(_) => 3,
            SyncError::Definition { .. } => 4,
            SyncError::Io(_) => 5,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_error_display() {
        let err = SyncError::definition("clientes", "invalid-db-column-type: blob");
        assert_eq!(
            err.to_string(),
            "Definition error for table clientes: invalid-db-column-type: blob"
        );
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_exit_codes_by_class() {
        assert_eq!(SyncError::Config("no-db-setup".into()).exit_code(), 2);
        assert_eq!(SyncError::connection("refused", "connecting").exit_code(), 3);
        let catalog = SyncError::Catalog {
            what: "columns of t".into(),
            message: "Table 't' doesn't exist".into(),
        };
        assert_eq!(catalog.exit_code(), 3);
    }

    #[test]
    fn test_format_detailed_includes_message() {
        let err = SyncError::connection("refused", "connecting to MySQL");
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: Connection error: refused"));
        assert!(detailed.contains("connecting to MySQL"));
    }
}
