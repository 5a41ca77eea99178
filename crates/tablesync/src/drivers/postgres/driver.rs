//! PostgreSQL connection driver.
//!
//! One `tokio_postgres::Client`, its connection future running on a spawned
//! task. Every statement goes through the simple query protocol so results
//! arrive as text, exactly like the MySQL side.

use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::core::schema::{LiveColumn, LiveConstraint};
use crate::core::traits::{paginate, Dialect, Driver};
use crate::core::value::Row;
use crate::drivers::common::TlsBuilder;
use crate::error::{Result, SyncError};

use super::PostgresDialect;

/// Live PostgreSQL connection.
pub struct PostgresDriver {
    client: Option<Client>,
    dialect: PostgresDialect,
    last_error: Option<String>,
}

impl PostgresDriver {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&config.host)
            .port(config.effective_port())
            .dbname(&config.name)
            .user(&config.user)
            .password(&config.password)
            .application_name("tablesync");

        let context = || {
            format!(
                "connecting to PostgreSQL at {}:{}/{}",
                config.host,
                config.effective_port(),
                config.name
            )
        };

        let client = match TlsBuilder::parse(&config.ssl_mode)?.build()? {
            Some(tls) => {
                let (client, connection) = pg_config
                    .connect(tls)
                    .await
                    .map_err(|e| SyncError::connection(e, context()))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        warn!("PostgreSQL connection closed with error: {}", e);
                    }
                });
                client
            }
            None => {
                let (client, connection) = pg_config
                    .connect(NoTls)
                    .await
                    .map_err(|e| SyncError::connection(e, context()))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        warn!("PostgreSQL connection closed with error: {}", e);
                    }
                });
                client
            }
        };

        info!(
            "Connected to PostgreSQL at {}:{}/{}",
            config.host,
            config.effective_port(),
            config.name
        );

        Ok(Self {
            client: Some(client),
            dialect: PostgresDialect::new(),
            last_error: None,
        })
    }

    fn record(&mut self, message: String) {
        self.last_error = Some(message);
    }

    async fn query_rows(&mut self, sql: &str) -> Vec<Row> {
        let Some(client) = self.client.as_ref() else {
            self.record("connection is closed".to_string());
            return Vec::new();
        };
        match client.simple_query(sql).await {
            Ok(messages) => messages
                .into_iter()
                .filter_map(|message| match message {
                    SimpleQueryMessage::Row(row) => Some(
                        row.columns()
                            .iter()
                            .enumerate()
                            .map(|(i, column)| {
                                (column.name().to_string(), row.get(i).map(str::to_string))
                            })
                            .collect(),
                    ),
                    _ => None,
                })
                .collect(),
            Err(e) => {
                self.record(error_message(&e));
                Vec::new()
            }
        }
    }

    fn literal(&self, value: &str) -> String {
        format!("'{}'", self.dialect.escape_string(value))
    }
}

#[async_trait]
impl Driver for PostgresDriver {
    async fn exec(&mut self, sql: &str) -> bool {
        let Some(client) = self.client.as_ref() else {
            self.record("connection is closed".to_string());
            return false;
        };
        match client.batch_execute(sql).await {
            Ok(()) => true,
            Err(e) => {
                self.record(error_message(&e));
                false
            }
        }
    }

    async fn select(&mut self, sql: &str, limit: u64, offset: u64) -> Vec<Row> {
        let sql = paginate(sql, limit, offset);
        self.query_rows(&sql).await
    }

    async fn get_columns(&mut self, table: &str) -> Vec<LiveColumn> {
        let sql = format!(
            "SELECT column_name, data_type, character_maximum_length, column_default, is_nullable \
             FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = {} \
             ORDER BY ordinal_position;",
            self.literal(table)
        );
        self.query_rows(&sql)
            .await
            .into_iter()
            .filter_map(|row| {
                let data_type = row.get("data_type").unwrap_or_default().to_string();
                let size = row
                    .get("character_maximum_length")
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(0);
                let type_full = if size > 0 {
                    format!("{}({})", data_type, size)
                } else {
                    data_type.clone()
                };
                Some(LiveColumn {
                    name: row.get("column_name")?.to_string(),
                    type_full,
                    data_type,
                    size,
                    nullable: row.get("is_nullable") == Some("YES"),
                    default: row.get("column_default").map(str::to_string),
                })
            })
            .collect()
    }

    async fn get_constraints(&mut self, table: &str) -> Vec<LiveConstraint> {
        // pg_constraint rather than information_schema: the latter also
        // lists NOT NULL constraints as CHECK.
        let sql = format!(
            "SELECT conname AS name, \
             CASE contype WHEN 'p' THEN 'PRIMARY KEY' WHEN 'f' THEN 'FOREIGN KEY' \
             WHEN 'u' THEN 'UNIQUE' WHEN 'c' THEN 'CHECK' ELSE 'OTHER' END AS type \
             FROM pg_constraint \
             WHERE conrelid = to_regclass({}) AND contype <> 'n' \
             ORDER BY conname;",
            self.literal(&self.dialect.quote_ident(table))
        );
        self.query_rows(&sql)
            .await
            .into_iter()
            .filter_map(|row| {
                let name = row.get("name")?;
                Some(LiveConstraint::new(name, row.get("type").unwrap_or_default()))
            })
            .collect()
    }

    async fn get_tables(&mut self) -> Vec<String> {
        self.query_rows(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
             ORDER BY table_name;",
        )
        .await
        .into_iter()
        .filter_map(|row| row.get("table_name").map(str::to_string))
        .collect()
    }

    async fn lastval(&mut self) -> i64 {
        self.query_rows("SELECT lastval() AS num;")
            .await
            .first()
            .and_then(|row| row.get("num"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    async fn update_sequence(&mut self, table: &str, columns: &[LiveColumn]) {
        for (column, sql) in sequence_statements(&self.dialect, table, columns) {
            if self.exec(&sql).await {
                debug!("Realigned sequence for {}.{}", table, column);
            }
        }
    }

    async fn version(&mut self) -> String {
        self.query_rows("SHOW server_version;")
            .await
            .first()
            .and_then(|row| row.get("server_version"))
            .map(|v| format!("POSTGRESQL {}", v))
            .unwrap_or_default()
    }

    async fn close(&mut self) -> bool {
        // Dropping the client ends the spawned connection task.
        self.client.take();
        true
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn clear_last_error(&mut self) {
        self.last_error = None;
    }
}

/// `setval` statements realigning each serial column's sequence with the
/// highest value in `table`. Serial columns are the ones defaulting to
/// `nextval(...)`.
fn sequence_statements<'a>(
    dialect: &PostgresDialect,
    table: &str,
    columns: &'a [LiveColumn],
) -> Vec<(&'a str, String)> {
    let quoted_table = dialect.quote_ident(table);
    columns
        .iter()
        .filter(|c| c.default.as_deref().is_some_and(|d| d.contains("nextval(")))
        .map(|c| {
            let sql = format!(
                "SELECT setval(pg_get_serial_sequence('{}', '{}'), \
                 COALESCE((SELECT MAX({}) FROM {}), 0) + 1, false);",
                dialect.escape_string(&quoted_table),
                dialect.escape_string(&c.name),
                dialect.quote_ident(&c.name),
                quoted_table
            );
            (c.name.as_str(), sql)
        })
        .collect()
}

/// Server-side message when there is one, the client error otherwise.
fn error_message(e: &tokio_postgres::Error) -> String {
    match e.as_db_error() {
        Some(db) => format!("{}: {}", db.code().code(), db.message()),
        None => e.to_string(),
    }
}
