//! MySQL/MariaDB connection driver.
//!
//! Holds one `mysql_async` connection for the lifetime of the facade.
//! Statement failures are recorded, not returned: see [`Driver`].

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder, Value};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::core::schema::{LiveColumn, LiveConstraint};
use crate::core::traits::{paginate, Dialect, Driver};
use crate::core::value::Row;
use crate::drivers::common::{install_crypto_provider, SslMode};
use crate::error::{Result, SyncError};

use super::MysqlDialect;

/// Live MySQL connection.
pub struct MysqlDriver {
    conn: Option<Conn>,
    dialect: MysqlDialect,
    last_error: Option<String>,
}

impl MysqlDriver {
    /// Connect with the configured parameters.
    ///
    /// When `foreign_keys` is disabled in the configuration, foreign key
    /// checks are switched off for this session right after connecting.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut builder = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.effective_port())
            .db_name(Some(config.name.clone()))
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()))
            .init(vec!["SET NAMES utf8mb4"]);
        if let Some(ssl) = SslMode::parse(&config.ssl_mode)?.mysql_opts() {
            install_crypto_provider();
            builder = builder.ssl_opts(ssl);
        }

        let conn = Conn::new(builder).await.map_err(|e| {
            SyncError::connection(
                e,
                format!(
                    "connecting to MySQL at {}:{}/{}",
                    config.host,
                    config.effective_port(),
                    config.name
                ),
            )
        })?;

        let (major, minor, patch) = conn.server_version();
        info!(
            "Connected to MySQL {}.{}.{} at {}:{}",
            major,
            minor,
            patch,
            config.host,
            config.effective_port()
        );

        let mut driver = Self {
            conn: Some(conn),
            dialect: MysqlDialect::new(),
            last_error: None,
        };
        if !config.foreign_keys {
            debug!("Disabling foreign key checks for this session");
            driver.exec("SET foreign_key_checks = 0;").await;
        }
        Ok(driver)
    }

    fn record(&mut self, message: String) {
        self.last_error = Some(message);
    }

    async fn query_rows(&mut self, sql: &str) -> Vec<Row> {
        let Some(conn) = self.conn.as_mut() else {
            self.record("connection is closed".to_string());
            return Vec::new();
        };
        match conn.query::<mysql_async::Row, _>(sql).await {
            Ok(rows) => rows.into_iter().map(convert_row).collect(),
            Err(e) => {
                self.record(e.to_string());
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Driver for MysqlDriver {
    async fn exec(&mut self, sql: &str) -> bool {
        let Some(conn) = self.conn.as_mut() else {
            self.record("connection is closed".to_string());
            return false;
        };
        // query_drop reads every result set of a multi-statement batch.
        match conn.query_drop(sql).await {
            Ok(()) => true,
            Err(e) => {
                self.record(e.to_string());
                false
            }
        }
    }

    async fn select(&mut self, sql: &str, limit: u64, offset: u64) -> Vec<Row> {
        let sql = paginate(sql, limit, offset);
        self.query_rows(&sql).await
    }

    async fn get_columns(&mut self, table: &str) -> Vec<LiveColumn> {
        let sql = format!("SHOW COLUMNS FROM {};", self.dialect.quote_ident(table));
        self.query_rows(&sql)
            .await
            .into_iter()
            .filter_map(|row| {
                let name = row.get("Field")?.to_string();
                let type_full = row.get("Type").unwrap_or_default().to_string();
                let nullable = row.get("Null") == Some("YES");
                let default = row.get("Default").map(str::to_string);
                Some(LiveColumn::from_type_full(name, type_full, nullable, default))
            })
            .collect()
    }

    async fn get_constraints(&mut self, table: &str) -> Vec<LiveConstraint> {
        let sql = format!(
            "SELECT CONSTRAINT_NAME AS name, CONSTRAINT_TYPE AS type \
             FROM information_schema.table_constraints \
             WHERE table_schema = schema() AND table_name = '{}';",
            self.dialect.escape_string(table)
        );
        self.query_rows(&sql)
            .await
            .into_iter()
            .filter_map(|row| {
                let name = row.get_ci("name")?;
                Some(LiveConstraint::new(name, row.get_ci("type").unwrap_or_default()))
            })
            .collect()
    }

    async fn get_tables(&mut self) -> Vec<String> {
        self.query_rows("SHOW TABLES;")
            .await
            .into_iter()
            .filter_map(|row| {
                row.iter()
                    .find(|(key, _)| key.starts_with("Tables_in_"))
                    .and_then(|(_, value)| value.map(str::to_string))
            })
            .collect()
    }

    async fn lastval(&mut self) -> i64 {
        self.query_rows("SELECT LAST_INSERT_ID() AS num;")
            .await
            .first()
            .and_then(|row| row.get("num"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    async fn update_sequence(&mut self, _table: &str, _columns: &[LiveColumn]) {
        // AUTO_INCREMENT tracks the data on its own.
    }

    async fn version(&mut self) -> String {
        match &self.conn {
            Some(conn) => {
                let (major, minor, patch) = conn.server_version();
                format!("MYSQL {}.{}.{}", major, minor, patch)
            }
            None => String::new(),
        }
    }

    async fn close(&mut self) -> bool {
        match self.conn.take() {
            Some(conn) => match conn.disconnect().await {
                Ok(()) => true,
                Err(e) => {
                    self.record(e.to_string());
                    false
                }
            },
            None => true,
        }
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn clear_last_error(&mut self) {
        self.last_error = None;
    }
}

fn convert_row(row: mysql_async::Row) -> Row {
    let columns = row.columns();
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            (
                column.name_str().into_owned(),
                row.as_ref(i).and_then(value_to_text),
            )
        })
        .collect()
}

/// Text form of a wire value, as a text-protocol client would see it.
fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(v) => Some(v.to_string()),
        Value::UInt(v) => Some(v.to_string()),
        Value::Float(v) => Some(v.to_string()),
        Value::Double(v) => Some(v.to_string()),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let mut text = format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            );
            if *micros > 0 {
                text.push_str(&format!(".{:06}", micros));
            }
            Some(text)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = u32::from(*hours) + days * 24;
            let mut text = format!(
                "{}{:02}:{:02}:{:02}",
                if *negative { "-" } else { "" },
                total_hours,
                minutes,
                seconds
            );
            if *micros > 0 {
                text.push_str(&format!(".{:06}", micros));
            }
            Some(text)
        }
    }
}
