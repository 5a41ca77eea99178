//! Database facade.
//!
//! [`Database`] owns the dialect chosen from configuration and, once first
//! used, one live driver connection. Every statement is logged before it
//! runs; a driver error is logged with the statement and then cleared, so
//! callers of `exec` and `select` only ever see a `false` or an empty
//! result. Catalog reads turn the error into [`SyncError::Catalog`] instead.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, error, info};

use crate::config::DatabaseConfig;
use crate::core::schema::{LiveColumn, LiveConstraint};
use crate::core::traits::{Dialect, Driver};
use crate::core::value::{Row, SqlValue};
use crate::drivers::{DialectImpl, DriverImpl};
use crate::error::{Result, SyncError};

/// Connection context shared by everything that talks to the database.
pub struct Database {
    config: DatabaseConfig,
    dialect: DialectImpl,
    driver: Option<DriverImpl>,
    in_transaction: bool,
}

impl Database {
    /// Select the dialect from `config`. Does not connect.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self {
            dialect: DialectImpl::from_db_type(&config.r#type)?,
            config: config.clone(),
            driver: None,
            in_transaction: false,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_driver(config: &DatabaseConfig, driver: DriverImpl) -> Result<Self> {
        let mut db = Self::new(config)?;
        db.driver = Some(driver);
        Ok(db)
    }

    pub fn dialect(&self) -> &DialectImpl {
        &self.dialect
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Connect now instead of on first use.
    pub async fn connect(&mut self) -> Result<()> {
        self.driver().await.map(|_| ())
    }

    async fn driver(&mut self) -> Result<&mut DriverImpl> {
        if self.driver.is_none() {
            if self.config.host.trim().is_empty() {
                return Err(SyncError::Config(
                    "no-db-setup: database host is not configured".into(),
                ));
            }
            let driver = DriverImpl::connect(&self.config).await?;
            self.driver = Some(driver);
        }
        self.driver
            .as_mut()
            .ok_or_else(|| SyncError::Config("no-db-setup".into()))
    }

    /// Close the connection, if any, and reset the transaction flag.
    pub async fn close(&mut self) -> bool {
        self.in_transaction = false;
        match self.driver.take() {
            Some(mut driver) => {
                let closed = driver.close().await;
                flush_error(&mut driver, "close");
                info!("Database connection closed");
                closed
            }
            None => true,
        }
    }

    /// Execute statements without a result set.
    pub async fn exec(&mut self, sql: &str) -> Result<bool> {
        debug!("SQL: {}", sql);
        let driver = self.driver().await?;
        let ok = driver.exec(sql).await;
        flush_error(driver, sql);
        Ok(ok)
    }

    /// Run a query without a row limit.
    pub async fn select(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.select_limit(sql, 0, 0).await
    }

    /// Run a query returning at most `limit` rows after `offset`.
    pub async fn select_limit(&mut self, sql: &str, limit: u64, offset: u64) -> Result<Vec<Row>> {
        debug!("SQL: {} (limit {}, offset {})", sql, limit, offset);
        let driver = self.driver().await?;
        let rows = driver.select(sql, limit, offset).await;
        flush_error(driver, sql);
        Ok(rows)
    }

    pub async fn begin_transaction(&mut self) -> Result<bool> {
        let driver = self.driver().await?;
        let ok = driver.begin_transaction().await;
        flush_error(driver, "START TRANSACTION;");
        if ok {
            self.in_transaction = true;
        }
        Ok(ok)
    }

    pub async fn commit(&mut self) -> Result<bool> {
        let driver = self.driver().await?;
        let ok = driver.commit().await;
        flush_error(driver, "COMMIT;");
        if ok {
            self.in_transaction = false;
        }
        Ok(ok)
    }

    pub async fn rollback(&mut self) -> Result<bool> {
        let driver = self.driver().await?;
        let ok = driver.rollback().await;
        flush_error(driver, "ROLLBACK;");
        if ok {
            self.in_transaction = false;
        }
        Ok(ok)
    }

    /// Live columns of `table`. A failed catalog read is an error, never an
    /// empty list.
    pub async fn get_columns(&mut self, table: &str) -> Result<Vec<LiveColumn>> {
        let what = format!("columns of {}", table);
        let driver = self.driver().await?;
        let columns = driver.get_columns(table).await;
        catalog_result(driver, &what, columns)
    }

    pub async fn get_constraints(&mut self, table: &str) -> Result<Vec<LiveConstraint>> {
        let what = format!("constraints of {}", table);
        let driver = self.driver().await?;
        let constraints = driver.get_constraints(table).await;
        catalog_result(driver, &what, constraints)
    }

    pub async fn get_tables(&mut self) -> Result<Vec<String>> {
        let driver = self.driver().await?;
        let tables = driver.get_tables().await;
        catalog_result(driver, "table list", tables)
    }

    pub async fn table_exists(&mut self, table: &str) -> Result<bool> {
        Ok(self.get_tables().await?.iter().any(|t| t == table))
    }

    pub async fn lastval(&mut self) -> Result<i64> {
        let driver = self.driver().await?;
        let value = driver.lastval().await;
        flush_error(driver, "lastval");
        Ok(value)
    }

    pub async fn update_sequence(&mut self, table: &str, columns: &[LiveColumn]) -> Result<()> {
        let driver = self.driver().await?;
        driver.update_sequence(table, columns).await;
        flush_error(driver, &format!("sequences of {}", table));
        Ok(())
    }

    pub async fn version(&mut self) -> Result<String> {
        let driver = self.driver().await?;
        let version = driver.version().await;
        flush_error(driver, "version");
        Ok(version)
    }

    pub fn escape_column(&self, name: &str) -> String {
        self.dialect.quote_ident(name)
    }

    pub fn escape_string(&self, value: &str) -> String {
        self.dialect.escape_string(value)
    }

    pub fn date_style(&self) -> &'static str {
        self.dialect.date_style()
    }

    /// Encode a value as an SQL literal.
    ///
    /// `D-M-YYYY` and `D-M-YYYY H:M:S` strings are reformatted to the
    /// dialect's date style. Every other non-null, non-boolean value is
    /// escaped and single-quoted, numbers included.
    pub fn var2str(&self, value: impl Into<SqlValue>) -> String {
        let value = value.into();
        let text = match value {
            SqlValue::Null => return "NULL".to_string(),
            SqlValue::Bool(true) => return "TRUE".to_string(),
            SqlValue::Bool(false) => return "FALSE".to_string(),
            other => other.as_text().unwrap_or_default(),
        };

        let style = self.date_style();
        if let Some(date) = parse_dmy(&text) {
            return format!("'{}'", date.format(style));
        }
        if let Some(datetime) = parse_dmy_hms(&text) {
            return format!("'{}'", datetime.format(&format!("{} %H:%M:%S", style)));
        }
        format!("'{}'", self.escape_string(&text))
    }
}

/// Log and clear whatever error the last driver call left behind.
fn flush_error(driver: &mut DriverImpl, sql: &str) -> Option<String> {
    let message = driver.last_error().map(str::to_string)?;
    error!(sql = %sql, "{}", message);
    driver.clear_last_error();
    Some(message)
}

fn catalog_result<T>(driver: &mut DriverImpl, what: &str, value: T) -> Result<T> {
    match flush_error(driver, what) {
        Some(message) => Err(SyncError::Catalog {
            what: what.to_string(),
            message,
        }),
        None => Ok(value),
    }
}

fn digits(part: &str, min: usize, max: usize) -> Option<u32> {
    if part.len() < min || part.len() > max || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// `D-M-YYYY` with one or two digit day and month.
fn parse_dmy(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split('-');
    let day = digits(parts.next()?, 1, 2)?;
    let month = digits(parts.next()?, 1, 2)?;
    let year = digits(parts.next()?, 4, 4)?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// `D-M-YYYY H:M:S` with one or two digit time fields.
fn parse_dmy_hms(text: &str) -> Option<NaiveDateTime> {
    let (date, time) = text.split_once(' ')?;
    let date = parse_dmy(date)?;
    let mut parts = time.split(':');
    let hour = digits(parts.next()?, 1, 2)?;
    let minute = digits(parts.next()?, 1, 2)?;
    let second = digits(parts.next()?, 1, 2)?;
    if parts.next().is_some() {
        return None;
    }
    Some(date.and_time(NaiveTime::from_hms_opt(hour, minute, second)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::LiveTable;
    use crate::drivers::fake::FakeDriver;

    fn config(db_type: &str) -> DatabaseConfig {
        DatabaseConfig {
            r#type: db_type.to_string(),
            host: "localhost".to_string(),
            ..Default::default()
        }
    }

    fn fake_db(fake: &FakeDriver) -> Database {
        Database::with_driver(&config("mysql"), DriverImpl::Fake(fake.clone())).unwrap()
    }

    #[test]
    fn test_new_rejects_unknown_dialect() {
        assert!(matches!(
            Database::new(&config("oracle")),
            Err(SyncError::Config(_))
        ));
        let db = Database::new(&config("postgres")).unwrap();
        assert_eq!(db.dialect().name(), "postgresql");
        assert!(!db.is_connected());
    }

    #[tokio::test]
    async fn test_missing_host_is_config_error() {
        let mut cfg = config("mysql");
        cfg.host = String::new();
        let mut db = Database::new(&cfg).unwrap();
        let err = db.exec("SELECT 1;").await.unwrap_err();
        assert!(matches!(err, SyncError::Config(msg) if msg.contains("no-db-setup")));
    }

    #[tokio::test]
    async fn test_exec_clears_driver_error() {
        let fake = FakeDriver::new().failing_on("bad");
        let mut db = fake_db(&fake);

        assert!(!db.exec("bad statement;").await.unwrap());
        // The failure must not leak into the next statement.
        assert!(db.exec("SELECT 1;").await.unwrap());
        if let Some(DriverImpl::Fake(driver)) = &db.driver {
            assert!(driver.last_error().is_none());
        }
        assert_eq!(fake.executed(), vec!["bad statement;", "SELECT 1;"]);
    }

    #[tokio::test]
    async fn test_select_limit_paginates() {
        let fake = FakeDriver::new();
        fake.state().rows = vec![Row::from_iter([("n", Some("1".to_string()))])];
        let mut db = fake_db(&fake);

        let rows = db.select_limit("SELECT n FROM t;", 10, 20).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("n"), Some("1"));
        db.select("SELECT n FROM t;").await.unwrap();
        assert_eq!(
            fake.executed(),
            vec!["SELECT n FROM t LIMIT 10 OFFSET 20;", "SELECT n FROM t;"]
        );
    }

    #[tokio::test]
    async fn test_transaction_flag_follows_success() {
        let fake = FakeDriver::new();
        let mut db = fake_db(&fake);

        assert!(db.begin_transaction().await.unwrap());
        assert!(db.in_transaction());
        assert!(db.commit().await.unwrap());
        assert!(!db.in_transaction());

        fake.state().fail_on = Some("START".to_string());
        assert!(!db.begin_transaction().await.unwrap());
        assert!(!db.in_transaction());
    }

    #[tokio::test]
    async fn test_failed_rollback_keeps_flag() {
        let fake = FakeDriver::new();
        let mut db = fake_db(&fake);
        db.begin_transaction().await.unwrap();

        fake.state().fail_on = Some("ROLLBACK".to_string());
        assert!(!db.rollback().await.unwrap());
        assert!(db.in_transaction());

        assert!(db.close().await);
        assert!(!db.in_transaction());
        assert!(fake.state().closed);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut db = Database::new(&config("mysql")).unwrap();
        assert!(db.close().await);
        assert!(db.close().await);
    }

    #[tokio::test]
    async fn test_table_exists() {
        let fake = FakeDriver::new().with_table("clientes", LiveTable::default());
        let mut db = fake_db(&fake);
        assert!(db.table_exists("clientes").await.unwrap());
        assert!(!db.table_exists("pedidos").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_catalog_read_is_an_error() {
        let fake = FakeDriver::new()
            .with_table("clientes", LiveTable::default())
            .failing_catalog();
        let mut db = fake_db(&fake);

        let err = db.get_columns("clientes").await.unwrap_err();
        assert!(matches!(&err, SyncError::Catalog { what, .. } if what == "columns of clientes"));
        assert!(matches!(
            db.get_constraints("clientes").await,
            Err(SyncError::Catalog { .. })
        ));
        assert!(matches!(db.table_exists("clientes").await, Err(SyncError::Catalog { .. })));

        // The error is consumed: the next successful read is clean.
        fake.state().fail_catalog = false;
        assert!(db.table_exists("clientes").await.unwrap());
    }

    #[tokio::test]
    async fn test_lastval_and_update_sequence_pass_through() {
        let fake = FakeDriver::new();
        fake.state().lastval = 17;
        let mut db = fake_db(&fake);

        assert_eq!(db.lastval().await.unwrap(), 17);
        let columns = vec![LiveColumn::from_type_full(
            "id",
            "integer",
            false,
            Some("nextval('clientes_id_seq'::regclass)".into()),
        )];
        db.update_sequence("clientes", &columns).await.unwrap();
        assert_eq!(fake.state().sequences_updated, vec!["clientes"]);
        assert_eq!(db.version().await.unwrap(), "FAKE 1.0");
    }

    #[test]
    fn test_var2str_scalars() {
        let db = Database::new(&config("mysql")).unwrap();
        assert_eq!(db.var2str(SqlValue::Null), "NULL");
        assert_eq!(db.var2str(None::<&str>), "NULL");
        assert_eq!(db.var2str(true), "TRUE");
        assert_eq!(db.var2str(false), "FALSE");
        assert_eq!(db.var2str(42), "'42'");
        assert_eq!(db.var2str(1.5), "'1.5'");
    }

    #[test]
    fn test_var2str_dates() {
        let db = Database::new(&config("postgresql")).unwrap();
        assert_eq!(db.var2str("15-03-2024"), "'2024-03-15'");
        assert_eq!(db.var2str("5-3-2024"), "'2024-03-05'");
        assert_eq!(db.var2str("15-03-2024 9:05:00"), "'2024-03-15 09:05:00'");
        // Not a calendar date: quoted as plain text.
        assert_eq!(db.var2str("31-02-2024"), "'31-02-2024'");
        assert_eq!(db.var2str("2024-03-15"), "'2024-03-15'");
    }

    #[test]
    fn test_var2str_escapes_quotes() {
        let mysql = Database::new(&config("mysql")).unwrap();
        assert_eq!(mysql.var2str("O'Brien"), "'O\\'Brien'");

        let postgres = Database::new(&config("postgresql")).unwrap();
        assert_eq!(postgres.var2str("O'Brien"), "'O''Brien'");
        assert_eq!(
            postgres.var2str("x'; DROP TABLE t; --"),
            "'x''; DROP TABLE t; --'"
        );
    }

    #[test]
    fn test_escape_column() {
        let db = Database::new(&config("mysql")).unwrap();
        assert_eq!(db.escape_column("order"), "`order`");
        assert_eq!(db.date_style(), "%Y-%m-%d");
    }
}
