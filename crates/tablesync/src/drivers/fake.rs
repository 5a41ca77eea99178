//! In-memory driver for unit tests.
//!
//! Records every statement and serves catalog answers from a shared
//! [`FakeState`], which the test keeps a handle to.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::core::schema::{LiveColumn, LiveConstraint, LiveTable};
use crate::core::traits::Driver;
use crate::core::value::Row;

#[derive(Debug, Default)]
pub struct FakeState {
    /// Every statement passed to `exec` or `select`, in order.
    pub executed: Vec<String>,
    pub tables: HashMap<String, LiveTable>,
    /// Statements containing this text fail.
    pub fail_on: Option<String>,
    /// Catalog reads (tables, columns, constraints) fail.
    pub fail_catalog: bool,
    /// Rows returned by every `select`.
    pub rows: Vec<Row>,
    pub lastval: i64,
    pub closed: bool,
    pub sequences_updated: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
    last_error: Option<String>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, table: LiveTable) -> Self {
        self.state().tables.insert(name.to_string(), table);
        self
    }

    pub fn failing_on(self, fragment: &str) -> Self {
        self.state().fail_on = Some(fragment.to_string());
        self
    }

    pub fn failing_catalog(self) -> Self {
        self.state().fail_catalog = true;
        self
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    fn run(&mut self, sql: &str) -> bool {
        let mut state = self.state();
        state.executed.push(sql.to_string());
        let failed = state
            .fail_on
            .as_deref()
            .is_some_and(|fragment| sql.contains(fragment));
        drop(state);
        if failed {
            self.last_error = Some(format!("simulated failure: {}", sql));
        }
        !failed
    }

    /// Answer a catalog read, or record a failure and answer nothing.
    fn catalog<T: Default>(&mut self, read: impl FnOnce(&FakeState) -> T) -> T {
        let state = self.state();
        if state.fail_catalog {
            drop(state);
            self.last_error = Some("simulated catalog failure".to_string());
            return T::default();
        }
        read(&state)
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn exec(&mut self, sql: &str) -> bool {
        self.run(sql)
    }

    async fn select(&mut self, sql: &str, limit: u64, offset: u64) -> Vec<Row> {
        let sql = crate::core::traits::paginate(sql, limit, offset);
        if !self.run(&sql) {
            return Vec::new();
        }
        self.state().rows.clone()
    }

    async fn get_columns(&mut self, table: &str) -> Vec<LiveColumn> {
        self.catalog(|state| {
            state
                .tables
                .get(table)
                .map(|t| t.columns.clone())
                .unwrap_or_default()
        })
    }

    async fn get_constraints(&mut self, table: &str) -> Vec<LiveConstraint> {
        self.catalog(|state| {
            state
                .tables
                .get(table)
                .map(|t| t.constraints.clone())
                .unwrap_or_default()
        })
    }

    async fn get_tables(&mut self) -> Vec<String> {
        self.catalog(|state| {
            let mut tables: Vec<String> = state.tables.keys().cloned().collect();
            tables.sort();
            tables
        })
    }

    async fn lastval(&mut self) -> i64 {
        self.state().lastval
    }

    async fn update_sequence(&mut self, table: &str, _columns: &[LiveColumn]) {
        self.state().sequences_updated.push(table.to_string());
    }

    async fn version(&mut self) -> String {
        "FAKE 1.0".to_string()
    }

    async fn close(&mut self) -> bool {
        self.state().closed = true;
        true
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn clear_last_error(&mut self) {
        self.last_error = None;
    }
}
