//! In-memory store with Postgres-like semantics for the plan's statements.
//!
//! Shared by the integration tests. It mirrors the behaviour the bootstrapper
//! depends on: `IF NOT EXISTS` leaves existing objects untouched, a unique
//! index cannot be built over duplicate rows, and `ON CONFLICT (...)` needs a
//! matching unique key. It also counts pools and connections so that release
//! on every exit path can be asserted.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use nalamini_core::MigrationSettings;
use thiserror::Error;
use tracing::debug;

use nalamini_migrate::error::{BootstrapError, StoreError};
use nalamini_migrate::executor::{ConnectionSource, Connector, SchemaExecutor};
use nalamini_migrate::plan::Statement;
use nalamini_migrate::schema::TableDef;
use nalamini_migrate::seed::SeedSet;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("connection refused")]
    ConnectionRefused,

    #[error("pool is closed")]
    PoolClosed,

    #[error("relation \"{0}\" does not exist")]
    UndefinedTable(String),

    #[error("column \"{column}\" of relation \"{table}\" does not exist")]
    UndefinedColumn { table: String, column: String },

    #[error("there is no unique or exclusion constraint matching the ON CONFLICT specification")]
    NoConflictTarget,

    #[error("could not create unique index \"{0}\": key is duplicated")]
    DuplicateKey(String),

    #[error("duplicate key value violates unique constraint on {table} ({columns})")]
    UniqueViolation { table: String, columns: String },

    #[error("injected failure: {0}")]
    Injected(String),
}

/// Column name to rendered value.
pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone)]
struct MemoryTable {
    name: String,
    columns: Vec<String>,
    unique_sets: Vec<Vec<String>>,
    rows: Vec<Row>,
    next_id: u64,
}

impl MemoryTable {
    fn new(name: &str, columns: Vec<String>, unique_sets: Vec<Vec<String>>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            unique_sets,
            rows: Vec::new(),
            next_id: 1,
        }
    }

    /// Column-level `PRIMARY KEY`/`UNIQUE` only. Separate keys arrive as indexes.
    fn from_def(def: &TableDef) -> Self {
        let columns = def.column_names().map(str::to_string).collect();
        let unique_sets = def
            .columns
            .iter()
            .filter(|c| c.unique || c.primary_key)
            .map(|c| vec![c.name.to_string()])
            .collect();
        Self::new(def.name, columns, unique_sets)
    }

    fn require_column(&self, column: &str) -> Result<(), MemoryError> {
        if self.columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(MemoryError::UndefinedColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
        }
    }

    fn has_unique_set(&self, columns: &[&str]) -> bool {
        let mut wanted: Vec<&str> = columns.to_vec();
        wanted.sort_unstable();
        self.unique_sets.iter().any(|set| {
            let mut have: Vec<&str> = set.iter().map(String::as_str).collect();
            have.sort_unstable();
            have == wanted
        })
    }

    fn key_of<'r>(row: &'r Row, columns: &[String]) -> Vec<Option<&'r String>> {
        columns.iter().map(|c| row.get(c)).collect()
    }

    fn conflicts_on(&self, row: &Row, columns: &[String]) -> bool {
        let key = Self::key_of(row, columns);
        // NULLs never conflict.
        if key.iter().any(Option::is_none) {
            return false;
        }
        self.rows.iter().any(|r| Self::key_of(r, columns) == key)
    }

    fn has_duplicates(&self, columns: &[String]) -> bool {
        let mut seen = BTreeSet::new();
        for row in &self.rows {
            let key = Self::key_of(row, columns);
            if key.iter().any(Option::is_none) {
                continue;
            }
            if !seen.insert(key) {
                return true;
            }
        }
        false
    }

    fn push(&mut self, mut row: Row) {
        if self.columns.iter().any(|c| c == "id") && !row.contains_key("id") {
            row.insert("id".to_string(), self.next_id.to_string());
        }
        self.next_id += 1;
        self.rows.push(row);
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<String, MemoryTable>,
    indexes: BTreeSet<String>,
    executed: Vec<String>,
    pools_opened: usize,
    pools_closed: usize,
    acquisitions: usize,
    open_connections: usize,
    fail_on: Option<String>,
    refuse_connections: bool,
    statement_delay: Option<Duration>,
}

/// Shared in-memory database. Clones refer to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Setup ──────────────────────────────────────────────────────

    /// Create a table directly, bypassing the plan. Simulates an existing deployment.
    pub fn create_table(&self, name: &str, columns: &[&str], unique_sets: &[&[&str]]) {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let unique_sets = unique_sets
            .iter()
            .map(|set| set.iter().map(|c| c.to_string()).collect())
            .collect();
        self.lock()
            .tables
            .insert(name.to_string(), MemoryTable::new(name, columns, unique_sets));
    }

    /// Insert a row directly, without uniqueness checks.
    pub fn insert_row(&self, table: &str, values: &[(&str, &str)]) -> Result<(), MemoryError> {
        let mut state = self.lock();
        let table = state
            .tables
            .get_mut(table)
            .ok_or_else(|| MemoryError::UndefinedTable(table.to_string()))?;
        for (column, _) in values {
            table.require_column(column)?;
        }
        table.push(
            values
                .iter()
                .map(|(c, v)| (c.to_string(), v.to_string()))
                .collect(),
        );
        Ok(())
    }

    /// Fail the statement with this label, e.g. `create table recharges`.
    pub fn fail_on(&self, label: &str) {
        self.lock().fail_on = Some(label.to_string());
    }

    pub fn refuse_connections(&self) {
        self.lock().refuse_connections = true;
    }

    /// Sleep this long before every statement.
    pub fn set_statement_delay(&self, delay: Duration) {
        self.lock().statement_delay = Some(delay);
    }

    // ── Inspection ─────────────────────────────────────────────────

    pub fn table_names(&self) -> Vec<String> {
        self.lock().tables.keys().cloned().collect()
    }

    pub fn columns(&self, table: &str) -> Option<Vec<String>> {
        self.lock().tables.get(table).map(|t| t.columns.clone())
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock().tables.get(table).map_or(0, |t| t.rows.len())
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.lock().indexes.contains(name)
    }

    /// Labels of statements that completed, in order.
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    pub fn pools_opened(&self) -> usize {
        self.lock().pools_opened
    }

    pub fn pools_closed(&self) -> usize {
        self.lock().pools_closed
    }

    pub fn acquisitions(&self) -> usize {
        self.lock().acquisitions
    }

    pub fn open_connections(&self) -> usize {
        self.lock().open_connections
    }

    // ── Statement semantics ────────────────────────────────────────

    /// Apply one statement directly, without a pool or connection.
    pub fn apply(&self, statement: &Statement) -> Result<u64, MemoryError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let label = statement.label();

        if state.fail_on.as_deref() == Some(label.as_str()) {
            return Err(MemoryError::Injected(label));
        }

        let affected = match statement {
            Statement::CreateTable(def) => {
                state
                    .tables
                    .entry(def.name.to_string())
                    .or_insert_with(|| MemoryTable::from_def(def));
                0
            }
            Statement::CreateUniqueIndex(def, key) => {
                if !state.indexes.contains(key.name) {
                    let table = state
                        .tables
                        .get_mut(def.name)
                        .ok_or_else(|| MemoryError::UndefinedTable(def.name.to_string()))?;
                    for column in key.columns {
                        table.require_column(column)?;
                    }
                    let columns: Vec<String> = key.columns.iter().map(|c| c.to_string()).collect();
                    if table.has_duplicates(&columns) {
                        return Err(MemoryError::DuplicateKey(key.name.to_string()));
                    }
                    table.unique_sets.push(columns);
                    state.indexes.insert(key.name.to_string());
                }
                0
            }
            Statement::Seed(seed) => {
                let table = state
                    .tables
                    .get_mut(seed.table.name)
                    .ok_or_else(|| MemoryError::UndefinedTable(seed.table.name.to_string()))?;
                insert_seed(table, seed)?
            }
        };

        debug!(statement = %label, affected, "memory store applied statement");
        state.executed.push(label);
        Ok(affected)
    }
}

fn insert_seed(table: &mut MemoryTable, seed: &SeedSet) -> Result<u64, MemoryError> {
    for column in seed.columns {
        table.require_column(column)?;
    }
    if !table.has_unique_set(seed.conflict_key) {
        return Err(MemoryError::NoConflictTarget);
    }

    let target: Vec<String> = seed.conflict_key.iter().map(|c| c.to_string()).collect();
    let mut inserted = 0;
    for values in seed.rows {
        let row: Row = seed
            .columns
            .iter()
            .zip(values.iter())
            .map(|(c, v)| (c.to_string(), v.as_str().to_string()))
            .collect();

        if table.conflicts_on(&row, &target) {
            continue;
        }
        if let Some(set) = table
            .unique_sets
            .iter()
            .find(|set| **set != target && table.conflicts_on(&row, set))
        {
            return Err(MemoryError::UniqueViolation {
                table: table.name.clone(),
                columns: set.join(", "),
            });
        }
        table.push(row);
        inserted += 1;
    }
    Ok(inserted)
}

impl Connector for MemoryStore {
    type Source = MemoryPool;

    fn connect(
        &self,
        _database_url: &str,
        _settings: &MigrationSettings,
    ) -> Result<MemoryPool, BootstrapError> {
        self.lock().pools_opened += 1;
        Ok(MemoryPool {
            store: self.clone(),
            closed: AtomicBool::new(false),
        })
    }
}

/// Per-run handle onto a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryPool {
    store: MemoryStore,
    closed: AtomicBool,
}

impl ConnectionSource for MemoryPool {
    type Connection = MemoryConnection;

    async fn acquire(&self) -> Result<MemoryConnection, StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MemoryError::PoolClosed.into());
        }
        {
            let mut state = self.store.lock();
            if state.refuse_connections {
                return Err(MemoryError::ConnectionRefused.into());
            }
            state.acquisitions += 1;
            state.open_connections += 1;
        }
        Ok(MemoryConnection {
            store: self.store.clone(),
        })
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.store.lock().pools_closed += 1;
        }
    }
}

/// A checked-out connection. Released on drop.
#[derive(Debug)]
pub struct MemoryConnection {
    store: MemoryStore,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        let mut state = self.store.lock();
        state.open_connections = state.open_connections.saturating_sub(1);
    }
}

impl SchemaExecutor for MemoryConnection {
    async fn execute(&mut self, statement: &Statement) -> Result<u64, StoreError> {
        let delay = self.store.lock().statement_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.store.apply(statement)?)
    }
}
