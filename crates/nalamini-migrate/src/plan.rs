//! The ordered statement sequence a bootstrap run executes.

use std::fmt;

use crate::schema::{TABLES, TableDef, UniqueKey};
use crate::seed::{SEEDS, SeedSet};

/// One idempotent statement of the bootstrap plan.
#[derive(Debug, Clone, Copy)]
pub enum Statement {
    /// `CREATE TABLE IF NOT EXISTS`.
    CreateTable(&'static TableDef),
    /// `CREATE UNIQUE INDEX IF NOT EXISTS`.
    CreateUniqueIndex(&'static TableDef, &'static UniqueKey),
    /// `INSERT ... ON CONFLICT (...) DO NOTHING`.
    Seed(&'static SeedSet),
}

impl Statement {
    pub fn sql(&self) -> String {
        match self {
            Statement::CreateTable(table) => table.create_sql(),
            Statement::CreateUniqueIndex(table, key) => key.create_sql(table.name),
            Statement::Seed(seed) => seed.insert_sql(),
        }
    }

    /// Short human-readable name, e.g. `create table users`.
    pub fn label(&self) -> String {
        self.to_string()
    }

    pub fn table(&self) -> &'static str {
        match self {
            Statement::CreateTable(table) | Statement::CreateUniqueIndex(table, _) => table.name,
            Statement::Seed(seed) => seed.table.name,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::CreateTable(table) => write!(f, "create table {}", table.name),
            Statement::CreateUniqueIndex(_, key) => write!(f, "create unique index {}", key.name),
            Statement::Seed(seed) => write!(f, "seed {}", seed.table.name),
        }
    }
}

/// Tables first, then uniqueness keys, then seed rows.
///
/// Seeds rely on the keys for their conflict targets, and keys rely on
/// their tables, so the order is load-bearing.
pub fn schema_plan() -> Vec<Statement> {
    let tables = TABLES.iter().copied().map(Statement::CreateTable);
    let keys = TABLES.iter().copied().flat_map(|t| {
        t.unique_keys
            .iter()
            .map(move |k| Statement::CreateUniqueIndex(t, k))
    });
    let seeds = SEEDS.iter().copied().map(Statement::Seed);
    tables.chain(keys).chain(seeds).collect()
}
