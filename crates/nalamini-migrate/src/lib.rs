//! nalamini-migrate — idempotent schema bootstrapper for the Nalamini
//! Service Platform.
//!
//! # Architecture
//!
//! The schema is described by typed, `static` table and seed definitions
//! ([`schema`], [`seed`]). [`plan::schema_plan`] turns them into an ordered
//! list of idempotent statements: `CREATE TABLE IF NOT EXISTS` for every
//! table, `CREATE UNIQUE INDEX IF NOT EXISTS` for every uniqueness key, then
//! `INSERT ... ON CONFLICT (...) DO NOTHING` for reference rows.
//!
//! A [`Bootstrapper`] executes the plan sequentially on a single connection
//! acquired from a [`ConnectionSource`], aborting at the first failure. The
//! store offers no transactional DDL across statements, so a failed run can
//! leave a partial schema; re-running completes it because every statement
//! tolerates objects that already exist. There is no migration history.
//!
//! The Postgres backend is [`PostgresConnector`] (sqlx). Other stores plug
//! in through [`Connector`].

pub mod bootstrap;
pub mod error;
pub mod executor;
pub mod handler;
pub mod plan;
pub mod postgres;
pub mod schema;
pub mod seed;

pub use bootstrap::{BootstrapReport, Bootstrapper, bootstrap};
pub use error::{BootstrapError, BootstrapResult, FailureKind};
pub use executor::{ConnectionSource, Connector, SchemaExecutor};
pub use handler::{MigrationState, migration_response, migration_router};
pub use plan::{Statement, schema_plan};
pub use postgres::PostgresConnector;
