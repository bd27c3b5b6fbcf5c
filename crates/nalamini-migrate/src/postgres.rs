//! Postgres backend on sqlx.
//!
//! Pool options come from [`MigrationSettings`] passed in by the caller;
//! no driver configuration is read from process-wide state.

use std::str::FromStr;

use nalamini_core::MigrationSettings;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgConnection, PgPool, Postgres};
use tracing::debug;

use crate::error::{BootstrapError, StoreError};
use crate::executor::{ConnectionSource, Connector, SchemaExecutor};
use crate::plan::Statement;

pub const APPLICATION_NAME: &str = "nalamini-migrate";

/// Builds lazily-connecting Postgres pools.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresConnector;

impl Connector for PostgresConnector {
    type Source = PgPool;

    fn connect(
        &self,
        database_url: &str,
        settings: &MigrationSettings,
    ) -> Result<PgPool, BootstrapError> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| BootstrapError::InvalidDatabaseUrl(e.into()))?
            .application_name(APPLICATION_NAME);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .acquire_timeout(settings.acquire_timeout())
            .connect_lazy_with(options);

        debug!(
            max_connections = settings.max_connections,
            acquire_timeout_secs = settings.acquire_timeout_secs,
            "postgres pool configured"
        );
        Ok(pool)
    }
}

impl ConnectionSource for PgPool {
    type Connection = PoolConnection<Postgres>;

    async fn acquire(&self) -> Result<Self::Connection, StoreError> {
        Ok(PgPool::acquire(self).await?)
    }

    async fn close(&self) {
        PgPool::close(self).await;
    }
}

impl SchemaExecutor for PoolConnection<Postgres> {
    async fn execute(&mut self, statement: &Statement) -> Result<u64, StoreError> {
        let sql = statement.sql();
        let conn: &mut PgConnection = self;
        // Simple-query protocol: DDL needs no prepared statement.
        let result = sqlx::Executor::execute(conn, sql.as_str()).await?;
        Ok(result.rows_affected())
    }
}
