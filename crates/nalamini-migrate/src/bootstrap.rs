//! The bootstrap run: acquire, execute the plan in order, release.

use std::time::{Duration, Instant};

use nalamini_core::{ConfigError, MigrationSettings, env};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{BootstrapError, BootstrapResult};
use crate::executor::{ConnectionSource, Connector, SchemaExecutor};
use crate::plan::{Statement, schema_plan};

/// Summary of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    /// Tables ensured, in creation order.
    pub tables: Vec<&'static str>,
    pub unique_indexes: Vec<&'static str>,
    /// Seed rows actually inserted by this run. Zero on a re-run.
    pub seed_rows_inserted: u64,
    pub statements_executed: usize,
    pub elapsed_ms: u64,
}

/// Executes the schema plan against a [`ConnectionSource`].
#[derive(Debug, Clone)]
pub struct Bootstrapper {
    plan: Vec<Statement>,
    timeout: Duration,
}

impl Bootstrapper {
    pub fn new(timeout: Duration) -> Self {
        Self {
            plan: schema_plan(),
            timeout,
        }
    }

    pub fn plan(&self) -> &[Statement] {
        &self.plan
    }

    /// Run the plan once, bounded by the configured timeout.
    ///
    /// The source is closed on every exit path. A timed-out run drops its
    /// in-flight future, which returns the connection before the close.
    pub async fn run<S: ConnectionSource>(&self, source: &S) -> BootstrapResult<BootstrapReport> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.run_scoped(source)).await;
        source.close().await;
        debug!("connection source closed");

        let mut report = match outcome {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "bootstrap timed out");
                return Err(BootstrapError::Timeout(self.timeout));
            }
        };
        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(report)
    }

    async fn run_scoped<S: ConnectionSource>(&self, source: &S) -> BootstrapResult<BootstrapReport> {
        let mut conn = source.acquire().await.map_err(BootstrapError::Connection)?;
        debug!("connection acquired");

        let mut report = BootstrapReport::default();
        for statement in &self.plan {
            info!(statement = %statement, "executing");
            let affected = conn
                .execute(statement)
                .await
                .map_err(|source| BootstrapError::Statement {
                    label: statement.label(),
                    source,
                })?;

            match statement {
                Statement::CreateTable(table) => report.tables.push(table.name),
                Statement::CreateUniqueIndex(_, key) => report.unique_indexes.push(key.name),
                Statement::Seed(seed) => {
                    debug!(table = seed.table.name, inserted = affected, "seed rows applied");
                    report.seed_rows_inserted += affected;
                }
            }
            report.statements_executed += 1;
        }
        Ok(report)
    }
}

/// Validate the credential, build a source with `connector`, and run once.
///
/// A missing credential fails before the connector is touched.
pub async fn bootstrap<C: Connector>(
    connector: &C,
    database_url: Option<&str>,
    settings: &MigrationSettings,
) -> BootstrapResult<BootstrapReport> {
    info!(database_url_available = database_url.is_some(), "migration started");
    let database_url = database_url.ok_or(ConfigError::Missing(env::DATABASE_URL))?;

    let source = connector.connect(database_url, settings)?;
    let report = Bootstrapper::new(settings.timeout()).run(&source).await?;

    info!(
        tables = report.tables.len(),
        seed_rows_inserted = report.seed_rows_inserted,
        elapsed_ms = report.elapsed_ms,
        "migration completed successfully"
    );
    Ok(report)
}
