//! HTTP endpoint for the bootstrapper.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use http::StatusCode;
use nalamini_core::{MigrationSettings, NalaminiConfig, cors};
use serde::Serialize;
use tracing::error;

use crate::bootstrap::{BootstrapReport, bootstrap};
use crate::error::{BootstrapError, BootstrapResult, FailureKind};
use crate::executor::Connector;
use crate::postgres::PostgresConnector;

/// Shared state for the migration endpoint.
#[derive(Clone)]
pub struct MigrationState<C> {
    pub connector: C,
    pub database_url: Option<Arc<str>>,
    pub settings: MigrationSettings,
}

impl<C: Connector> MigrationState<C> {
    pub fn new(connector: C, database_url: Option<&str>, settings: MigrationSettings) -> Self {
        Self {
            connector,
            database_url: database_url.map(Arc::from),
            settings,
        }
    }
}

impl MigrationState<PostgresConnector> {
    pub fn from_config(config: &NalaminiConfig) -> Self {
        Self::new(
            PostgresConnector,
            config.database_url(),
            config.migrations.clone(),
        )
    }
}

#[derive(Debug, Serialize)]
struct MigrationSuccess {
    success: bool,
    message: &'static str,
    details: &'static str,
    info: &'static str,
    next_steps: &'static str,
    summary: BootstrapReport,
}

#[derive(Debug, Serialize)]
struct MigrationFailure {
    success: bool,
    kind: FailureKind,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    statement: Option<String>,
    stack: String,
    troubleshooting: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'static str>,
}

impl From<&BootstrapError> for MigrationFailure {
    fn from(err: &BootstrapError) -> Self {
        Self {
            success: false,
            kind: err.kind(),
            error: err.to_string(),
            statement: err.failed_statement().map(str::to_string),
            stack: err.diagnostic_trace(),
            troubleshooting: err.troubleshooting(),
            instructions: err.instructions(),
        }
    }
}

/// Build the migration router.
pub fn migration_router<C: Connector>(state: MigrationState<C>) -> Router {
    Router::new()
        .route("/api/run-migrations", get(run_migrations::<C>).options(preflight))
        .route("/run-migrations", get(run_migrations::<C>).options(preflight))
        .with_state(state)
}

/// GET /api/run-migrations
pub async fn run_migrations<C: Connector>(State(state): State<MigrationState<C>>) -> Response {
    let result = bootstrap(
        &state.connector,
        state.database_url.as_deref(),
        &state.settings,
    )
    .await;
    migration_response(result)
}

/// Render a bootstrap outcome as the endpoint's JSON response.
pub fn migration_response(result: BootstrapResult<BootstrapReport>) -> Response {
    let mut response = match result {
        Ok(report) => (
            StatusCode::OK,
            Json(MigrationSuccess {
                success: true,
                message: "Database migration completed successfully",
                details: "Created essential tables for the Nalamini Service Platform",
                info: "This is a one-time operation to set up your database schema",
                next_steps: "Set up all required environment variables and deploy your full application",
                summary: report,
            }),
        )
            .into_response(),
        Err(err) => {
            error!(kind = ?err.kind(), error = %err, statement = err.failed_statement(), "migration failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MigrationFailure::from(&err)),
            )
                .into_response()
        }
    };
    cors::apply(response.headers_mut(), cors::MIGRATION_ALLOW_METHODS);
    response
}

/// OPTIONS preflight. Never runs the plan.
async fn preflight() -> Response {
    let mut response = StatusCode::OK.into_response();
    cors::apply(response.headers_mut(), cors::MIGRATION_ALLOW_METHODS);
    response
}
