//! nalamini — entry point for the Nalamini Service Platform.
//!
//! The request router and the schema bootstrapper are separate deployables
//! served by the same binary:
//!
//! ```text
//! nalamini serve --port 3000             # request router
//! nalamini serve-migrations --port 3001  # GET /api/run-migrations
//! nalamini migrate                       # one-shot bootstrap, exits non-zero on failure
//! ```
//!
//! Configuration comes from `--config <file>` (TOML) overlaid with the
//! environment (`NODE_ENV`, `DATABASE_URL`, `PORT`, `MIGRATION_TIMEOUT_SECS`).

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use nalamini_core::NalaminiConfig;
use nalamini_migrate::{MigrationState, PostgresConnector};
use nalamini_router::RouterState;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ROUTER_PORT: u16 = 3000;
const DEFAULT_MIGRATION_PORT: u16 = 3001;

#[derive(Parser)]
#[command(name = "nalamini", about = "Nalamini Service Platform entry point")]
struct Cli {
    /// TOML configuration file. Environment variables take precedence.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the request router.
    Serve {
        /// Port to listen on (defaults to PORT, then 3000).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Serve the migration endpoint.
    ServeMigrations {
        /// Port to listen on (defaults to PORT, then 3001).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run the schema bootstrapper once and print its report.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = NalaminiConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { port } => {
            let port = port.unwrap_or_else(|| config.port_or(DEFAULT_ROUTER_PORT));
            let router = nalamini_router::build_router(RouterState::from_config(&config));
            serve(router, &config, port, "router").await
        }
        Command::ServeMigrations { port } => {
            let port = port.unwrap_or_else(|| config.port_or(DEFAULT_MIGRATION_PORT));
            let router = nalamini_migrate::migration_router(MigrationState::from_config(&config));
            serve(router, &config, port, "migrations").await
        }
        Command::Migrate => migrate_once(&config).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,nalamini=debug,nalamini_router=debug,nalamini_migrate=debug")
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn serve(
    router: axum::Router,
    config: &NalaminiConfig,
    port: u16,
    component: &'static str,
) -> anyhow::Result<()> {
    let addr = format!("{}:{port}", config.server.host);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, component, environment = config.environment(), "server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(component, "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn migrate_once(config: &NalaminiConfig) -> anyhow::Result<()> {
    let result = nalamini_migrate::bootstrap(
        &PostgresConnector,
        config.database_url(),
        &config.migrations,
    )
    .await;

    match result {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(err) => {
            error!(
                kind = ?err.kind(),
                statement = err.failed_statement(),
                troubleshooting = err.troubleshooting(),
                instructions = err.instructions(),
                "migration failed"
            );
            Err(err.into())
        }
    }
}
