//! nalamini-router — HTTP entry point for the Nalamini Service Platform.
//!
//! Every request is answered by one of a fixed set of JSON envelopes, or an
//! empty CORS preflight response.
//!
//! # Routes
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | OPTIONS | any | 200, empty body |
//! | any | `/api/health`, `/health` | health probe |
//! | any | `/api/run-migrations`, `/run-migrations` | forwarding acknowledgment |
//! | any | `/api/*` | generic API envelope |
//! | any | anything else | application info |
//!
//! The migration acknowledgment never touches the database; the schema
//! bootstrapper is served separately by `nalamini-migrate`.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use chrono::Utc;
use http::{Method, Uri};
use nalamini_core::NalaminiConfig;

pub use error::RoutingError;
pub use routes::{RequestContext, Route, RouteResponse, classify, route};

/// Shared state for the router: read-only after startup.
#[derive(Clone)]
pub struct RouterState {
    pub environment: Arc<str>,
}

impl RouterState {
    pub fn new(environment: impl Into<Arc<str>>) -> Self {
        Self {
            environment: environment.into(),
        }
    }

    pub fn from_config(config: &NalaminiConfig) -> Self {
        Self::new(config.environment())
    }
}

/// Build the router. Every method and path lands in the same dispatcher.
pub fn build_router(state: RouterState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

async fn dispatch(State(state): State<RouterState>, method: Method, uri: Uri) -> RouteResponse {
    let ctx = RequestContext {
        environment: &state.environment,
        now: Utc::now(),
    };
    route(&method, &uri.to_string(), &ctx)
}
