//! Request routing for the Nalamini entry point.
//!
//! `route` is a pure function of method, request target, environment label
//! and clock, so every branch can be exercised without a server.

use axum::Json;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, SecondsFormat, Utc};
use http::{Method, StatusCode, Uri};
use nalamini_core::cors;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::RoutingError;

pub const APPLICATION_NAME: &str = "Nalamini Service Platform";
pub const APPLICATION_VERSION: &str = "1.0";

/// Which canned response a request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Preflight,
    Health,
    MigrationForward,
    Api,
    AppInfo,
}

/// Per-request inputs that are not part of the request itself.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub environment: &'a str,
    pub now: DateTime<Utc>,
}

/// Status plus optional JSON body. CORS headers are added on conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl RouteResponse {
    fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    fn bad_request(err: &RoutingError) -> Self {
        Self::json(
            StatusCode::BAD_REQUEST,
            json!({
                "status": "error",
                "error": "Bad Request",
                "message": err.to_string(),
            }),
        )
    }
}

impl IntoResponse for RouteResponse {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        };
        cors::apply(response.headers_mut(), cors::ROUTER_ALLOW_METHODS);
        response
    }
}

/// Resolve a method and path to a route. First match wins.
pub fn classify(method: &Method, path: &str) -> Route {
    if method == Method::OPTIONS {
        return Route::Preflight;
    }
    match path {
        "/api/health" | "/health" => Route::Health,
        "/api/run-migrations" | "/run-migrations" => Route::MigrationForward,
        p if p.starts_with("/api/") => Route::Api,
        _ => Route::AppInfo,
    }
}

/// Extract the path component of a request target (origin or absolute form).
pub fn request_path(target: &str) -> Result<String, RoutingError> {
    let uri: Uri = target
        .parse()
        .map_err(|source| RoutingError::MalformedTarget {
            target: target.to_string(),
            source,
        })?;
    let path = uri.path();
    if !path.starts_with('/') {
        return Err(RoutingError::MissingPath(target.to_string()));
    }
    Ok(remove_dot_segments(path))
}

/// Resolve `.` and `..` segments the way a URL parser does, so
/// `/api/../health` routes as `/health`. `..` never climbs above the root.
pub fn remove_dot_segments(path: &str) -> String {
    let segments: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();
    let last = segments.len() - 1;
    let mut resolved: Vec<&str> = Vec::with_capacity(segments.len());

    for (i, segment) in segments.into_iter().enumerate() {
        if is_dot(segment, 1) {
            if i == last {
                resolved.push("");
            }
        } else if is_dot(segment, 2) {
            resolved.pop();
            if i == last {
                resolved.push("");
            }
        } else {
            resolved.push(segment);
        }
    }
    format!("/{}", resolved.join("/"))
}

/// `.`/`..` including the percent-encoded `%2e` forms.
fn is_dot(segment: &str, dots: usize) -> bool {
    let mut rest = segment;
    for _ in 0..dots {
        if let Some(r) = rest.strip_prefix('.') {
            rest = r;
        } else if rest.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("%2e")) {
            rest = &rest[3..];
        } else {
            return false;
        }
    }
    rest.is_empty()
}

/// Produce exactly one response for a request.
pub fn route(method: &Method, target: &str, ctx: &RequestContext<'_>) -> RouteResponse {
    debug!(%method, uri = target, environment = ctx.environment, "request received");

    // Preflight never depends on the target being well formed.
    if method == Method::OPTIONS {
        return RouteResponse::empty(StatusCode::OK);
    }

    let path = match request_path(target) {
        Ok(path) => path,
        Err(e) => {
            warn!(%method, uri = target, error = %e, "rejecting malformed request target");
            return RouteResponse::bad_request(&e);
        }
    };

    let time = iso_timestamp(ctx.now);
    match classify(method, &path) {
        Route::Preflight => RouteResponse::empty(StatusCode::OK),
        Route::Health => RouteResponse::json(
            StatusCode::OK,
            json!({
                "status": "ok",
                "message": "Nalamini Service Platform API is running",
                "time": time,
                "env": ctx.environment,
            }),
        ),
        // Acknowledgment only. The bootstrapper is served by its own deployable.
        Route::MigrationForward => RouteResponse::json(
            StatusCode::OK,
            json!({
                "status": "forward",
                "message": "Request forwarded to migration handler",
            }),
        ),
        Route::Api => RouteResponse::json(
            StatusCode::OK,
            json!({
                "status": "ok",
                "message": "Nalamini API handler",
                "path": path,
                "env": ctx.environment,
                "time": time,
            }),
        ),
        Route::AppInfo => RouteResponse::json(
            StatusCode::OK,
            json!({
                "application": APPLICATION_NAME,
                "status": "online",
                "version": APPLICATION_VERSION,
                "environment": ctx.environment,
                "time": time,
                "documentation": "Please visit /api/health for API status",
            }),
        ),
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-01-01T00:00:00.000Z`.
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}
