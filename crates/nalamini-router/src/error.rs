//! Routing errors.

use thiserror::Error;

/// A request target the router could not interpret.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("malformed request target {target:?}: {source}")]
    MalformedTarget {
        target: String,
        #[source]
        source: http::uri::InvalidUri,
    },

    #[error("request target {0:?} has no absolute path")]
    MissingPath(String),
}
