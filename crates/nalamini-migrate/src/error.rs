//! Error types for the schema bootstrapper.

use std::error::Error as StdError;
use std::time::Duration;

use nalamini_core::ConfigError;
use serde::Serialize;
use thiserror::Error;

/// Boxed error produced by a store backend.
pub type StoreError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type alias for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Fixed hint attached to every failure response.
pub const TROUBLESHOOTING: &str = "Check database connection string and permissions";

/// Remediation for a missing or unusable credential.
pub const CONFIGURATION_INSTRUCTIONS: &str =
    "Please add the DATABASE_URL environment variable in your deployment settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    Connection,
    Statement,
    Timeout,
}

/// Errors that can abort a bootstrap run.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("invalid database url: {0}")]
    InvalidDatabaseUrl(#[source] StoreError),

    #[error("failed to connect to database: {0}")]
    Connection(#[source] StoreError),

    /// The store's message, verbatim. `label` names the failing statement.
    #[error("{source}")]
    Statement {
        label: String,
        #[source]
        source: StoreError,
    },

    #[error("migration did not finish within {0:?}")]
    Timeout(Duration),
}

impl BootstrapError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BootstrapError::Configuration(_) | BootstrapError::InvalidDatabaseUrl(_) => {
                FailureKind::Configuration
            }
            BootstrapError::Connection(_) => FailureKind::Connection,
            BootstrapError::Statement { .. } => FailureKind::Statement,
            BootstrapError::Timeout(_) => FailureKind::Timeout,
        }
    }

    pub fn troubleshooting(&self) -> &'static str {
        TROUBLESHOOTING
    }

    pub fn instructions(&self) -> Option<&'static str> {
        match self.kind() {
            FailureKind::Configuration => Some(CONFIGURATION_INSTRUCTIONS),
            _ => None,
        }
    }

    pub fn failed_statement(&self) -> Option<&str> {
        match self {
            BootstrapError::Statement { label, .. } => Some(label),
            _ => None,
        }
    }

    /// Debug rendering followed by the `source()` chain, one cause per line.
    pub fn diagnostic_trace(&self) -> String {
        let mut trace = format!("{self:?}");
        let mut cause = self.source();
        while let Some(err) = cause {
            trace.push_str("\n    caused by: ");
            trace.push_str(&err.to_string());
            cause = err.source();
        }
        trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_is_configuration() {
        let err = BootstrapError::from(ConfigError::Missing("DATABASE_URL"));
        assert_eq!(err.kind(), FailureKind::Configuration);
        assert_eq!(
            err.to_string(),
            "DATABASE_URL is not defined in environment variables"
        );
        assert_eq!(err.instructions(), Some(CONFIGURATION_INSTRUCTIONS));
    }

    #[test]
    fn statement_error_is_verbatim() {
        let err = BootstrapError::Statement {
            label: "create table users".into(),
            source: "permission denied for schema public".into(),
        };
        assert_eq!(err.kind(), FailureKind::Statement);
        assert_eq!(err.to_string(), "permission denied for schema public");
        assert_eq!(err.failed_statement(), Some("create table users"));
        assert!(err.instructions().is_none());
        assert!(
            err.diagnostic_trace()
                .contains("caused by: permission denied for schema public")
        );
    }

    #[test]
    fn timeout_message() {
        let err = BootstrapError::Timeout(Duration::from_secs(60));
        assert_eq!(err.kind(), FailureKind::Timeout);
        assert_eq!(err.to_string(), "migration did not finish within 60s");
        assert_eq!(err.troubleshooting(), TROUBLESHOOTING);
    }

    #[test]
    fn sub_second_timeout_message() {
        let err = BootstrapError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "migration did not finish within 250ms");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::Configuration).unwrap();
        assert_eq!(json, "\"configuration\"");
    }
}
