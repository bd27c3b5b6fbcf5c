//! Environment variable names and value normalization.

/// Connection string for the relational store. Required by the bootstrapper only.
pub const DATABASE_URL: &str = "DATABASE_URL";

/// Deployment environment label surfaced in response bodies.
pub const NODE_ENV: &str = "NODE_ENV";

/// Listen port override for either server.
pub const PORT: &str = "PORT";

/// Overall bound on one bootstrapper run, in seconds.
pub const MIGRATION_TIMEOUT_SECS: &str = "MIGRATION_TIMEOUT_SECS";

/// Label used when no environment is configured.
pub const UNKNOWN_ENVIRONMENT: &str = "unknown";

/// Trim whitespace and one layer of matching quotes.
///
/// Hosting dashboards frequently store values pasted with surrounding quotes.
pub fn normalize_env_value(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(inner) = trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return inner.trim().to_string();
    }

    trimmed.to_string()
}

/// Normalize a looked-up value, treating empty strings as unset.
pub fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| normalize_env_value(&v)).filter(|v| !v.is_empty())
}
