//! nalamini-core — configuration shared by the Nalamini entry router and
//! schema bootstrapper.
//!
//! Configuration is read once at process start (optional TOML file, then
//! environment overrides) and handed to each component explicitly. Nothing
//! in the workspace mutates process environment after startup.

pub mod config;
pub mod cors;
pub mod env;
pub mod error;

pub use config::{MigrationSettings, NalaminiConfig, ServerConfig};
pub use error::{ConfigError, ConfigResult};
