//! services/studio/src/error.rs
//!
//! Errors that stop the studio from starting or from serving. Request-level
//! failures never reach this type; handlers map `PortError` to a status code.

use crate::config::ConfigError;
use novel_assistant_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A port call made during start-up, such as seeding, failed.
    #[error("Store or generation failure: {0}")]
    Port(#[from] PortError),

    /// Opening the SQLite pool failed.
    #[error("SQLite error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Schema migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Binding the listener or writing the API document failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Studio failure: {0}")]
    Internal(String),
}
