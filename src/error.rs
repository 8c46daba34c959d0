// Error taxonomy for the console core - every operation failure maps to one of these

use thiserror::Error;

/// Failures surfaced by registry, checker and push operations.
///
/// Validation and not-found conditions are detected locally and returned
/// before any side effect. Remote failures during state-changing operations
/// prevent local persistence, so the catalog only ever reflects the last
/// confirmed remote state.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("module not found: {app_name}@{ip}")]
    ModuleNotFound { app_name: String, ip: String },

    #[error("config not exist: {app_name}/{environment}")]
    ConfigNotFound {
        app_name: String,
        environment: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("module already registered: {app_name}@{ip}")]
    AlreadyRegistered { app_name: String, ip: String },

    /// Remote agent call failed or reported non-success; carries the
    /// remote message verbatim.
    #[error("remote agent unreachable: {message}")]
    RemoteUnreachable { message: String },

    #[error("serialize config occurred error, message = {0}")]
    Serialization(String),

    /// Push fan-out found no registered instance for the requested
    /// (appName, environment) pair.
    #[error("no alive module, don't need to push config.")]
    NoAliveModule {
        app_name: String,
        environment: String,
    },

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl ConsoleError {
    pub fn validation(message: impl Into<String>) -> Self {
        ConsoleError::Validation(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        ConsoleError::RemoteUnreachable {
            message: message.into(),
        }
    }
}
