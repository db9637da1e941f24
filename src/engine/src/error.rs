//! Error types for the bundle engine

use thiserror::Error;

/// Bundle engine errors
///
/// "No results" is never an error: empty cohorts and malformed extracts yield
/// empty or sentinel output. Errors are reserved for bad references and bad
/// configuration.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Data model / ingestion error
    #[error(transparent)]
    Core(#[from] brb_core::CoreError),

    /// Requested user has no rows in the extract
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// User exists but does not hold the role
    #[error("User {user_id} does not have role {role_name}. sample_roles={sample_roles:?}")]
    RoleNotHeld {
        user_id: String,
        role_name: String,
        sample_roles: Vec<String>,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration decoding error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
