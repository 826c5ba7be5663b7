//! Error types for the indexer console

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// Missing or rejected session token
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport failure or a non-2xx response without an error body
    #[error("{0}")]
    Network(String),

    /// Non-2xx response carrying `{"error": "..."}`
    #[error("{0}")]
    Backend(String),

    /// Not raised locally; the backend validates configuration
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl ConsoleError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ConsoleError::Auth(_))
    }
}

// GUI messages carry errors and must be `Clone`
impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        ConsoleError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::Json(err.to_string())
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        ConsoleError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
