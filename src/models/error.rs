use thiserror::Error;

use crate::auth::AuthErrorCode;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Failed to load {path}: {message}")]
    LoadFailed { path: String, message: String },

    #[error("Load timed out after {seconds}s")]
    LoadTimeout { seconds: u64 },

    #[error("Permission denied for {0}")]
    PermissionDenied(String),

    #[error("Failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("Invalid database path: {0}")]
    InvalidPath(String),

    #[error("Unknown metric: {0}")]
    InvalidMetric(String),

    #[error("{}", .0.friendly_message())]
    Auth(AuthErrorCode),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidImage(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ExplorerError {
    /// Short message suitable for the leaderboard's error banner
    pub fn user_message(&self) -> &'static str {
        match self {
            ExplorerError::PermissionDenied(_) => "Permission denied by database",
            ExplorerError::LoadTimeout { .. } => "Database did not respond in time",
            _ => "Failed to connect to database",
        }
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
