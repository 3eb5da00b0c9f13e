//! Application layer errors

use std::fmt;
use thiserror::Error;

/// Error classification surfaced to callers of the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Add with empty or whitespace-only content
    InvalidContent,
    /// Done/delete referencing an id the workspace does not have
    NotFound,
    /// Command text without the required content or id
    MissingArgument,
    /// Backing storage failed; transient from the user's point of view
    StoreUnavailable,
    /// Missing or malformed startup configuration
    ConfigInvalid,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidContent => "invalid_content",
            ErrorKind::NotFound => "not_found",
            ErrorKind::MissingArgument => "missing_argument",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::ConfigInvalid => "config_invalid",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Task content must not be empty")]
    InvalidContent,

    #[error("Task {id} not found in workspace {workspace}")]
    NotFound { workspace: String, id: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn not_found(workspace: impl Into<String>, id: u64) -> Self {
        StorageError::NotFound { workspace: workspace.into(), id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::InvalidContent => ErrorKind::InvalidContent,
            StorageError::NotFound { .. } => ErrorKind::NotFound,
            StorageError::Io(_)
            | StorageError::Serialization(_)
            | StorageError::Database(_)
            | StorageError::Unavailable(_) => ErrorKind::StoreUnavailable,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ConfigInvalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_kinds() {
        assert_eq!(StorageError::InvalidContent.kind(), ErrorKind::InvalidContent);
        assert_eq!(StorageError::not_found("T1", 4).kind(), ErrorKind::NotFound);
        assert_eq!(
            StorageError::Unavailable("lock poisoned".to_string()).kind(),
            ErrorKind::StoreUnavailable
        );
        assert_eq!(
            StorageError::Serialization("bad timestamp".to_string()).kind(),
            ErrorKind::StoreUnavailable
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = StorageError::not_found("T1", 4);
        assert_eq!(err.to_string(), "Task 4 not found in workspace T1");
    }
}
