//! Error types for syncat

use thiserror::Error;

/// Error types for syncat operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog query or write rejected by the persistence layer
    #[error("Catalog error: {0}")]
    Catalog(#[from] rusqlite::Error),

    /// Channel setup or transport failure to the remote host
    #[error("Connection error: {0}")]
    Connection(String),

    /// Malformed reply from the remote agent
    #[error("Decode error: {0}")]
    Decode(String),

    /// Transfer did not complete after all attempts
    #[error("Copy failed after {attempts} attempt(s): {path}")]
    CopyFailure { path: String, attempts: u32 },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (logic checks)
    #[error("Validation error: {0}")]
    Validation(String),
}

impl SyncError {
    /// Check if this error came from the remote channel itself
    pub fn is_connection_error(&self) -> bool {
        matches!(self, SyncError::Connection(_))
    }

    /// Check if a failed transfer may succeed after reconnecting
    pub fn is_retryable_transfer(&self) -> bool {
        self.is_connection_error()
    }

    /// Check if this error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, SyncError::Validation(_) | SyncError::Config(_))
    }

    /// Short label used to group errors in run summaries
    pub fn kind_label(&self) -> &'static str {
        match self {
            SyncError::Io(_) => "I/O error",
            SyncError::Catalog(_) => "Catalog error",
            SyncError::Connection(_) => "Connection error",
            SyncError::Decode(_) => "Decode error",
            SyncError::CopyFailure { .. } => "Copy failure",
            SyncError::Config(_) => "Configuration error",
            SyncError::Validation(_) => "Validation error",
        }
    }
}
