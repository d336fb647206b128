//! Error types module
//!
//! Errors are split by where they originate: `ValidationError` blocks a submission
//! before any network call, `TransferError` describes what the server or the
//! transport said, and `ClientError` unifies both with local failures so the
//! controller can surface every one of them the same way.

use std::io;

use crate::validation::ValidationError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for server-side refusals the user can act on
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Human-readable message shown in notifications
    fn user_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Outcome of a failed upload, download or preview request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {status} - {body}")]
    Server { status: u16, body: String },

    #[error("File not found or expired")]
    NotFound,

    #[error("Wrong password")]
    WrongPassword,

    #[error("No downloads left")]
    NoDownloadsLeft,

    #[error("Request failed with status {0}")]
    Other(u16),

    #[error("Failed to extract file ID from response: {0}")]
    MissingIdentifier(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl TransferError {
    /// Map a non-success status of a download, preview or meta request.
    pub fn from_retrieval_status(status: u16) -> Self {
        match status {
            404 => TransferError::NotFound,
            403 => TransferError::WrongPassword,
            410 => TransferError::NoDownloadsLeft,
            other => TransferError::Other(other),
        }
    }
}

impl ErrorMetadata for TransferError {
    fn error_code(&self) -> &'static str {
        match self {
            TransferError::Network(_) => "NETWORK_ERROR",
            TransferError::Server { .. } => "SERVER_ERROR",
            TransferError::NotFound => "NOT_FOUND",
            TransferError::WrongPassword => "WRONG_PASSWORD",
            TransferError::NoDownloadsLeft => "NO_DOWNLOADS_LEFT",
            TransferError::Other(_) => "REQUEST_FAILED",
            TransferError::MissingIdentifier(_) => "MISSING_IDENTIFIER",
            TransferError::InvalidResponse(_) => "INVALID_RESPONSE",
        }
    }

    fn user_message(&self) -> String {
        match self {
            TransferError::Network(_) => "Network error - check if server is running".to_string(),
            TransferError::MissingIdentifier(_) => {
                "Failed to extract file ID from response".to_string()
            }
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            TransferError::NotFound
            | TransferError::WrongPassword
            | TransferError::NoDownloadsLeft => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("Preview error: {0}")]
    PreviewRender(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ErrorMetadata for ClientError {
    fn error_code(&self) -> &'static str {
        match self {
            ClientError::Validation(_) => "VALIDATION_ERROR",
            ClientError::Transfer(err) => err.error_code(),
            ClientError::PreviewRender(_) => "PREVIEW_ERROR",
            ClientError::Io(_) => "IO_ERROR",
            ClientError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn user_message(&self) -> String {
        match self {
            ClientError::Validation(err) => err.to_string(),
            ClientError::Transfer(err) => err.user_message(),
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ClientError::Validation(_) => LogLevel::Debug,
            ClientError::Transfer(err) => err.log_level(),
            ClientError::PreviewRender(_) => LogLevel::Warn,
            ClientError::Io(_) | ClientError::Internal(_) => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_status_mapping_is_exact() {
        assert_eq!(TransferError::from_retrieval_status(404), TransferError::NotFound);
        assert_eq!(
            TransferError::from_retrieval_status(403),
            TransferError::WrongPassword
        );
        assert_eq!(
            TransferError::from_retrieval_status(410),
            TransferError::NoDownloadsLeft
        );
        assert_eq!(
            TransferError::from_retrieval_status(500),
            TransferError::Other(500)
        );
    }

    #[test]
    fn no_downloads_left_message() {
        let err = ClientError::from(TransferError::NoDownloadsLeft);
        assert_eq!(err.user_message(), "No downloads left");
        assert_eq!(err.error_code(), "NO_DOWNLOADS_LEFT");
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn validation_errors_log_at_debug() {
        let err = ClientError::from(ValidationError::NoFileSelected);
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert_eq!(err.user_message(), "No file selected");
    }
}
