//! FileOrcha Core Library
//!
//! This crate provides the domain models, error types, configuration, validation
//! and preview classification shared by the API client and the terminal front end.

pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod preview;
pub mod validation;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, ErrorMetadata, LogLevel, TransferError};
pub use models::{
    DownloadQuery, DownloadedFile, FileId, FileMeta, FileSource, PreviewMetadata, UploadRequest,
    UploadResult,
};
pub use preview::{MediaPayload, Preview, PreviewKind, PreviewRenderer};
pub use validation::{ValidationError, ValidationRules};
