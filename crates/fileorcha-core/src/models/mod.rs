//! Data models for the client
//!
//! Requests are built once and handed to the transfer layer by reference;
//! results carry only what the server returned plus what the client sent.

mod download;
mod meta;
mod preview_metadata;
mod upload;

pub use download::{DownloadQuery, DownloadedFile};
pub use meta::FileMeta;
pub use preview_metadata::PreviewMetadata;
pub use upload::{FileId, FileSource, UploadRequest, UploadResult};
