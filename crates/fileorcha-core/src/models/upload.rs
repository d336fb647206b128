use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Server-assigned identifier of an uploaded file.
///
/// The format differs between server versions (hex, or lowercase words with
/// hyphens), so the token is kept opaque: only surrounding whitespace is removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingFileId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FileSource {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Everything sent in one `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: FileSource,
    pub downloads: u32,
    pub expiry_minutes: Option<u32>,
    pub password: Option<String>,
    pub slug: Option<String>,
}

impl UploadRequest {
    pub fn new(file: FileSource, downloads: u32) -> Self {
        Self {
            file,
            downloads,
            expiry_minutes: None,
            password: None,
            slug: None,
        }
    }

    pub fn with_expiry(mut self, minutes: u32) -> Self {
        self.expiry_minutes = Some(minutes);
        self
    }

    /// An empty password means no password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        self.password = (!password.is_empty()).then_some(password);
        self
    }

    /// A blank slug means the server picks the identifier.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        let slug = slug.into().trim().to_string();
        self.slug = (!slug.is_empty()).then_some(slug);
        self
    }
}

/// A successful upload as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub id: FileId,
    /// Echo of the password that was sent, never read back from the server.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub file_name: String,
    pub size: u64,
    pub downloads: u32,
    pub expiry_minutes: Option<u32>,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadResult {
    pub fn from_request(id: FileId, request: &UploadRequest, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            password: request.password.clone(),
            file_name: request.file.name.clone(),
            size: request.file.size(),
            downloads: request.downloads,
            expiry_minutes: request.expiry_minutes,
            uploaded_at,
        }
    }

    /// Instant the server will drop the file, when the upload had an expiry.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry_minutes
            .map(|m| self.uploaded_at + chrono::Duration::minutes(i64::from(m)))
    }
}
