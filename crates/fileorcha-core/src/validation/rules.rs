//! Client-side checks run before any upload leaves the machine.

use crate::format::{format_file_size, normalize_mime_type};
use crate::models::FileSource;

pub const MIN_DOWNLOADS: i64 = 1;
pub const MAX_DOWNLOADS: i64 = 10;
pub const MIN_EXPIRY_MINUTES: i64 = 1;
/// Seven days.
pub const MAX_EXPIRY_MINUTES: i64 = 10_080;
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("File size must be less than {}", size_limit_label(*limit))]
    FileTooLarge { size: u64, limit: u64 },

    #[error("File type '{0}' is not allowed")]
    FileTypeNotAllowed(String),

    #[error("Custom link must contain only lowercase letters, numbers, and hyphens")]
    InvalidSlugCharacters,

    #[error("Downloads must be between 1 and 10")]
    DownloadsOutOfRange(i64),

    #[error("Expiry time must be between 1 minute and 7 days")]
    ExpiryOutOfRange(i64),

    #[error("Please enter a file ID")]
    MissingFileId,
}

/// Whole mebibyte limits read `50MB`; anything else falls back to the
/// human-readable size.
fn size_limit_label(limit: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if limit >= MIB && limit % MIB == 0 {
        format!("{}MB", limit / MIB)
    } else {
        format_file_size(limit)
    }
}

/// Size and type constraints for files accepted by the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    pub max_file_size_bytes: u64,
    /// Normalized MIME types; empty means any type is accepted.
    pub allowed_content_types: Vec<String>,
    pub expiry_enabled: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_content_types: Vec::new(),
            expiry_enabled: true,
        }
    }
}

impl ValidationRules {
    /// Check a candidate file. Size is checked before type, so an oversized file
    /// always reports `FileTooLarge`.
    pub fn validate_file(&self, file: Option<&FileSource>) -> Result<(), ValidationError> {
        let file = file.ok_or(ValidationError::NoFileSelected)?;
        let size = file.size();

        if size > self.max_file_size_bytes {
            return Err(ValidationError::FileTooLarge {
                size,
                limit: self.max_file_size_bytes,
            });
        }

        if !self.allowed_content_types.is_empty() {
            let mime = normalize_mime_type(&file.content_type);
            if !self
                .allowed_content_types
                .iter()
                .any(|allowed| normalize_mime_type(allowed) == mime)
            {
                return Err(ValidationError::FileTypeNotAllowed(mime));
            }
        }

        Ok(())
    }

    /// Expiry is only checked when the deployment supports it.
    pub fn validate_expiry(&self, minutes: i64) -> Result<(), ValidationError> {
        if self.expiry_enabled {
            validate_expiry(minutes)
        } else {
            Ok(())
        }
    }
}

/// Accepts lowercase ASCII letters, digits and hyphens. An empty slug is valid.
pub fn validate_slug(candidate: &str) -> Result<(), ValidationError> {
    if candidate
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        Ok(())
    } else {
        Err(ValidationError::InvalidSlugCharacters)
    }
}

/// Lowercase the input and drop every character `validate_slug` would reject.
pub fn normalize_slug(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

pub fn validate_downloads(downloads: i64) -> Result<(), ValidationError> {
    if (MIN_DOWNLOADS..=MAX_DOWNLOADS).contains(&downloads) {
        Ok(())
    } else {
        Err(ValidationError::DownloadsOutOfRange(downloads))
    }
}

pub fn validate_expiry(minutes: i64) -> Result<(), ValidationError> {
    if (MIN_EXPIRY_MINUTES..=MAX_EXPIRY_MINUTES).contains(&minutes) {
        Ok(())
    } else {
        Err(ValidationError::ExpiryOutOfRange(minutes))
    }
}
