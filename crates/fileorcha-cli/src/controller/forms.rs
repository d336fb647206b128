//! Form state for the upload and download sections.

use fileorcha_core::validation::{validate_downloads, validate_slug};
use fileorcha_core::{
    DownloadQuery, FileId, FileSource, UploadRequest, ValidationError, ValidationRules,
};

pub const DEFAULT_DOWNLOADS: i64 = 1;
pub const DEFAULT_EXPIRY_MINUTES: i64 = 5;

/// Raw upload inputs. Numbers are kept signed so out-of-range entries can be
/// held and reported instead of being rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    pub file: Option<FileSource>,
    pub downloads: i64,
    pub expiry_minutes: i64,
    pub password: String,
    pub slug: String,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            file: None,
            downloads: DEFAULT_DOWNLOADS,
            expiry_minutes: DEFAULT_EXPIRY_MINUTES,
            password: String::new(),
            slug: String::new(),
        }
    }
}

impl UploadForm {
    pub fn with_file(mut self, file: FileSource) -> Self {
        self.file = Some(file);
        self
    }

    /// Validate every field and build the immutable request.
    pub fn to_request(&self, rules: &ValidationRules) -> Result<UploadRequest, ValidationError> {
        rules.validate_file(self.file.as_ref())?;
        let file = self.file.clone().ok_or(ValidationError::NoFileSelected)?;

        validate_downloads(self.downloads)?;
        let slug = self.slug.trim();
        validate_slug(slug)?;

        // validate_downloads bounds the value to 1..=10
        let mut request = UploadRequest::new(file, self.downloads as u32);
        if rules.expiry_enabled {
            rules.validate_expiry(self.expiry_minutes)?;
            request = request.with_expiry(self.expiry_minutes as u32);
        }
        Ok(request
            .with_password(self.password.clone())
            .with_slug(slug))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadForm {
    pub file_id: String,
    pub password: String,
}

impl DownloadForm {
    pub fn new(file_id: impl Into<String>, password: Option<String>) -> Self {
        Self {
            file_id: file_id.into(),
            password: password.unwrap_or_default(),
        }
    }

    pub fn to_query(&self) -> Result<DownloadQuery, ValidationError> {
        let id = FileId::parse(&self.file_id)?;
        Ok(DownloadQuery::new(id, Some(self.password.clone())))
    }
}
