use serde::Serialize;

/// File details taken from preview response headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewMetadata {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub downloads_left: Option<u32>,
    /// False when the server answered with a JSON summary instead of the bytes
    /// (it does so for files too large to preview inline).
    pub content_included: bool,
    pub has_password: Option<bool>,
}
