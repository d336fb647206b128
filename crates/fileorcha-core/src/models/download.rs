use bytes::Bytes;

use super::upload::FileId;

/// Identifier plus optional password for one download or preview request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadQuery {
    pub id: FileId,
    pub password: Option<String>,
}

impl DownloadQuery {
    pub fn new(id: FileId, password: Option<String>) -> Self {
        Self {
            id,
            password: password.filter(|p| !p.is_empty()),
        }
    }
}

/// File bytes and the name the server suggested for saving them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub bytes: Bytes,
    pub filename: String,
}
