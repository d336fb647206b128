//! Transient files backing media previews.
//!
//! Image, video, audio and PDF previews are written to a temporary file so an
//! external viewer can open them. Each file lives only while its handle is
//! registered; revoking the handle deletes the file.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fileorcha_core::format::file_extension;
use fileorcha_core::MediaPayload;
use tempfile::NamedTempFile;

const TEMP_PREFIX: &str = "fileorcha-preview-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    id: u64,
    path: PathBuf,
}

impl MediaHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Default)]
pub struct MediaRegistry {
    dir: Option<PathBuf>,
    next_id: u64,
    live: HashMap<u64, NamedTempFile>,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place files under `dir` instead of the system temp directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn materialize(&mut self, payload: &MediaPayload) -> io::Result<MediaHandle> {
        let suffix = file_extension(&payload.file_name)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(&suffix);
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(&payload.bytes)?;
        file.flush()?;

        self.next_id += 1;
        let handle = MediaHandle {
            id: self.next_id,
            path: file.path().to_path_buf(),
        };
        tracing::debug!(
            id = handle.id,
            path = %handle.path.display(),
            bytes = payload.bytes.len(),
            "Media handle created"
        );
        self.live.insert(handle.id, file);
        Ok(handle)
    }

    /// Delete the backing file. Revoking twice is a no-op.
    pub fn revoke(&mut self, handle: &MediaHandle) {
        if let Some(file) = self.live.remove(&handle.id) {
            if let Err(e) = file.close() {
                tracing::warn!(error = %e, path = %handle.path.display(), "Failed to remove preview file");
            } else {
                tracing::debug!(id = handle.id, "Media handle revoked");
            }
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
