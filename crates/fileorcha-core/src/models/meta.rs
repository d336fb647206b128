use serde::{Deserialize, Serialize};

/// Share-card metadata served by `GET /meta/{id}`.
///
/// For missing or exhausted files the server still answers 200 with a
/// placeholder card, in which case the file fields are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub file_size: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub downloads_left: u32,
    #[serde(default)]
    pub expires_at: String,
}

impl FileMeta {
    /// Whether the card describes a file that can still be downloaded.
    pub fn is_available(&self) -> bool {
        self.downloads_left > 0 && !self.file_size.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_card_is_unavailable() {
        let json = r#"{"title":"File Not Found - FileOrcha","description":"gone","image":"x","url":"u","type":"website","site_name":"FileOrcha","file_size":"","file_type":"","downloads_left":0,"expires_at":""}"#;
        let meta: FileMeta = serde_json::from_str(json).unwrap();
        assert!(!meta.is_available());
    }

    #[test]
    fn live_card_is_available() {
        let json = r#"{"title":"a.txt - FileOrcha","description":"d","file_size":"1.0 KB","file_type":"Text File","downloads_left":2,"expires_at":"2026-01-01 00:00:00 UTC"}"#;
        let meta: FileMeta = serde_json::from_str(json).unwrap();
        assert!(meta.is_available());
        assert_eq!(meta.file_type, "Text File");
    }
}
