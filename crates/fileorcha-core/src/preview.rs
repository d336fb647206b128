//! Preview classification and rendering.
//!
//! A single classification function picks the variant; each variant carries the
//! data its presenter needs. Rendering never fails: content the renderer cannot
//! interpret degrades to a literal text block or an "unsupported" placeholder.

use bytes::Bytes;

use crate::format::{classify_file, escape_text, FileCategory};

/// Default number of characters shown for a text preview.
pub const DEFAULT_TEXT_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Image,
    Video,
    Audio,
    Pdf,
    Text,
    Json,
    Unsupported,
}

/// Bytes of a media preview together with the declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub bytes: Bytes,
    pub content_type: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Image(MediaPayload),
    Video(MediaPayload),
    Audio(MediaPayload),
    Pdf(MediaPayload),
    Text { content: String, truncated: bool },
    Json { pretty: String },
    Unsupported { file_name: String },
}

impl Preview {
    pub fn kind(&self) -> PreviewKind {
        match self {
            Preview::Image(_) => PreviewKind::Image,
            Preview::Video(_) => PreviewKind::Video,
            Preview::Audio(_) => PreviewKind::Audio,
            Preview::Pdf(_) => PreviewKind::Pdf,
            Preview::Text { .. } => PreviewKind::Text,
            Preview::Json { .. } => PreviewKind::Json,
            Preview::Unsupported { .. } => PreviewKind::Unsupported,
        }
    }

    /// Media variants are shown through a transient handle that must be released.
    pub fn media(&self) -> Option<&MediaPayload> {
        match self {
            Preview::Image(m) | Preview::Video(m) | Preview::Audio(m) | Preview::Pdf(m) => Some(m),
            _ => None,
        }
    }
}

/// Pick the preview variant for a declared content type and file name.
pub fn classify(content_type: &str, file_name: &str) -> PreviewKind {
    match classify_file(content_type, file_name) {
        FileCategory::Image => PreviewKind::Image,
        FileCategory::Video => PreviewKind::Video,
        FileCategory::Audio => PreviewKind::Audio,
        FileCategory::Pdf => PreviewKind::Pdf,
        FileCategory::Json => PreviewKind::Json,
        FileCategory::Text | FileCategory::Code => PreviewKind::Text,
        FileCategory::Other => PreviewKind::Unsupported,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PreviewRenderer {
    text_limit: usize,
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_PREVIEW_CHARS)
    }
}

impl PreviewRenderer {
    pub fn new(text_limit: usize) -> Self {
        Self { text_limit }
    }

    pub fn render(&self, bytes: Bytes, content_type: &str, file_name: &str) -> Preview {
        let media = |bytes: Bytes| MediaPayload {
            bytes,
            content_type: content_type.to_string(),
            file_name: file_name.to_string(),
        };

        match classify(content_type, file_name) {
            PreviewKind::Image => Preview::Image(media(bytes)),
            PreviewKind::Video => Preview::Video(media(bytes)),
            PreviewKind::Audio => Preview::Audio(media(bytes)),
            PreviewKind::Pdf => Preview::Pdf(media(bytes)),
            PreviewKind::Json => render_json(&bytes),
            PreviewKind::Text => self.render_text(&bytes),
            PreviewKind::Unsupported => Preview::Unsupported {
                file_name: file_name.to_string(),
            },
        }
    }

    fn render_text(&self, bytes: &[u8]) -> Preview {
        let text = escape_text(&String::from_utf8_lossy(bytes));
        match text.char_indices().nth(self.text_limit) {
            Some((cut, _)) => Preview::Text {
                content: format!("{}...", &text[..cut]),
                truncated: true,
            },
            None => Preview::Text {
                content: text,
                truncated: false,
            },
        }
    }
}

/// Pretty-print with two-space indentation, or fall back to the literal text.
fn render_json(bytes: &[u8]) -> Preview {
    let pretty = serde_json::from_slice::<serde_json::Value>(bytes)
        .and_then(|value| serde_json::to_string_pretty(&value));

    match pretty {
        Ok(pretty) => Preview::Json { pretty },
        Err(err) => {
            tracing::debug!(error = %err, "JSON preview failed to parse, showing raw text");
            Preview::Text {
                content: escape_text(&String::from_utf8_lossy(bytes)),
                truncated: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(bytes: &'static [u8], content_type: &str, name: &str) -> Preview {
        PreviewRenderer::default().render(Bytes::from_static(bytes), content_type, name)
    }

    #[test]
    fn classification() {
        assert_eq!(classify("image/png", "photo.png"), PreviewKind::Image);
        assert_eq!(classify("video/webm", "x"), PreviewKind::Video);
        assert_eq!(classify("audio/ogg", "x"), PreviewKind::Audio);
        assert_eq!(classify("application/octet-stream", "a.pdf"), PreviewKind::Pdf);
        assert_eq!(classify("application/json", "x"), PreviewKind::Json);
        assert_eq!(classify("", "notes.md"), PreviewKind::Text);
        assert_eq!(classify("", "main.py"), PreviewKind::Text);
        assert_eq!(classify("application/zip", "a.zip"), PreviewKind::Unsupported);
    }

    #[test]
    fn media_variants_carry_bytes_and_type() {
        let preview = render(b"\x89PNG", "image/png", "photo.png");
        assert_eq!(preview.kind(), PreviewKind::Image);
        let media = preview.media().unwrap();
        assert_eq!(media.bytes.as_ref(), b"\x89PNG");
        assert_eq!(media.content_type, "image/png");
        assert_eq!(media.file_name, "photo.png");
    }

    #[test]
    fn valid_json_is_pretty_printed_with_two_spaces() {
        let raw: &'static [u8] = br#"{"b":[1,2],"a":{"c":null}}"#;
        let expected = serde_json::to_string_pretty(
            &serde_json::from_slice::<serde_json::Value>(raw).unwrap(),
        )
        .unwrap();
        assert_eq!(
            render(raw, "application/json", "data.json"),
            Preview::Json {
                pretty: expected.clone()
            }
        );
        assert!(expected.contains("\n  \""));
    }

    #[test]
    fn invalid_json_falls_back_to_escaped_text() {
        assert_eq!(
            render(b"{not json\x1b", "application/octet-stream", "broken.json"),
            Preview::Text {
                content: "{not json\\u{1b}".to_string(),
                truncated: false,
            }
        );
    }

    #[test]
    fn long_text_is_truncated() {
        let renderer = PreviewRenderer::new(5);
        let preview = renderer.render(Bytes::from_static(b"hello world"), "text/plain", "a.txt");
        assert_eq!(
            preview,
            Preview::Text {
                content: "hello...".to_string(),
                truncated: true
            }
        );

        let short = renderer.render(Bytes::from_static(b"hey"), "text/plain", "a.txt");
        assert_eq!(
            short,
            Preview::Text {
                content: "hey".to_string(),
                truncated: false
            }
        );
    }

    #[test]
    fn unknown_types_name_the_file() {
        assert_eq!(
            render(b"PK", "application/zip", "bundle.zip"),
            Preview::Unsupported {
                file_name: "bundle.zip".to_string()
            }
        );
    }
}
