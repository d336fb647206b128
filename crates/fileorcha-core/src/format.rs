//! Formatting helpers for sizes, file types and untrusted text.

use std::path::Path;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "log", "csv", "tsv", "ini", "cfg"];

const CODE_EXTENSIONS: &[&str] = &[
    "js", "ts", "py", "go", "rs", "java", "c", "cpp", "h", "hpp", "html", "css", "xml", "sh",
    "sql", "toml", "yaml", "yml",
];

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz"];

const EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "msi", "dmg", "apk"];

/// Broad classification of a file used for previews and icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Pdf,
    Json,
    Text,
    Code,
    Other,
}

impl FileCategory {
    /// Whether the file can be shown as a literal text block.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            FileCategory::Json | FileCategory::Text | FileCategory::Code
        )
    }
}

/// Icon shown next to a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileIcon {
    Image,
    Video,
    Audio,
    Text,
    Pdf,
    Word,
    Excel,
    PowerPoint,
    Archive,
    Code,
    Executable,
    Generic,
}

impl FileIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            FileIcon::Image => "🖼",
            FileIcon::Video => "🎬",
            FileIcon::Audio => "🎵",
            FileIcon::Text => "📝",
            FileIcon::Pdf => "📕",
            FileIcon::Word => "📘",
            FileIcon::Excel => "📗",
            FileIcon::PowerPoint => "📙",
            FileIcon::Archive => "🗜",
            FileIcon::Code => "🧾",
            FileIcon::Executable => "⚙",
            FileIcon::Generic => "📄",
        }
    }
}

/// Human-readable byte size: `0 Bytes`, `1.5 KB`, `2 MB`.
///
/// Values are rounded to two decimals and trailing zeros are dropped.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let rounded = (size * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// `1 minute` / `N minutes`
pub fn format_expiry_minutes(minutes: u32) -> String {
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{} minutes", minutes)
    }
}

/// Strip MIME parameters and lowercase (e.g. "Text/Plain; charset=utf-8" -> "text/plain").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Lowercased extension of a file name, if any.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Best-effort content type for a local file name.
pub fn guess_content_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .to_string()
}

/// Classify a file from its declared content type, falling back to its name.
pub fn classify_file(content_type: &str, file_name: &str) -> FileCategory {
    let mime = normalize_mime_type(content_type);
    let ext = file_extension(file_name).unwrap_or_default();

    if mime.starts_with("image/") {
        FileCategory::Image
    } else if mime.starts_with("video/") {
        FileCategory::Video
    } else if mime.starts_with("audio/") {
        FileCategory::Audio
    } else if mime == "application/pdf" || ext == "pdf" {
        FileCategory::Pdf
    } else if mime == "application/json" || mime.ends_with("+json") || ext == "json" {
        FileCategory::Json
    } else if CODE_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Code
    } else if mime.starts_with("text/") || TEXT_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Text
    } else {
        FileCategory::Other
    }
}

/// Icon for a file, by media type first and then by extension.
pub fn file_icon(content_type: &str, file_name: &str) -> FileIcon {
    let mime = normalize_mime_type(content_type);
    let ext = file_extension(file_name).unwrap_or_default();
    let ext = ext.as_str();

    if mime.starts_with("image/") {
        FileIcon::Image
    } else if mime.starts_with("video/") {
        FileIcon::Video
    } else if mime.starts_with("audio/") {
        FileIcon::Audio
    } else if mime.starts_with("text/") || matches!(ext, "txt" | "md") {
        FileIcon::Text
    } else {
        match ext {
            "pdf" => FileIcon::Pdf,
            "doc" | "docx" => FileIcon::Word,
            "xls" | "xlsx" => FileIcon::Excel,
            "ppt" | "pptx" => FileIcon::PowerPoint,
            e if ARCHIVE_EXTENSIONS.contains(&e) => FileIcon::Archive,
            "json" => FileIcon::Code,
            e if CODE_EXTENSIONS.contains(&e) => FileIcon::Code,
            e if EXECUTABLE_EXTENSIONS.contains(&e) => FileIcon::Executable,
            _ => FileIcon::Generic,
        }
    }
}

/// Display name for a file type ("PDF Document", "Image", "Application Zip").
pub fn file_type_display(content_type: &str, file_name: &str) -> String {
    let ext = file_extension(file_name).unwrap_or_default();
    let known = match ext.as_str() {
        "pdf" => Some("PDF Document"),
        "doc" | "docx" => Some("Word Document"),
        "xls" | "xlsx" => Some("Excel Spreadsheet"),
        "ppt" | "pptx" => Some("PowerPoint Presentation"),
        "txt" => Some("Text File"),
        "md" => Some("Markdown File"),
        "jpg" | "jpeg" | "png" | "gif" | "webp" => Some("Image"),
        "mp4" | "avi" | "mov" | "wmv" => Some("Video"),
        "mp3" | "wav" | "flac" => Some("Audio"),
        "zip" | "rar" | "7z" => Some("Archive"),
        "js" => Some("JavaScript"),
        "ts" => Some("TypeScript"),
        "py" => Some("Python"),
        "go" => Some("Go"),
        "rs" => Some("Rust"),
        "html" => Some("HTML"),
        "css" => Some("CSS"),
        "json" => Some("JSON"),
        _ => None,
    };
    if let Some(name) = known {
        return name.to_string();
    }

    let mime = normalize_mime_type(content_type);
    match mime.split_once('/') {
        Some((kind, sub)) if !kind.is_empty() && !sub.is_empty() => {
            format!("{} {}", title_case(kind), title_case(sub))
        }
        _ => "File".to_string(),
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Neutralize control characters so untrusted text cannot drive the terminal.
///
/// Newlines and tabs are kept; every other control character is replaced by its
/// escaped form (`\u{1b}`).
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_control() && c != '\n' && c != '\t' {
            if c == '\r' {
                continue;
            }
            out.extend(c.escape_unicode());
        } else {
            out.push(c);
        }
    }
    out
}
