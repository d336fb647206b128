//! Parsing of upload response bodies and download/preview headers.

use bytes::Bytes;
use fileorcha_core::{FileId, PreviewMetadata, TransferError};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::Deserialize;

pub const DEFAULT_DOWNLOAD_NAME: &str = "download";
const FILE_PATH_MARKER: &str = "/file/";

/// Find the identifier in an upload response such as
/// `File uploaded--Download:/file/{id}`.
///
/// The token runs until whitespace or a URL delimiter; its characters are not
/// otherwise constrained.
pub fn extract_file_id(body: &str) -> Option<FileId> {
    let start = body.find(FILE_PATH_MARKER)? + FILE_PATH_MARKER.len();
    let rest = &body[start..];
    let end = rest
        .find(|c: char| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '"' | '\'' | '<'))
        .unwrap_or(rest.len());
    FileId::parse(&rest[..end]).ok()
}

/// Filename from a `Content-Disposition` value.
///
/// Handles `filename*=UTF-8''...` (preferred), quoted and bare `filename=`.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = raw.trim().trim_matches('"');
                let encoded = encoded
                    .split_once("''")
                    .map(|(_, rest)| rest)
                    .unwrap_or(encoded);
                if let Ok(decoded) = urlencoding::decode(encoded) {
                    if !decoded.is_empty() {
                        return Some(decoded.into_owned());
                    }
                }
            }
            "filename" => {
                let name = raw.trim().trim_matches('"');
                if !name.is_empty() {
                    plain = Some(name.to_string());
                }
            }
            _ => {}
        }
    }
    plain
}

pub fn filename_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_disposition)
        .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string())
}

/// JSON summary the server sends instead of bytes for large files.
#[derive(Debug, Deserialize)]
struct LargeFileSummary {
    filename: String,
    filesize: u64,
    mime: String,
    downloadleft: u32,
    #[serde(default)]
    haspassword: bool,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Build preview metadata from the response headers, or from the JSON summary
/// when the server declined to inline the file.
pub fn preview_from_response(
    id: &FileId,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<(Bytes, PreviewMetadata), TransferError> {
    let content_type = header_str(headers, CONTENT_TYPE.as_str())
        .unwrap_or("application/octet-stream")
        .to_string();

    let Some(name) = header_str(headers, "x-file-name") else {
        if content_type.starts_with("application/json") {
            if let Ok(summary) = serde_json::from_slice::<LargeFileSummary>(&body) {
                let metadata = PreviewMetadata {
                    name: summary.filename,
                    content_type: summary.mime,
                    size: summary.filesize,
                    downloads_left: Some(summary.downloadleft),
                    content_included: false,
                    has_password: Some(summary.haspassword),
                };
                return Ok((Bytes::new(), metadata));
            }
        }
        let size = body.len() as u64;
        let metadata = PreviewMetadata {
            name: id.to_string(),
            content_type,
            size,
            downloads_left: None,
            content_included: true,
            has_password: None,
        };
        return Ok((body, metadata));
    };

    let metadata = PreviewMetadata {
        name: name.to_string(),
        size: header_str(headers, "x-file-size")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(body.len() as u64),
        downloads_left: header_str(headers, "x-downloads-left").and_then(|s| s.trim().parse().ok()),
        content_type,
        content_included: true,
        has_password: None,
    };
    Ok((body, metadata))
}
