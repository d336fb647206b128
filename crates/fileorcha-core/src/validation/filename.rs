use std::path::Path;

const MAX_FILENAME_LENGTH: usize = 255;

/// Make a server-supplied filename safe to write into a local directory.
///
/// Path components are dropped, control characters removed, leading and trailing
/// dots and spaces trimmed, and the result capped at 255 bytes on a character
/// boundary. An empty result becomes `file`.
pub fn sanitize_filename(filename: &str) -> String {
    // Treat both separators as path separators regardless of platform.
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let base = Path::new(last)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(last);

    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();

    let mut end = 0;
    for (idx, c) in cleaned.char_indices() {
        if idx + c.len_utf8() > MAX_FILENAME_LENGTH {
            break;
        }
        end = idx + c.len_utf8();
    }

    let trimmed = cleaned[..end].trim().trim_matches('.').trim();
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}
