//! FileOrcha terminal client.
//!
//! The [`controller`] owns all UI state (active section, session, countdown,
//! preview surface, notifications) and sequences validation, transfers and
//! rendering. `main.rs` drives it from one-shot subcommands or the interactive
//! [`shell`].

pub mod controller;
pub mod media;
pub mod preferences;
pub mod qr;
pub mod render;
pub mod shell;

pub use controller::{Controller, ControllerSettings};

/// Truncate a string to `max_len` characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so they never mix with
/// rendered views on stdout.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("photo.png", 20), "photo.png");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(
            truncate_string("a-very-long-file-name.tar.gz", 12),
            "a-very-lo..."
        );
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_multibyte() {
        assert_eq!(truncate_string("ééééé.txt", 6), "ééé...");
    }
}
