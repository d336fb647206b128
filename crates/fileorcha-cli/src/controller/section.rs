use std::fmt;

/// The visible page section. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Upload,
    Success,
    Download,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Upload => "upload",
            Section::Success => "success",
            Section::Download => "download",
        };
        f.write_str(name)
    }
}

/// Enabled state of the controls that trigger a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub upload_enabled: bool,
    pub download_enabled: bool,
    pub preview_enabled: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            upload_enabled: true,
            download_enabled: true,
            preview_enabled: true,
        }
    }
}

/// Keyboard shortcuts. Each one is equivalent to the matching button action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accelerator {
    UploadMode,
    DownloadMode,
    Escape,
}

impl Accelerator {
    /// Accepts `ctrl-u`, `ctrl+u`, `cmd-u`, `^u` and the `d` equivalents, plus `esc`/`escape`.
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_lowercase().replace('+', "-");
        match normalized.as_str() {
            "ctrl-u" | "cmd-u" | "^u" => Some(Accelerator::UploadMode),
            "ctrl-d" | "cmd-d" | "^d" => Some(Accelerator::DownloadMode),
            "esc" | "escape" => Some(Accelerator::Escape),
            _ => None,
        }
    }
}
