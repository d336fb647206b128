//! Text rendering of the controller state.

use chrono::Local;
use console::{style, StyledObject};
use fileorcha_api_client::Transfer;
use fileorcha_core::format::{escape_text, file_icon, file_type_display, format_file_size};
use fileorcha_core::{FileMeta, Preview};

use crate::controller::forms::{DownloadForm, UploadForm};
use crate::controller::notify::{Notification, NotificationKind};
use crate::controller::section::Section;
use crate::controller::{Controller, OpenPreview, SuccessView};
use crate::preferences::Theme;
use crate::truncate_string;

const NAME_WIDTH: usize = 60;

/// Heading style for the active theme.
fn heading<D>(theme: Theme, text: D) -> StyledObject<D> {
    match theme {
        Theme::Light => style(text).bold().blue(),
        Theme::Dark => style(text).bold().cyan(),
    }
}

fn label<D>(text: D) -> StyledObject<D> {
    style(text).dim()
}

/// File names and server metadata are untrusted; escape before truncating.
fn clean(text: &str) -> String {
    truncate_string(&escape_text(text), NAME_WIDTH)
}

pub fn notification_line(notification: &Notification) -> String {
    let marker = match notification.kind {
        NotificationKind::Success => style("✓").green(),
        NotificationKind::Error => style("✗").red(),
        NotificationKind::Warning => style("!").yellow(),
    };
    format!("{} {}", marker, escape_text(&notification.message))
}

/// The active section, followed by the preview surface when it is open.
pub fn screen<T: Transfer + ?Sized>(controller: &Controller<T>) -> String {
    let theme = controller.theme();
    let expiry_enabled = controller.settings().rules.expiry_enabled;
    let mut out = match (controller.section(), controller.success_view()) {
        (Section::Success, Some(view)) => {
            success_view(theme, &view, controller.qr_terminal().as_deref())
        }
        (Section::Download, _) => download_view(theme, controller.download_form()),
        _ => upload_view(theme, controller.upload_form(), expiry_enabled),
    };
    if let Some(open) = controller.preview() {
        out.push('\n');
        out.push_str(&preview_view(theme, open));
    }
    out
}

pub fn upload_view(theme: Theme, form: &UploadForm, expiry_enabled: bool) -> String {
    let mut out = format!("{}\n", heading(theme, "Upload a file"));

    match &form.file {
        Some(file) => out.push_str(&format!(
            "  {} {}  {}\n",
            file_icon(&file.content_type, &file.name).glyph(),
            clean(&file.name),
            label(format!(
                "{} · {}",
                format_file_size(file.size()),
                escape_text(&file_type_display(&file.content_type, &file.name))
            )),
        )),
        None => out.push_str(&format!("  {}\n", label("No file selected (file <path>)"))),
    }

    out.push_str(&format!("  {} {}\n", label("Downloads:"), form.downloads));
    if expiry_enabled {
        out.push_str(&format!("  {} {} min\n", label("Expiry:"), form.expiry_minutes));
    }
    out.push_str(&format!(
        "  {} {}\n",
        label("Password:"),
        if form.password.is_empty() { "none" } else { "set" }
    ));
    if !form.slug.is_empty() {
        out.push_str(&format!("  {} {}\n", label("Custom link:"), form.slug));
    }
    out
}

pub fn success_view(theme: Theme, view: &SuccessView, qr: Option<&str>) -> String {
    let mut out = format!("{}\n", heading(theme, "File uploaded"));
    out.push_str(&format!(
        "  {} {}\n",
        label("File:"),
        clean(&view.file_name)
    ));
    out.push_str(&format!("  {} {}\n", label("Size:"), view.size));
    out.push_str(&format!("  {} {}\n", label("Downloads left:"), view.downloads_left));
    if let Some(expiry) = &view.expiry {
        out.push_str(&format!("  {} {}\n", label("Expires after:"), expiry));
    }
    if let Some(countdown) = view.countdown {
        let text = countdown.to_string();
        let styled = if countdown.is_expired() {
            style(text).red()
        } else {
            style(text).yellow()
        };
        out.push_str(&format!("  {} {}\n", label("Time left:"), styled));
    }
    out.push_str(&format!(
        "  {} {}\n",
        label("Uploaded:"),
        view.uploaded_at.with_timezone(&Local).format("%I:%M %p")
    ));
    out.push_str(&format!("  {} {}\n", label("Share link:"), style(&view.share_url).underlined()));
    out.push_str(&format!("  {} {}\n", label("File ID:"), view.file_id));
    if let Some(qr) = qr {
        out.push('\n');
        out.push_str(qr);
    }
    out
}

pub fn download_view(theme: Theme, form: &DownloadForm) -> String {
    let mut out = format!("{}\n", heading(theme, "Download a file"));
    let id = if form.file_id.is_empty() {
        label("(id <file-id>)").to_string()
    } else {
        form.file_id.clone()
    };
    out.push_str(&format!("  {} {}\n", label("File ID:"), id));
    out.push_str(&format!(
        "  {} {}\n",
        label("Password:"),
        if form.password.is_empty() { "none" } else { "set" }
    ));
    out
}

pub fn preview_view(theme: Theme, open: &OpenPreview) -> String {
    let meta = &open.metadata;
    let mut out = format!(
        "{} {} {}\n",
        heading(theme, "Preview"),
        file_icon(&meta.content_type, &meta.name).glyph(),
        clean(&meta.name)
    );
    out.push_str(&format!(
        "  {}\n",
        label(format!(
            "{} · {}",
            format_file_size(meta.size),
            escape_text(&file_type_display(&meta.content_type, &meta.name))
        ))
    ));
    if let Some(left) = meta.downloads_left {
        out.push_str(&format!("  {} {}\n", label("Downloads left:"), left));
    }
    out.push('\n');

    match &open.preview {
        Preview::Text { content, truncated } => {
            out.push_str(content);
            out.push('\n');
            if *truncated {
                out.push_str(&format!("{}\n", label("(preview truncated)")));
            }
        }
        Preview::Json { pretty } => {
            out.push_str(pretty);
            out.push('\n');
        }
        Preview::Image(_) | Preview::Video(_) | Preview::Audio(_) | Preview::Pdf(_) => {
            match &open.media {
                Some(handle) => out.push_str(&format!(
                    "  {:?} preview written to {}\n",
                    open.preview.kind(),
                    handle.path().display()
                )),
                None => out.push_str("  Preview unavailable\n"),
            }
        }
        Preview::Unsupported { file_name } => {
            out.push_str(&format!(
                "  Preview not available for {}. Download the file to view it.\n",
                clean(file_name)
            ));
        }
    }
    out.push_str(&format!("{}\n", label("(close or esc to close)")));
    out
}

/// Summary card from `GET /meta/{id}`.
pub fn meta_view(theme: Theme, meta: &FileMeta) -> String {
    let mut out = format!("{}\n", heading(theme, clean(&meta.title)));
    out.push_str(&format!("  {}\n", escape_text(&meta.description)));
    out.push_str(&format!("  {} {}\n", label("Size:"), escape_text(&meta.file_size)));
    out.push_str(&format!("  {} {}\n", label("Type:"), escape_text(&meta.file_type)));
    out.push_str(&format!("  {} {}\n", label("Downloads left:"), meta.downloads_left));
    out.push_str(&format!("  {} {}\n", label("Expires:"), escape_text(&meta.expires_at)));
    if !meta.is_available() {
        out.push_str(&format!("  {}\n", style("No longer available").red()));
    }
    out
}
