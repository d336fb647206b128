//! QR codes for share links.

use std::path::{Path, PathBuf};

use anyhow::Context;
use qrcode::render::svg;
use qrcode::types::Color as QrModuleColor;
use qrcode::QrCode;

/// Modules of blank margin around the code.
const QUIET_ZONE: usize = 2;
const SVG_MIN_SIZE: u32 = 200;

/// Render `data` with Unicode half blocks, two modules per character row.
///
/// With `ink_on_light` the dark modules are drawn, which suits a light terminal
/// background. Otherwise the light modules are drawn so the code still scans on
/// a dark background.
pub fn render_terminal(data: &str, ink_on_light: bool) -> anyhow::Result<String> {
    let qr = QrCode::new(data.as_bytes()).context("Unable to generate QR")?;
    let colors = qr.to_colors();
    let side = qr.width();
    let full = side + QUIET_ZONE * 2;

    let inked = |x: usize, y: usize| -> bool {
        let dark = x >= QUIET_ZONE
            && y >= QUIET_ZONE
            && x < side + QUIET_ZONE
            && y < side + QUIET_ZONE
            && colors[(y - QUIET_ZONE) * side + (x - QUIET_ZONE)] == QrModuleColor::Dark;
        dark == ink_on_light
    };

    let mut out = String::with_capacity(full * (full / 2 + 1) * 3);
    for y in (0..full).step_by(2) {
        for x in 0..full {
            let top = inked(x, y);
            let bottom = y + 1 < full && inked(x, y + 1);
            out.push(match (top, bottom) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }
    Ok(out)
}

pub fn render_svg(data: &str) -> anyhow::Result<String> {
    let qr = QrCode::new(data.as_bytes()).context("Unable to generate QR")?;
    Ok(qr
        .render::<svg::Color>()
        .min_dimensions(SVG_MIN_SIZE, SVG_MIN_SIZE)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

pub fn qr_file_name(file_id: &str) -> String {
    format!("qr-code-{}.svg", file_id)
}

/// Write the SVG rendering of `data` into `dir` as `qr-code-{id}.svg`.
pub fn save_svg(dir: &Path, file_id: &str, data: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(qr_file_name(file_id));
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    std::fs::write(&path, render_svg(data)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "QR code saved");
    Ok(path)
}
