//! Grade distribution bar charts: drawn as SVG, delivered as PNG

use anyhow::{Context, Result};
use resvg::{tiny_skia, usvg};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::GradeCounts;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;
const Y_TICKS: u64 = 5;
const BAR_COLOR: &str = "#87ceeb"; // skyblue

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Slugify a snapshot key for use as a file name
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Chart file for one record.
///
/// The slug keeps names readable; the digest of the exact key keeps keys
/// that slug alike ("O'BRIEN" / "O BRIEN") in separate files.
pub fn chart_path(chart_dir: &Path, record_key: &str) -> PathBuf {
    let digest = hex::encode(Sha256::digest(record_key.as_bytes()));
    chart_dir.join(format!("{}-{}.png", slugify(record_key), &digest[..12]))
}

/// Smallest "nice" step (1, 2 or 5 times a power of ten) covering `max`
fn tick_step(max: u64) -> u64 {
    let raw = (max.max(1) as f64 / Y_TICKS as f64).ceil() as u64;
    let mut magnitude: u64 = 1;
    loop {
        for factor in [1, 2, 5] {
            match magnitude.checked_mul(factor) {
                Some(step) if step >= raw => return step,
                Some(_) => {}
                None => return u64::MAX,
            }
        }
        magnitude = match magnitude.checked_mul(10) {
            Some(m) => m,
            None => return u64::MAX,
        };
    }
}

/// Render counts as an SVG document, one bar per grade label in display order
pub fn render_svg(counts: &GradeCounts, title: &str) -> String {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_h;

    let max = counts.iter().map(|(_, n)| n).max().unwrap_or(0);
    let step = tick_step(max);
    let y_max = step.saturating_mul(Y_TICKS).max(max) as f64;
    let scale = |n: u64| n as f64 / y_max * plot_h;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = WIDTH,
        h = HEIGHT
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" fill="white"/>"#,
        WIDTH, HEIGHT
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" font-size="20" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        MARGIN_TOP / 2.0 + 6.0,
        xml_escape(title)
    ));
    svg.push('\n');

    // Grid and y-axis labels
    for i in 0..=Y_TICKS {
        let value = i.saturating_mul(step);
        let y = baseline - scale(value);
        svg.push_str(&format!(
            r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#dddddd"/>"##,
            MARGIN_LEFT,
            y,
            MARGIN_LEFT + plot_w,
            y
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="end">{}</text>"#,
            MARGIN_LEFT - 8.0,
            y + 4.0,
            value
        ));
        svg.push('\n');
    }

    let slot = plot_w / counts.iter().count() as f64;
    let bar_w = slot * 0.8;
    for (i, (label, count)) in counts.iter().enumerate() {
        let x = MARGIN_LEFT + i as f64 * slot + (slot - bar_w) / 2.0;
        let h = scale(count);
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            x,
            baseline - h,
            bar_w,
            h,
            BAR_COLOR
        ));
        if count > 0 {
            svg.push_str(&format!(
                r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">{}</text>"#,
                x + bar_w / 2.0,
                baseline - h - 4.0,
                count
            ));
        }
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="13" text-anchor="middle">{}</text>"#,
            x + bar_w / 2.0,
            baseline + 18.0,
            xml_escape(label)
        ));
        svg.push('\n');
    }

    // Axes and captions
    svg.push_str(&format!(
        r#"<line x1="{l:.1}" y1="{t:.1}" x2="{l:.1}" y2="{b:.1}" stroke="black"/><line x1="{l:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}" stroke="black"/>"#,
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = baseline,
        r = MARGIN_LEFT + plot_w
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" font-size="14" text-anchor="middle">Grade</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 20.0
    ));
    svg.push_str(&format!(
        r#"<text x="20" y="{y:.1}" font-size="14" text-anchor="middle" transform="rotate(-90 20 {y:.1})">Number of Students</text>"#,
        y = MARGIN_TOP + plot_h / 2.0
    ));
    svg.push_str("\n</svg>\n");

    svg
}

/// Rasterize an SVG document to PNG bytes
fn rasterize(svg: &str) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options).context("Failed to parse chart SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .context("Chart has an empty canvas")?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap.encode_png().context("Failed to encode chart PNG")
}

/// Write a PNG chart to `path`, creating its directory if needed
pub fn render_chart(counts: &GradeCounts, title: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create chart directory: {}", parent.display()))?;
    }
    let png = rasterize(&render_svg(counts, title))?;
    fs::write(path, png).with_context(|| format!("Failed to write chart: {}", path.display()))
}
