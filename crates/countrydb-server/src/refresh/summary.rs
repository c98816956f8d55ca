// Summary image: catalog totals, refresh time and the top countries by estimated GDP

use chrono::{DateTime, SecondsFormat, Utc};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::models::Country;

pub const SUMMARY_WIDTH: u32 = 1200;
pub const SUMMARY_HEIGHT: u32 = 800;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);
const GLYPH_SIZE: u32 = 8;

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// One line of text placed on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub text: String,
    pub x: u32,
    pub y: u32,
    /// Pixel size of one font dot
    pub scale: u32,
}

impl SummaryLine {
    fn new(text: impl Into<String>, x: u32, y: u32, scale: u32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            scale,
        }
    }
}

/// Format with thousands separators and two decimals, e.g. `1,234,567.89`
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Text layout of the summary image
///
/// `top` is expected in rank order; a missing estimate is shown as zero.
pub fn layout(total: i64, top: &[Country], refreshed_at: DateTime<Utc>) -> Vec<SummaryLine> {
    let mut lines = vec![
        SummaryLine::new("Countries Summary", 40, 40, 5),
        SummaryLine::new(format!("Total countries: {}", total), 40, 120, 3),
        SummaryLine::new(
            format!(
                "Last refreshed at (UTC): {}",
                refreshed_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ),
            40,
            160,
            3,
        ),
        SummaryLine::new("Top 5 countries by estimated GDP:", 40, 220, 3),
    ];

    let mut y = 260;
    for (rank, country) in top.iter().enumerate() {
        lines.push(SummaryLine::new(
            format!(
                "{}. {} \u{2014} estimated_gdp: {}",
                rank + 1,
                country.name,
                format_amount(country.estimated_gdp.unwrap_or(0.0))
            ),
            60,
            y,
            2,
        ));
        y += 30;
    }

    lines
}

fn glyph(c: char) -> [u8; 8] {
    let c = match c {
        '\u{2013}' | '\u{2014}' => '-',
        other => other,
    };
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn draw_line(canvas: &mut RgbImage, line: &SummaryLine) {
    let (width, height) = canvas.dimensions();
    let mut origin_x = line.x;

    for c in line.text.chars() {
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let left = origin_x + col * line.scale;
                let top = line.y + row as u32 * line.scale;
                for y in top..(top + line.scale).min(height) {
                    for x in left..(left + line.scale).min(width) {
                        canvas.put_pixel(x, y, INK);
                    }
                }
            }
        }
        origin_x += GLYPH_SIZE * line.scale;
        if origin_x >= width {
            break;
        }
    }
}

/// Render lines onto a white canvas and encode as PNG
pub fn render_png(lines: &[SummaryLine]) -> Result<Vec<u8>, SummaryError> {
    let mut canvas = RgbImage::from_pixel(SUMMARY_WIDTH, SUMMARY_HEIGHT, BACKGROUND);
    for line in lines {
        draw_line(&mut canvas, line);
    }

    let mut bytes = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Summary image destination
#[derive(Debug, Clone)]
pub struct SummaryArtifact {
    path: PathBuf,
}

impl SummaryArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the image into a temporary file next to the destination
    ///
    /// Missing parent directories are created. The destination itself is not
    /// touched until [`PendingArtifact::commit`].
    pub fn generate(
        &self,
        total: i64,
        top: &[Country],
        refreshed_at: DateTime<Utc>,
    ) -> Result<PendingArtifact, SummaryError> {
        let png = render_png(&layout(total, top, refreshed_at))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut file = NamedTempFile::new_in(&dir)?;
        file.write_all(&png)?;
        file.as_file().sync_all()?;

        Ok(PendingArtifact {
            file,
            target: self.path.clone(),
        })
    }
}

/// Rendered image waiting to replace the published one
///
/// Dropping it deletes the temporary file.
#[derive(Debug)]
pub struct PendingArtifact {
    file: NamedTempFile,
    target: PathBuf,
}

impl PendingArtifact {
    /// Atomically move the image into place
    pub fn commit(self) -> Result<(), SummaryError> {
        self.file
            .persist(&self.target)
            .map_err(|e| SummaryError::Io(e.error))?;
        Ok(())
    }
}
