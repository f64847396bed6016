//! Text watermark drawn near the bottom of an image.

use super::Transform;
use crate::error::TransformError;
use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgba};
use imageproc::drawing::{draw_text_mut, text_size};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use walkdir::WalkDir;

/// Default text height in pixels
pub const DEFAULT_SIZE: f32 = 25.0;

/// Font files looked up, in order, when no font is given
pub const FONT_NAMES: &[&str] = &["arial.ttf", "DejaVuSans.ttf"];

// The text block is centred on a point this far from the right and bottom edges
const RIGHT_OFFSET: i32 = 200;
const BOTTOM_OFFSET: i32 = 20;
// Lines wrap at the image width less this margin
const WRAP_MARGIN: u32 = 60;
const LINE_SPACING: f32 = 1.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatermarkColor {
    #[default]
    White,
    Black,
}

impl WatermarkColor {
    fn pixel(self) -> Rgba<u8> {
        match self {
            WatermarkColor::White => Rgba([255, 255, 255, 255]),
            WatermarkColor::Black => Rgba([0, 0, 0, 255]),
        }
    }
}

impl FromStr for WatermarkColor {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "white" => Ok(WatermarkColor::White),
            "black" => Ok(WatermarkColor::Black),
            _ => Err(TransformError::UnknownColor {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for WatermarkColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatermarkColor::White => write!(f, "white"),
            WatermarkColor::Black => write!(f, "black"),
        }
    }
}

/// Overlay `text` in `color`, `size` pixels high
#[derive(Clone)]
pub struct Watermark {
    text: String,
    color: WatermarkColor,
    size: f32,
    font: FontArc,
}

impl Watermark {
    pub fn new(
        text: &str,
        color: WatermarkColor,
        size: f32,
        font: FontArc,
    ) -> Result<Self, TransformError> {
        check_style(text, size)?;
        Ok(Self {
            text: text.to_string(),
            color,
            size,
            font,
        })
    }

    /// Use the TrueType/OpenType font at `path`
    pub fn with_font_file(
        text: &str,
        color: WatermarkColor,
        size: f32,
        path: &Path,
    ) -> Result<Self, TransformError> {
        check_style(text, size)?;
        Self::new(text, color, size, load_font(path)?)
    }

    /// Use the first of [`FONT_NAMES`] installed on this machine
    pub fn with_system_font(
        text: &str,
        color: WatermarkColor,
        size: f32,
    ) -> Result<Self, TransformError> {
        check_style(text, size)?;
        let path = find_font(&font_dirs(), FONT_NAMES).ok_or_else(|| {
            TransformError::FontNotFound {
                names: FONT_NAMES.join(", "),
            }
        })?;
        debug!(font = %path.display(), "using system font");
        Self::with_font_file(text, color, size, &path)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> WatermarkColor {
        self.color
    }
}

fn check_style(text: &str, size: f32) -> Result<(), TransformError> {
    if text.trim().is_empty() {
        return Err(TransformError::EmptyWatermark);
    }
    if !size.is_finite() || size <= 0.0 {
        return Err(TransformError::InvalidSize { size });
    }
    Ok(())
}

impl fmt::Debug for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watermark")
            .field("text", &self.text)
            .field("color", &self.color)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Transform for Watermark {
    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, TransformError> {
        let mut canvas = image.into_rgba8();
        let (width, height) = canvas.dimensions();
        let scale = PxScale::from(self.size);
        let measure = |line: &str| text_size(scale, &self.font, line).0;

        let lines = wrap_lines(&self.text, width.saturating_sub(WRAP_MARGIN), &measure);
        let line_height = (self.size * LINE_SPACING).round() as i32;
        let center_x = width as i32 - RIGHT_OFFSET;
        let center_y = height as i32 - BOTTOM_OFFSET;

        let mut y = center_y - line_height * lines.len() as i32 / 2;
        for line in lines.iter().map(String::as_str) {
            let x = center_x - measure(line) as i32 / 2;
            draw_text_mut(&mut canvas, self.color.pixel(), x, y, scale, &self.font, line);
            y += line_height;
        }
        Ok(DynamicImage::ImageRgba8(canvas))
    }

    fn output_name(&self, stem: &str) -> String {
        format!("{stem}.jpg")
    }
}

/// Greedy word wrap. A single word wider than `max_width` gets its own line.
fn wrap_lines(text: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if measure(&candidate) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

fn load_font(path: &Path) -> Result<FontArc, TransformError> {
    let font_error = |reason: String| TransformError::Font {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = fs::read(path).map_err(|e| font_error(e.to_string()))?;
    FontArc::try_from_vec(bytes).map_err(|e| font_error(e.to_string()))
}

/// Directories searched for system fonts, user fonts first
pub fn font_dirs() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = dirs::font_dir().into_iter().collect();
    candidates.extend(
        [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/Library/Fonts",
            "/System/Library/Fonts",
        ]
        .into_iter()
        .map(PathBuf::from),
    );
    if let Some(windir) = std::env::var_os("WINDIR") {
        candidates.push(PathBuf::from(windir).join("Fonts"));
    }
    candidates.retain(|dir| dir.is_dir());
    candidates
}

/// First file under `roots` whose name matches one of `names`, ignoring case.
/// Earlier names win over earlier directories.
pub fn find_font(roots: &[PathBuf], names: &[&str]) -> Option<PathBuf> {
    names.iter().find_map(|name| {
        roots.iter().find_map(|dir| {
            WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .find(|entry| {
                    entry.file_type().is_file()
                        && entry.file_name().to_string_lossy().eq_ignore_ascii_case(name)
                })
                .map(|entry| entry.into_path())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, RgbImage};
    use tempfile::TempDir;

    // Ten pixels per character, spaces included
    fn chars(line: &str) -> u32 {
        line.chars().count() as u32 * 10
    }

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(wrap_lines("Holiday 2022", 500, chars), vec!["Holiday 2022"]);
    }

    #[test]
    fn long_text_wraps_between_words() {
        let lines = wrap_lines("one two three four", 90, chars);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn oversized_word_keeps_its_own_line() {
        let lines = wrap_lines("a enormousword b", 50, chars);
        assert_eq!(lines, vec!["a", "enormousword", "b"]);
    }

    #[test]
    fn explicit_newlines_start_new_lines() {
        assert_eq!(wrap_lines("top\nbottom", 1000, chars), vec!["top", "bottom"]);
    }

    #[test]
    fn color_parses_case_insensitively() {
        assert_eq!("White".parse::<WatermarkColor>().unwrap(), WatermarkColor::White);
        assert_eq!("black".parse::<WatermarkColor>().unwrap(), WatermarkColor::Black);
        assert!(matches!(
            "red".parse::<WatermarkColor>(),
            Err(TransformError::UnknownColor { .. })
        ));
    }

    #[test]
    fn invalid_font_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"not a font").unwrap();

        let result = Watermark::with_font_file("text", WatermarkColor::White, 25.0, &path);

        assert!(matches!(result, Err(TransformError::Font { .. })));
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Watermark::with_font_file(
            "text",
            WatermarkColor::White,
            25.0,
            &dir.path().join("absent.ttf"),
        );
        assert!(matches!(result, Err(TransformError::Font { .. })));
    }

    #[test]
    fn find_font_prefers_earlier_names() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::create_dir(first.path().join("truetype")).unwrap();
        fs::write(first.path().join("truetype").join("DejaVuSans.ttf"), b"").unwrap();
        fs::write(second.path().join("Arial.TTF"), b"").unwrap();

        let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            find_font(&roots, &["arial.ttf", "DejaVuSans.ttf"]),
            Some(second.path().join("Arial.TTF"))
        );
        assert_eq!(
            find_font(&roots, &["DejaVuSans.ttf"]),
            Some(first.path().join("truetype").join("DejaVuSans.ttf"))
        );
        assert_eq!(find_font(&roots, &["missing.ttf"]), None);
    }

    #[test]
    fn draws_text_near_the_bottom() {
        let Some(path) = find_font(&font_dirs(), FONT_NAMES) else {
            // No usable font on this machine
            return;
        };
        let Ok(watermark) = Watermark::with_font_file("Copy", WatermarkColor::White, 20.0, &path)
        else {
            return;
        };
        let image: RgbImage = ImageBuffer::new(400, 200);

        let marked = watermark.apply(DynamicImage::ImageRgb8(image)).unwrap();
        assert_eq!(watermark.output_name("IMG_0001"), "IMG_0001.jpg");

        let rgba = marked.to_rgba8();
        let lit: Vec<(u32, u32)> = rgba
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] > 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&(_, y)| y >= 150));
    }

    #[test]
    fn style_is_checked_before_the_font_is_read() {
        let absent = Path::new("/nonexistent/font.ttf");
        assert!(matches!(
            Watermark::with_font_file(" ", WatermarkColor::Black, 25.0, absent),
            Err(TransformError::EmptyWatermark)
        ));
        assert!(matches!(
            Watermark::with_font_file("x", WatermarkColor::Black, 0.0, absent),
            Err(TransformError::InvalidSize { .. })
        ));
    }
}
