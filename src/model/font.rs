//! Font measurement.
//!
//! The layout engine never rasterizes text itself; it asks a [`FontMetrics`]
//! implementation for widths and vertical extents. [`CellMetrics`] is a
//! fixed-cell implementation where every column is `cell_width` pixels wide
//! and column counts come from `unicode-width`.

use crate::model::style::FontId;
use unicode_width::UnicodeWidthStr;

/// Measures text in a given font.
pub trait FontMetrics {
    /// Pixel width of `text` drawn in `font`.
    fn text_width(&self, font: FontId, text: &str) -> i32;

    /// Pixels above the baseline.
    fn ascent(&self, font: FontId) -> i32;

    /// Pixels below the baseline.
    fn descent(&self, font: FontId) -> i32;

    /// Width used for default tab stops (eight of these per stop).
    fn average_char_width(&self, font: FontId) -> i32 {
        self.text_width(font, "0")
    }

    /// Line height of `font`.
    fn line_height(&self, font: FontId) -> i32 {
        self.ascent(font) + self.descent(font)
    }
}

/// Extents of one font in a [`CellMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFont {
    /// Pixels per column.
    pub cell_width: i32,
    /// Pixels above the baseline.
    pub ascent: i32,
    /// Pixels below the baseline.
    pub descent: i32,
}

/// Fixed-cell font metrics.
///
/// Font 0 is the default; further fonts can be registered and unknown font
/// ids fall back to the default.
///
/// # Examples
///
/// ```
/// # use textdisp::model::font::{CellMetrics, FontMetrics};
/// let fonts = CellMetrics::new(7, 16);
/// assert_eq!(fonts.text_width(0, "abc"), 21);
/// assert_eq!(fonts.text_width(0, "日本"), 28);
/// assert_eq!(fonts.line_height(0), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMetrics {
    fonts: Vec<CellFont>,
}

impl CellMetrics {
    /// Metrics with a single font of the given cell width and line height.
    /// The baseline sits at three quarters of the line height.
    pub fn new(cell_width: i32, line_height: i32) -> Self {
        let ascent = (line_height * 3 + 3) / 4;
        Self {
            fonts: vec![CellFont {
                cell_width,
                ascent,
                descent: line_height - ascent,
            }],
        }
    }

    /// Registers another font and returns its id.
    pub fn add_font(&mut self, font: CellFont) -> FontId {
        self.fonts.push(font);
        (self.fonts.len() - 1) as FontId
    }

    fn font(&self, font: FontId) -> &CellFont {
        self.fonts.get(font as usize).unwrap_or(&self.fonts[0])
    }
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self::new(8, 16)
    }
}

impl FontMetrics for CellMetrics {
    fn text_width(&self, font: FontId, text: &str) -> i32 {
        text.width() as i32 * self.font(font).cell_width
    }

    fn ascent(&self, font: FontId) -> i32 {
        self.font(font).ascent
    }

    fn descent(&self, font: FontId) -> i32 {
        self.font(font).descent
    }
}
