//! Character metrics supplied by the rendering layer.
//!
//! Layout never measures glyphs itself. It asks a [`CharMetrics`] for the
//! advance width of each character and the vertical extent of each font.
//! [`MonospaceMetrics`] is the terminal-style default: every column is
//! `cell_width` units wide and wide characters take two columns.

use crate::style::FontId;
use crate::unicode::{WidthMethod, display_width_char_with_method};

/// Per-font character measurements in display units.
pub trait CharMetrics {
    /// Advance width of `ch` drawn with `font`.
    ///
    /// Tabs and newlines are never measured through this method.
    fn char_width(&self, font: FontId, ch: char) -> u32;

    /// Distance from the baseline to the top of the line.
    fn ascent(&self, font: FontId) -> u32;

    /// Distance from the baseline to the bottom of the line.
    fn descent(&self, font: FontId) -> u32;

    /// Width of a string, used for quote prefixes and words.
    fn str_width(&self, font: FontId, s: &str) -> u32 {
        s.chars().map(|ch| self.char_width(font, ch)).sum()
    }
}

/// Fixed-cell metrics backed by `unicode-width`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonospaceMetrics {
    /// Width of one column.
    pub cell_width: u32,
    /// Ascent of every font.
    pub ascent: u32,
    /// Descent of every font.
    pub descent: u32,
    /// Treatment of ambiguous-width characters.
    pub width_method: WidthMethod,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self::columns()
    }
}

impl MonospaceMetrics {
    /// One unit per column and one unit per line.
    ///
    /// Widths are then column counts and heights are row counts.
    #[must_use]
    pub const fn columns() -> Self {
        Self {
            cell_width: 1,
            ascent: 1,
            descent: 0,
            width_method: WidthMethod::WcWidth,
        }
    }

    /// Pixel metrics for a fixed cell size.
    #[must_use]
    pub const fn with_cell(cell_width: u32, ascent: u32, descent: u32) -> Self {
        Self {
            cell_width,
            ascent,
            descent,
            width_method: WidthMethod::WcWidth,
        }
    }

    /// Use a different ambiguous-width policy.
    #[must_use]
    pub const fn with_width_method(mut self, method: WidthMethod) -> Self {
        self.width_method = method;
        self
    }
}

impl CharMetrics for MonospaceMetrics {
    fn char_width(&self, _font: FontId, ch: char) -> u32 {
        display_width_char_with_method(ch, self.width_method) as u32 * self.cell_width
    }

    fn ascent(&self, _font: FontId) -> u32 {
        self.ascent
    }

    fn descent(&self, _font: FontId) -> u32 {
        self.descent
    }
}
