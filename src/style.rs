//! Run styles: font, colors and attributes.
//!
//! - [`FontId`]: opaque handle into the host's font table
//! - [`TextAttributes`]: bitflags for bold, italic, underline
//! - [`Style`]: the value every property run carries
//! - [`StyleBuilder`]: fluent builder for constructing styles
//!
//! Two runs merge exactly when their styles compare equal, so a `Style`
//! must stay a small plain value.
//!
//! # Examples
//!
//! ```
//! use mailwrap::{FontId, Rgba, Style};
//!
//! let body = Style::NONE;
//! let header = Style::builder().font(FontId(1)).fg(Rgba::BLUE).bold().build();
//! assert_ne!(body, header);
//!
//! // Tag styles overlay run styles when painting.
//! let painted = header.merge(Style::fg(Rgba::RED));
//! assert_eq!(painted.fg, Some(Rgba::RED));
//! assert_eq!(painted.font, FontId(1));
//! ```

use crate::color::Rgba;
use bitflags::bitflags;

bitflags! {
    /// Text rendering attributes (bold, italic, underline).
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct TextAttributes: u8 {
        /// Bold/increased weight.
        const BOLD          = 0x01;
        /// Italic.
        const ITALIC        = 0x02;
        /// Underlined text.
        const UNDERLINE     = 0x04;
        /// Strikethrough text.
        const STRIKETHROUGH = 0x08;
    }
}

/// Font handle understood by the host's [`CharMetrics`](crate::CharMetrics).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(pub u16);

/// Complete style of a property run.
///
/// `None` colors mean "use the widget default".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Style {
    /// Font used to measure and draw the run.
    pub font: FontId,
    /// Foreground color (None = default).
    pub fg: Option<Rgba>,
    /// Background color (None = default).
    pub bg: Option<Rgba>,
    /// Text rendering attributes.
    pub attributes: TextAttributes,
}

impl Style {
    /// Default font, no colors, no attributes.
    pub const NONE: Self = Self {
        font: FontId(0),
        fg: None,
        bg: None,
        attributes: TextAttributes::empty(),
    };

    /// Create a new style builder.
    #[must_use]
    pub fn builder() -> StyleBuilder {
        StyleBuilder::default()
    }

    /// Create a style with only foreground color.
    #[must_use]
    pub const fn fg(color: Rgba) -> Self {
        Self {
            fg: Some(color),
            ..Self::NONE
        }
    }

    /// Create a style with only background color.
    #[must_use]
    pub const fn bg(color: Rgba) -> Self {
        Self {
            bg: Some(color),
            ..Self::NONE
        }
    }

    /// Create a style using the given font.
    #[must_use]
    pub const fn font(font: FontId) -> Self {
        Self {
            font,
            ..Self::NONE
        }
    }

    /// Return a new style with the specified foreground color.
    #[must_use]
    pub const fn with_fg(self, color: Rgba) -> Self {
        Self {
            fg: Some(color),
            ..self
        }
    }

    /// Return a new style with the specified background color.
    #[must_use]
    pub const fn with_bg(self, color: Rgba) -> Self {
        Self {
            bg: Some(color),
            ..self
        }
    }

    /// Return a new style with the specified font.
    #[must_use]
    pub const fn with_font(self, font: FontId) -> Self {
        Self { font, ..self }
    }

    /// Return a new style with the specified attributes added.
    #[must_use]
    pub const fn with_attributes(self, attrs: TextAttributes) -> Self {
        Self {
            attributes: self.attributes.union(attrs),
            ..self
        }
    }

    /// Return a new style with the underline attribute added.
    #[must_use]
    pub const fn with_underline(self) -> Self {
        self.with_attributes(TextAttributes::UNDERLINE)
    }

    /// Check if this style has any non-default properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Merge two styles, with `other` taking precedence for set colors.
    ///
    /// The font is never overridden: tags recolor text, they do not change
    /// its metrics.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            font: self.font,
            fg: other.fg.or(self.fg),
            bg: other.bg.or(self.bg),
            attributes: self.attributes | other.attributes,
        }
    }
}

/// Builder for creating styles fluently.
#[derive(Clone, Debug, Default)]
pub struct StyleBuilder {
    style: Style,
}

impl StyleBuilder {
    /// Set the font.
    #[must_use]
    pub fn font(mut self, font: FontId) -> Self {
        self.style.font = font;
        self
    }

    /// Set foreground color.
    #[must_use]
    pub fn fg(mut self, color: Rgba) -> Self {
        self.style.fg = Some(color);
        self
    }

    /// Set background color.
    #[must_use]
    pub fn bg(mut self, color: Rgba) -> Self {
        self.style.bg = Some(color);
        self
    }

    /// Add bold attribute.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.style.attributes |= TextAttributes::BOLD;
        self
    }

    /// Add italic attribute.
    #[must_use]
    pub fn italic(mut self) -> Self {
        self.style.attributes |= TextAttributes::ITALIC;
        self
    }

    /// Add underline attribute.
    #[must_use]
    pub fn underline(mut self) -> Self {
        self.style.attributes |= TextAttributes::UNDERLINE;
        self
    }

    /// Build the final style.
    #[must_use]
    pub fn build(self) -> Style {
        self.style
    }
}
