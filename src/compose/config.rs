//! Composer configuration.

use crate::color::Rgba;
use crate::layout::{DEFAULT_TAB_WIDTH, TabStops};
use crate::style::{Style, TextAttributes};
use crate::text::Tag;

/// Colors used to paint tagged text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TagColors {
    pub quote1: Rgba,
    pub quote2: Rgba,
    pub quote3: Rgba,
    pub link: Rgba,
    pub signature: Rgba,
}

impl Default for TagColors {
    fn default() -> Self {
        let quote = Rgba::from_rgb_u32(0x00_00B3);
        Self {
            quote1: quote,
            quote2: quote,
            quote3: quote,
            link: Rgba::from_rgb_u32(0x00_7F00),
            signature: Rgba::from_rgb_u32(0x7F_7F7F),
        }
    }
}

/// Settings for wrapping, quoting and tag colors.
///
/// The host loads these from wherever it keeps preferences and hands them
/// in; nothing here is global.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposeConfig {
    /// Characters that mark a quoted line.
    pub quote_chars: String,
    /// Prefix for reply quoting.
    pub quote_mark: String,
    /// Prefix for forward quoting.
    pub fw_quote_mark: String,
    /// A line equal to this starts the signature.
    pub signature_separator: String,
    /// Reflow width in columns.
    pub linewrap_len: u32,
    /// Break display lines at whitespace.
    pub word_wrap: bool,
    /// Break display lines at all.
    pub line_wrap: bool,
    /// Rewrap quoted paragraphs without `force`.
    pub linewrap_quote: bool,
    /// Reflow pasted text instead of tagging it `no_wrap`.
    pub linewrap_pastes: bool,
    /// Reflow the current paragraph after every user edit.
    pub autowrap: bool,
    /// Cycle quote colors by depth instead of clamping at the third.
    pub recycle_quote_colors: bool,
    /// Tab width after the explicit stops run out.
    pub default_tab_width: u32,
    /// Explicit tab stop widths, in columns.
    pub tab_stops: Vec<u32>,
    pub colors: TagColors,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            quote_chars: ">".to_string(),
            quote_mark: "> ".to_string(),
            fw_quote_mark: "> ".to_string(),
            signature_separator: "-- ".to_string(),
            linewrap_len: 74,
            word_wrap: true,
            line_wrap: true,
            linewrap_quote: false,
            linewrap_pastes: false,
            autowrap: false,
            recycle_quote_colors: false,
            default_tab_width: DEFAULT_TAB_WIDTH,
            tab_stops: Vec::new(),
            colors: TagColors::default(),
        }
    }
}

impl ComposeConfig {
    #[must_use]
    pub fn with_quote_chars(mut self, chars: impl Into<String>) -> Self {
        self.quote_chars = chars.into();
        self
    }

    #[must_use]
    pub fn with_quote_mark(mut self, mark: impl Into<String>) -> Self {
        self.quote_mark = mark.into();
        self
    }

    #[must_use]
    pub fn with_fw_quote_mark(mut self, mark: impl Into<String>) -> Self {
        self.fw_quote_mark = mark.into();
        self
    }

    #[must_use]
    pub fn with_signature_separator(mut self, separator: impl Into<String>) -> Self {
        self.signature_separator = separator.into();
        self
    }

    #[must_use]
    pub const fn with_linewrap_len(mut self, len: u32) -> Self {
        self.linewrap_len = len;
        self
    }

    #[must_use]
    pub const fn with_linewrap_quote(mut self, enabled: bool) -> Self {
        self.linewrap_quote = enabled;
        self
    }

    #[must_use]
    pub const fn with_linewrap_pastes(mut self, enabled: bool) -> Self {
        self.linewrap_pastes = enabled;
        self
    }

    #[must_use]
    pub const fn with_autowrap(mut self, enabled: bool) -> Self {
        self.autowrap = enabled;
        self
    }

    #[must_use]
    pub const fn with_recycle_quote_colors(mut self, enabled: bool) -> Self {
        self.recycle_quote_colors = enabled;
        self
    }

    #[must_use]
    pub fn with_tab_stops(mut self, stops: Vec<u32>, default_width: u32) -> Self {
        self.tab_stops = stops;
        self.default_tab_width = default_width;
        self
    }

    #[must_use]
    pub const fn with_colors(mut self, colors: TagColors) -> Self {
        self.colors = colors;
        self
    }

    /// Quote characters as a slice-friendly list.
    #[must_use]
    pub fn quote_char_list(&self) -> Vec<char> {
        self.quote_chars.chars().collect()
    }

    /// Tab stops for layout.
    #[must_use]
    pub fn tab_stop_list(&self) -> TabStops {
        TabStops::new(self.tab_stops.clone(), self.default_tab_width)
    }

    /// How text carrying `tag` should be painted.
    #[must_use]
    pub fn tag_style(&self, tag: Tag) -> Style {
        match tag {
            Tag::Quote1 => Style::fg(self.colors.quote1),
            Tag::Quote2 => Style::fg(self.colors.quote2),
            Tag::Quote3 => Style::fg(self.colors.quote3),
            Tag::Link => Style::fg(self.colors.link).with_attributes(TextAttributes::UNDERLINE),
            Tag::Signature => Style::fg(self.colors.signature),
            Tag::NoWrap | Tag::NoJoin => Style::NONE,
        }
    }
}
