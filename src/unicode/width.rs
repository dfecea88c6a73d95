//! Display width calculation for monospace layout.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Width calculation method for ambiguous-width characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WidthMethod {
    /// POSIX-like wcwidth: ambiguous width = 1.
    #[default]
    WcWidth,
    /// Unicode East Asian Width: ambiguous width = 2.
    Unicode,
}

/// Get the display width of a string in columns using a specific method.
#[must_use]
pub fn display_width_with_method(s: &str, method: WidthMethod) -> usize {
    match method {
        WidthMethod::WcWidth => UnicodeWidthStr::width(s),
        WidthMethod::Unicode => UnicodeWidthStr::width_cjk(s),
    }
}

/// Get the display width of a character in columns using a specific method.
///
/// Printable ASCII takes a fast path; control characters are zero width.
#[inline]
#[must_use]
pub fn display_width_char_with_method(c: char, method: WidthMethod) -> usize {
    if c.is_ascii() {
        return usize::from(c >= ' ' && c != '\u{7f}');
    }
    match method {
        WidthMethod::WcWidth => UnicodeWidthChar::width(c).unwrap_or(0),
        WidthMethod::Unicode => UnicodeWidthChar::width_cjk(c).unwrap_or(0),
    }
}

/// Check if a character is wide (takes 2 columns) under the given method.
#[must_use]
pub fn is_wide_with_method(c: char, method: WidthMethod) -> bool {
    display_width_char_with_method(c, method) == 2
}
