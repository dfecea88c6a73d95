//! Quote, list item and signature detection.
//!
//! These functions look at a single logical line, given as characters
//! without its terminating newline.

use crate::text::Tag;

fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Leading quote characters of a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotePrefix {
    /// Zero for `"> "`, one for `"> > "`, and so on.
    pub level: usize,
    /// Characters of the prefix, including the blanks that follow it.
    pub len: usize,
}

/// Scan the quote prefix of `line`.
///
/// A prefix is a run of quote characters separated by blanks, where each
/// quote character may be preceded by a nickname (`John> `). A line with a
/// `<` before its first quote character is not quoted, and a `-` ends the
/// prefix.
#[must_use]
pub fn quote_prefix(line: &[char], quote_chars: &[char]) -> Option<QuotePrefix> {
    let is_quote = |ch: char| quote_chars.contains(&ch);
    let first = line.iter().position(|&ch| is_quote(ch))?;
    if line[..first].contains(&'<') {
        return None;
    }
    let last = line.iter().rposition(|&ch| is_quote(ch))?;

    let mut level: Option<usize> = None;
    let mut counted = 0;
    let mut p = 0;
    while p <= last {
        while p < last && line[p].is_whitespace() {
            p += 1;
        }
        let ch = line[p];
        if is_quote(ch) {
            level = Some(level.map_or(0, |l| l + 1));
            counted = p;
        } else if ch != '-' && !ch.is_whitespace() {
            // a nickname: anything but '-' and blanks up to a quote char
            while p < last {
                let ch = line[p];
                if ch == '-' || is_quote(ch) || ch.is_whitespace() {
                    break;
                }
                p += 1;
            }
            if is_quote(line[p]) {
                level = Some(level.map_or(0, |l| l + 1));
                counted = p;
            } else {
                break;
            }
        }
        p += 1;
    }

    let level = level?;
    let mut len = counted + 1;
    while len < line.len() && is_blank(line[len]) {
        len += 1;
    }
    Some(QuotePrefix { level, len })
}

/// Quote level of `line`, `None` when unquoted.
#[must_use]
pub fn quote_level(line: &[char], quote_chars: &[char]) -> Option<usize> {
    quote_prefix(line, quote_chars).map(|q| q.level)
}

/// The quote string of `line`, as inserted in front of wrapped
/// continuations.
#[must_use]
pub fn quote_str(line: &[char], quote_chars: &[char]) -> Option<String> {
    quote_prefix(line, quote_chars).map(|q| line[..q.len].iter().collect())
}

/// Whether the content after `prefix_len` characters starts a list item.
///
/// Returns the width of the blanks, marker and following whitespace, which
/// is how far wrapped continuations of the item are indented.
#[must_use]
pub fn item_indent(line: &[char], prefix_len: usize) -> Option<usize> {
    let mut p = prefix_len;
    while p < line.len() && is_blank(line[p]) {
        p += 1;
    }
    match line.get(p).copied()? {
        '*' | '-' | '+' | '•' => p += 1,
        ch if ch.is_ascii_digit() => {
            while p < line.len() && line[p].is_ascii_digit() {
                p += 1;
            }
            if !matches!(line.get(p).copied(), Some('.' | ')')) {
                return None;
            }
            p += 1;
        }
        _ => return None,
    }
    if !line.get(p).is_some_and(|&ch| is_blank(ch)) {
        return None;
    }
    while p < line.len() && is_blank(line[p]) {
        p += 1;
    }
    Some(p - prefix_len)
}

/// Whether `line` is a list item.
#[must_use]
pub fn is_itemized(line: &[char], quote_chars: &[char]) -> bool {
    let prefix = quote_prefix(line, quote_chars).map_or(0, |q| q.len);
    item_indent(line, prefix).is_some()
}

/// Whether `line` separates the body from the signature.
#[must_use]
pub fn is_sig_separator(line: &[char], separator: &str) -> bool {
    !separator.is_empty() && line.iter().copied().eq(separator.chars())
}

/// Tag used to color a line of the given quote level.
#[must_use]
pub fn quote_tag_for_level(level: usize, recycle: bool) -> Tag {
    let depth = level + 1;
    let slot = if recycle {
        (depth - 1) % 3 + 1
    } else {
        depth.min(3)
    };
    match slot {
        1 => Tag::Quote1,
        2 => Tag::Quote2,
        _ => Tag::Quote3,
    }
}

/// Prefix every line of `text` with `mark`, splitting lines longer than
/// `wrap` columns (prefix included) at whitespace.
///
/// A trailing newline does not produce an extra quoted line.
#[must_use]
pub fn quote_text(text: &str, mark: &str, wrap: Option<usize>) -> String {
    let mark_len = mark.chars().count();
    let wrap_len = wrap.filter(|&w| w > mark_len).map(|w| w - mark_len);
    let body = text.strip_suffix('\n').unwrap_or(text);
    let mut out = String::new();
    for line in body.split('\n') {
        let pieces = match wrap_len {
            Some(width) => split_line(line, width),
            None => vec![line.to_string()],
        };
        for piece in pieces {
            out.push_str(mark);
            out.push_str(&piece);
            out.push('\n');
        }
    }
    if !text.ends_with('\n') {
        out.pop();
    }
    out
}

/// Split `line` into pieces no wider than `width` where whitespace allows.
fn split_line(line: &str, width: usize) -> Vec<String> {
    use unicode_width::UnicodeWidthChar;

    let chars: Vec<char> = line.chars().collect();
    let mut pieces = Vec::new();
    let mut left = 0;
    // last break opportunity: (index after it, columns before it)
    let mut brk: Option<(usize, usize)> = None;
    let mut cols = 0;
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let w = ch.width().unwrap_or(1).max(1);
        if is_blank(ch) {
            brk = Some((i + 1, cols + w));
        }
        if cols + w > width {
            if let Some((after, before)) = brk.take() {
                let end = if is_blank(chars[after - 1]) { after - 1 } else { after };
                pieces.push(chars[left..end].iter().collect());
                left = after;
                cols = cols + w - before;
                i += 1;
                continue;
            }
        }
        if w > 1 {
            brk = Some((i + 1, cols + w));
        }
        cols += w;
        i += 1;
    }
    pieces.push(chars[left..].iter().collect());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    const Q: &[char] = &['>'];

    #[test]
    fn test_quote_levels() {
        assert_eq!(quote_level(&chars("plain text"), Q), None);
        assert_eq!(quote_level(&chars("> text"), Q), Some(0));
        assert_eq!(quote_level(&chars(">> text"), Q), Some(1));
        assert_eq!(quote_level(&chars("> > > text"), Q), Some(2));
        assert_eq!(quote_level(&chars("John> text"), Q), Some(0));
        assert_eq!(quote_level(&chars("  > indented"), Q), Some(0));
    }

    #[test]
    fn test_not_quoted() {
        // '<' before the first quote char
        assert_eq!(quote_level(&chars("<b> bold"), Q), None);
        // words with blanks before the quote char are not a nickname
        assert_eq!(quote_level(&chars("a < b > c"), Q), None);
        assert_eq!(quote_level(&chars("x = y > z"), Q), None);
        assert_eq!(quote_level(&chars("> text"), &[]), None);
    }

    #[test]
    fn test_dash_ends_nickname() {
        assert_eq!(quote_level(&chars("a-b> text"), Q), None);
        assert_eq!(quote_level(&chars("-> text"), Q), Some(0));
    }

    #[test]
    fn test_quote_str() {
        assert_eq!(quote_str(&chars("> text"), Q).as_deref(), Some("> "));
        assert_eq!(quote_str(&chars(">>  text"), Q).as_deref(), Some(">>  "));
        assert_eq!(quote_str(&chars("John> hi > there"), Q).as_deref(), Some("John> "));
        assert_eq!(quote_str(&chars(">"), Q).as_deref(), Some(">"));
        assert_eq!(quote_str(&chars("text"), Q), None);
    }

    #[test]
    fn test_itemized() {
        assert!(is_itemized(&chars("* item"), Q));
        assert!(is_itemized(&chars("  - item"), Q));
        assert!(is_itemized(&chars("> + item"), Q));
        assert!(is_itemized(&chars("• item"), Q));
        assert!(is_itemized(&chars("12. item"), Q));
        assert!(is_itemized(&chars("3) item"), Q));
        assert!(!is_itemized(&chars("*bold*"), Q));
        assert!(!is_itemized(&chars("12 monkeys"), Q));
        assert!(!is_itemized(&chars("-"), Q));
        assert_eq!(item_indent(&chars("  - item"), 0), Some(4));
        assert_eq!(item_indent(&chars("> 10.  x"), 2), Some(5));
    }

    #[test]
    fn test_sig_separator() {
        assert!(is_sig_separator(&chars("-- "), "-- "));
        assert!(!is_sig_separator(&chars("--"), "-- "));
        assert!(!is_sig_separator(&chars("-- x"), "-- "));
        assert!(!is_sig_separator(&chars(""), ""));
    }

    #[test]
    fn test_quote_tags() {
        assert_eq!(quote_tag_for_level(0, false), Tag::Quote1);
        assert_eq!(quote_tag_for_level(1, false), Tag::Quote2);
        assert_eq!(quote_tag_for_level(5, false), Tag::Quote3);
        assert_eq!(quote_tag_for_level(3, true), Tag::Quote1);
        assert_eq!(quote_tag_for_level(4, true), Tag::Quote2);
    }

    #[test]
    fn test_quote_text() {
        assert_eq!(quote_text("a\nb\n", "> ", None), "> a\n> b\n");
        assert_eq!(quote_text("a\n\nb", "> ", None), "> a\n> \n> b");
        assert_eq!(
            quote_text("one two three four", "> ", Some(10)),
            "> one two\n> three\n> four"
        );
        // too narrow to wrap after the mark
        assert_eq!(quote_text("one two", "> ", Some(2)), "> one two");
    }
}
