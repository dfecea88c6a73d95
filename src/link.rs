//! URI and email recognition.
//!
//! Links are found by scanning for the leftmost needle of any
//! [`LinkKind`], then letting that kind's recognizer decide where the span
//! starts and ends. The same spans drive the `link` tag and the rule that
//! a line break never lands inside a link.
//!
//! All positions are character indices into the scanned text.
//!
//! # Examples
//!
//! ```
//! use mailwrap::link::{LinkKind, find_links};
//!
//! let links = find_links("see www.example.org or mail bob@example.com.");
//! assert_eq!(links.len(), 2);
//! assert_eq!(links[0].kind, LinkKind::Www);
//! assert_eq!(links[0].range, 4..19);
//! assert_eq!(links[1].uri("see www.example.org or mail bob@example.com."),
//!            "mailto:bob@example.com");
//! ```

use std::ops::Range;

/// Kind of recognized link, in needle priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Http,
    Https,
    Ftp,
    Ftps,
    Sftp,
    Gopher,
    Www,
    Webcal,
    Webcals,
    Mailto,
    Email,
}

/// A recognized link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkSpan {
    pub kind: LinkKind,
    /// Character range of the link text.
    pub range: Range<usize>,
}

impl LinkSpan {
    /// Openable URI for this span of `text`.
    #[must_use]
    pub fn uri(&self, text: &str) -> String {
        let raw: String = text
            .chars()
            .skip(self.range.start)
            .take(self.range.len())
            .collect();
        self.kind.build_uri(&raw)
    }
}

/// Characters that end a URI outright.
const URI_STOP: &[char] = &['[', ']', '{', '}', '<', '>', '"'];
/// Trailing punctuation that stays part of a URI.
const URI_KEEP_TRAILING: &[char] = &['/', '?', '=', '-', '_', '~', ')'];
/// Characters allowed in the local part of an address, besides alphanumerics.
const EMAIL_LOCAL: &[char] = &[
    '.', '!', '#', '$', '%', '&', '\'', '*', '+', '/', '=', '?', '^', '_', '`', '{', '|', '}', '~',
    '-',
];

impl LinkKind {
    /// Every kind, in the order ties between needles are broken.
    pub const ALL: [Self; 11] = [
        Self::Http,
        Self::Https,
        Self::Ftp,
        Self::Ftps,
        Self::Sftp,
        Self::Gopher,
        Self::Www,
        Self::Webcal,
        Self::Webcals,
        Self::Mailto,
        Self::Email,
    ];

    /// Text whose presence triggers this kind's recognizer.
    #[must_use]
    pub const fn needle(self) -> &'static str {
        match self {
            Self::Http => "http://",
            Self::Https => "https://",
            Self::Ftp => "ftp://",
            Self::Ftps => "ftps://",
            Self::Sftp => "sftp://",
            Self::Gopher => "gopher://",
            Self::Www => "www.",
            Self::Webcal => "webcal://",
            Self::Webcals => "webcals://",
            Self::Mailto => "mailto:",
            Self::Email => "@",
        }
    }

    /// Turn the matched text into something a browser or mailer opens.
    #[must_use]
    pub fn build_uri(self, text: &str) -> String {
        match self {
            Self::Www => format!("http://{text}"),
            Self::Email => format!("mailto:{text}"),
            _ => text.to_string(),
        }
    }

    /// Decide the span around a needle found at `at`, never reaching
    /// back before `floor`.
    fn recognize(self, chars: &[char], at: usize, floor: usize) -> Option<Range<usize>> {
        match self {
            Self::Email => email_span(chars, at, floor),
            Self::Www => {
                if at > floor && is_host_char(chars[at - 1]) {
                    return None;
                }
                uri_span(chars, at, self.needle().len())
            }
            _ => uri_span(chars, at, self.needle().len()),
        }
    }
}

fn is_host_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '.'
}

fn uri_span(chars: &[char], at: usize, needle_len: usize) -> Option<Range<usize>> {
    let mut end = at + needle_len;
    while end < chars.len() {
        let ch = chars[end];
        if ch.is_whitespace() || ch.is_control() || URI_STOP.contains(&ch) {
            break;
        }
        end += 1;
    }
    while end > at + needle_len {
        let last = chars[end - 1];
        if last.is_ascii_punctuation() && !URI_KEEP_TRAILING.contains(&last) {
            end -= 1;
        } else {
            break;
        }
    }
    (end > at + needle_len).then_some(at..end)
}

fn email_span(chars: &[char], at: usize, floor: usize) -> Option<Range<usize>> {
    let is_local = |ch: char| ch.is_ascii_alphanumeric() || EMAIL_LOCAL.contains(&ch);
    let mut start = at;
    while start > floor && is_local(chars[start - 1]) {
        start -= 1;
    }
    while start < at && chars[start] == '.' {
        start += 1;
    }
    if start == at {
        return None;
    }

    let mut end = at + 1;
    let mut dots = 0;
    while end < chars.len() {
        let ch = chars[end];
        if ch.is_alphanumeric() || ch == '-' {
            end += 1;
        } else if ch == '.' && end + 1 < chars.len() && chars[end + 1].is_alphanumeric() {
            dots += 1;
            end += 1;
        } else {
            break;
        }
    }
    while end > at + 1 && chars[end - 1] == '-' {
        end -= 1;
    }
    (dots > 0 && end > at + 1).then_some(start..end)
}

/// Case-insensitive search for `needle` in `chars` from `from`.
fn find_needle(lower: &[char], needle: &str, from: usize) -> Option<usize> {
    let needle: Vec<char> = needle.chars().collect();
    if lower.len() < needle.len() {
        return None;
    }
    (from..=lower.len() - needle.len()).find(|&i| lower[i..i + needle.len()] == needle[..])
}

/// Find every link in a character slice.
#[must_use]
pub fn find_links_in(chars: &[char]) -> Vec<LinkSpan> {
    let lower: Vec<char> = chars.iter().map(char::to_ascii_lowercase).collect();
    let mut links = Vec::new();
    let mut cursor = 0;
    // next occurrence of each needle, recomputed lazily as the cursor passes it
    let mut next: Vec<Option<usize>> = LinkKind::ALL
        .iter()
        .map(|kind| find_needle(&lower, kind.needle(), 0))
        .collect();

    while cursor < chars.len() {
        for (slot, kind) in next.iter_mut().zip(LinkKind::ALL) {
            if slot.is_some_and(|at| at < cursor) {
                *slot = find_needle(&lower, kind.needle(), cursor);
            }
        }
        let Some((kind, at)) = LinkKind::ALL
            .into_iter()
            .zip(next.iter())
            .filter_map(|(kind, at)| at.map(|at| (kind, at)))
            .min_by_key(|&(_, at)| at)
        else {
            break;
        };
        match kind.recognize(chars, at, cursor) {
            Some(range) => {
                cursor = range.end;
                links.push(LinkSpan { kind, range });
            }
            None => cursor = at + kind.needle().chars().count(),
        }
    }
    links
}

/// Find every link in `text`.
#[must_use]
pub fn find_links(text: &str) -> Vec<LinkSpan> {
    let chars: Vec<char> = text.chars().collect();
    find_links_in(&chars)
}

/// The link covering character `index` of `text`, if any.
#[must_use]
pub fn link_at(text: &str, index: usize) -> Option<LinkSpan> {
    find_links(text)
        .into_iter()
        .find(|link| link.range.contains(&index))
}
