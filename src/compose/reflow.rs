//! Quote-aware paragraph reflow.
//!
//! A paragraph is a run of logical lines sharing the same quote string,
//! ending at a blank line, a signature separator or a newline tagged
//! [`Tag::NoJoin`]. A list item line is a paragraph of its own: it never
//! joins the line before it or the one after it. Reflowing a paragraph breaks lines that are
//! wider than `linewrap_len` columns at whitespace, repeating the quote
//! string on the new line, and joins lines whose successor's first word
//! still fits.
//!
//! Reflow measures in columns, whatever the display metrics are, and uses
//! the same break engine as display layout, so links are never split.
//! Everything from the signature separator on is left alone.

use tracing::{debug, trace};

use crate::layout::{LayoutContext, LineEnd, TabCont, TabStopMark, TabStops, find_line_params};
use crate::link::find_links_in;
use crate::metrics::{CharMetrics, MonospaceMetrics};
use crate::style::FontId;
use crate::text::motion::{line_end, line_start};
use crate::text::{Edit, Tag, TextBuffer};
use crate::unicode::{WidthMethod, display_width_char_with_method};

use super::config::ComposeConfig;
use super::quote::{is_sig_separator, item_indent, quote_prefix, quote_tag_for_level};

fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// What a reflow pass changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReflowReport {
    /// Every buffer edit, in the order applied.
    pub edits: Vec<Edit>,
    /// Lines broken at whitespace.
    pub broken: usize,
    /// Lines joined to their predecessor.
    pub joined: usize,
    /// Start of the first line after the reflowed text.
    pub next: usize,
}

impl ReflowReport {
    /// Whether the text was left untouched.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.edits.is_empty()
    }

    fn absorb(&mut self, other: Self) {
        self.edits.extend(other.edits);
        self.broken += other.broken;
        self.joined += other.joined;
        self.next = other.next;
    }
}

/// A logical line, classified.
#[derive(Clone, Debug)]
struct LineInfo {
    start: usize,
    /// Index of the terminating `'\n'`, or the buffer length.
    end: usize,
    /// Quote string including its trailing blanks.
    quote: Option<String>,
    level: Option<usize>,
    /// Characters before the content: quote string or leading blanks.
    prefix_len: usize,
    blank: bool,
    /// Indent of wrapped continuations when the line is a list item.
    item: Option<usize>,
    separator: bool,
}

/// Paragraph reflow over a [`TextBuffer`].
pub struct Reflow<'a> {
    config: &'a ComposeConfig,
    quote_chars: Vec<char>,
    stops: TabStops,
    metrics: MonospaceMetrics,
}

impl<'a> Reflow<'a> {
    #[must_use]
    pub fn new(config: &'a ComposeConfig) -> Self {
        Self {
            config,
            quote_chars: config.quote_char_list(),
            stops: config.tab_stop_list(),
            metrics: MonospaceMetrics::columns(),
        }
    }

    /// Start of the signature separator line, if there is one.
    #[must_use]
    pub fn signature_start(&self, buffer: &TextBuffer) -> Option<usize> {
        let separator = &self.config.signature_separator;
        if separator.is_empty() {
            return None;
        }
        let len = buffer.len();
        let mut ls = 0;
        loop {
            let le = line_end(buffer, ls);
            let line: Vec<char> = buffer.chars_in(ls..le).collect();
            if is_sig_separator(&line, separator) {
                return Some(ls);
            }
            if le >= len {
                return None;
            }
            ls = le + 1;
        }
    }

    /// Start of the paragraph holding `index`.
    #[must_use]
    pub fn paragraph_start(&self, buffer: &TextBuffer, index: usize) -> usize {
        let mut cur = self.line_info(buffer, line_start(buffer, index));
        while cur.start > 0 {
            if cur.blank || cur.item.is_some() || cur.separator {
                break;
            }
            let prev = self.line_info(buffer, line_start(buffer, cur.start - 1));
            if !self.continues(buffer, &prev, &cur) {
                break;
            }
            cur = prev;
        }
        cur.start
    }

    /// Reflow the paragraph holding `index`.
    ///
    /// Quoted and `no_wrap` paragraphs are only rewrapped when `force` is
    /// set (or `linewrap_quote` is, for quotes); their tags are refreshed
    /// either way.
    pub fn beautify_paragraph(&self, buffer: &mut TextBuffer, index: usize, force: bool) -> ReflowReport {
        let mut sig = self.signature_start(buffer);
        let index = index.min(buffer.len());
        let report = if sig.is_some_and(|s| index >= s) {
            ReflowReport {
                next: buffer.len(),
                ..ReflowReport::default()
            }
        } else {
            let ps = self.paragraph_start(buffer, index);
            self.reflow_from(buffer, ps, force, &mut sig)
        };
        self.tag_signature(buffer, sig);
        report
    }

    /// Reflow every paragraph before the signature.
    pub fn reflow_all(&self, buffer: &mut TextBuffer, force: bool) -> ReflowReport {
        let mut sig = self.signature_start(buffer);
        let mut total = ReflowReport::default();
        let mut index = 0;
        while index < buffer.len() && sig.is_none_or(|s| index < s) {
            let report = self.reflow_from(buffer, index, force, &mut sig);
            index = report.next.max(index + 1);
            total.absorb(report);
        }
        total.next = buffer.len();
        self.tag_signature(buffer, sig);
        debug!(
            broken = total.broken,
            joined = total.joined,
            edits = total.edits.len(),
            "buffer reflowed"
        );
        total
    }

    /// Refresh link, quote and signature tags of the lines touching
    /// `start..end` without changing any text.
    pub fn retag(&self, buffer: &mut TextBuffer, start: usize, end: usize) {
        let end = end.min(buffer.len());
        let mut ls = line_start(buffer, start);
        loop {
            let info = self.line_info(buffer, ls);
            self.tag_line(buffer, &info);
            if info.end >= end || info.end >= buffer.len() {
                break;
            }
            ls = info.end + 1;
        }
        let sig = self.signature_start(buffer);
        self.tag_signature(buffer, sig);
    }

    /// Reflow from the paragraph start `ps` to the end of its paragraph.
    fn reflow_from(
        &self,
        buffer: &mut TextBuffer,
        ps: usize,
        force: bool,
        sig: &mut Option<usize>,
    ) -> ReflowReport {
        let mut report = ReflowReport::default();
        let max = self.config.linewrap_len;
        let ctx = LayoutContext::new(&self.metrics, &self.stops, max);
        let record = |report: &mut ReflowReport, sig: &mut Option<usize>, edit: Edit| {
            *sig = sig.map(|s| edit.map_index(s));
            report.edits.push(edit);
        };

        let head = self.line_info(buffer, ps);
        let indent = match head.item {
            Some(n) => " ".repeat(n),
            // wrapped lines keep the first line's own indent
            None => {
                let quote_len = head.quote.as_ref().map_or(0, |q| q.chars().count());
                buffer.text_range(ps + quote_len, ps + head.prefix_len)
            }
        };
        let mut ls = ps;

        loop {
            let info = self.line_info(buffer, ls);
            if info.blank || info.separator {
                self.tag_line(buffer, &info);
                report.next = (info.end + 1).min(buffer.len());
                break;
            }

            let wrap_ok = force
                || ((info.quote.is_none() || self.config.linewrap_quote)
                    && !buffer.tags().contains(Tag::NoWrap, ls));
            if wrap_ok {
                let content = ls + info.prefix_len;
                let cont = TabCont::at_column(&self.stops, self.columns(buffer, ls, content), 1);
                let lp = find_line_params(buffer, &buffer.find_mark(content), &cont, &ctx);
                let brk = match lp.terminator {
                    LineEnd::WordBreak | LineEnd::TabBreak => Some(lp.end.index()),
                    // an overlong word stays whole; break after it instead
                    LineEnd::HardBreak => {
                        (lp.end.index() + 1..info.end).find(|&i| is_blank(buffer.char_at(i)))
                    }
                    LineEnd::Newline | LineEnd::BufferEnd => None,
                };

                if let Some(ws) = brk {
                    let mut a = ws;
                    while a > content && is_blank(buffer.char_at(a - 1)) {
                        a -= 1;
                    }
                    let mut b = ws + 1;
                    while b < info.end && is_blank(buffer.char_at(b)) {
                        b += 1;
                    }
                    if b >= info.end {
                        // only trailing blanks overflow
                        let edit = buffer.delete(a, b - a);
                        record(&mut report, sig, edit);
                        continue;
                    }
                    let style = buffer.style_at_index(a - 1);
                    let single = b - a == 1 && buffer.char_at(a) == ' ';
                    if !single
                        && self.columns(buffer, ls, a) + 1 + self.word_width(buffer, b, info.end)
                            <= max
                    {
                        // the next word fits once the blanks are collapsed
                        let edit = buffer.delete(a, b - a);
                        record(&mut report, sig, edit);
                        let edit = buffer.insert(a, " ", style);
                        record(&mut report, sig, edit);
                        continue;
                    }
                    let edit = buffer.delete(a, b - a);
                    record(&mut report, sig, edit);
                    let mut insert = String::from("\n");
                    insert.push_str(info.quote.as_deref().unwrap_or(""));
                    insert.push_str(&indent);
                    let edit = buffer.insert(a, &insert, style);
                    record(&mut report, sig, edit);
                    report.broken += 1;
                    trace!(at = a, "line broken");

                    let broken = self.line_info(buffer, ls);
                    self.tag_line(buffer, &broken);
                    ls = a + 1;
                    continue;
                }

                let fits = matches!(lp.terminator, LineEnd::Newline | LineEnd::BufferEnd);
                if fits && info.end < buffer.len() && sig.is_none_or(|s| info.end + 1 < s) {
                    let next = self.line_info(buffer, info.end + 1);
                    let next_ok = force || !buffer.tags().contains(Tag::NoWrap, next.start);
                    if next_ok && self.continues(buffer, &info, &next) {
                        let word_start = next.start + next.prefix_len;
                        let word_width = self.word_width(buffer, word_start, next.end);
                        let at = info.end;
                        let before = buffer.char_at(at - 1);
                        let after = buffer.char_at(word_start);
                        let space = u32::from(!before.is_whitespace());
                        if lp.pixel_width + space + word_width <= max {
                            let style = buffer.style_at_index(at - 1);
                            let edit = buffer.delete(at, word_start - at);
                            record(&mut report, sig, edit);
                            if !before.is_whitespace() && !(is_wide(before) && is_wide(after)) {
                                let edit = buffer.insert(at, " ", style);
                                record(&mut report, sig, edit);
                            }
                            report.joined += 1;
                            trace!(at, "line joined");
                            continue;
                        }
                    }
                }
            }

            self.tag_line(buffer, &info);
            if info.end >= buffer.len() {
                report.next = buffer.len();
                break;
            }
            let next_start = info.end + 1;
            if sig.is_some_and(|s| next_start >= s) {
                report.next = next_start;
                break;
            }
            let next = self.line_info(buffer, next_start);
            if !self.continues(buffer, &info, &next) {
                report.next = next_start;
                break;
            }
            ls = next_start;
        }

        debug!(
            start = ps,
            broken = report.broken,
            joined = report.joined,
            "paragraph reflowed"
        );
        report
    }

    /// Whether `next` continues the paragraph of `prev`, the line before it.
    fn continues(&self, buffer: &TextBuffer, prev: &LineInfo, next: &LineInfo) -> bool {
        !prev.blank
            && !prev.separator
            && !next.blank
            && !next.separator
            && prev.item.is_none()
            && next.item.is_none()
            && prev.quote == next.quote
            && !buffer.tags().contains(Tag::NoJoin, prev.end)
    }

    fn line_info(&self, buffer: &TextBuffer, ls: usize) -> LineInfo {
        let end = line_end(buffer, ls);
        let chars: Vec<char> = buffer.chars_in(ls..end).collect();
        let prefix = quote_prefix(&chars, &self.quote_chars);
        let quote_len = prefix.as_ref().map_or(0, |q| q.len);
        let mut prefix_len = quote_len;
        while prefix_len < chars.len() && is_blank(chars[prefix_len]) {
            prefix_len += 1;
        }
        LineInfo {
            start: ls,
            end,
            quote: prefix
                .as_ref()
                .map(|q| chars[..q.len].iter().collect()),
            level: prefix.map(|q| q.level),
            prefix_len,
            blank: chars[prefix_len..].iter().all(|c| c.is_whitespace()),
            item: item_indent(&chars, quote_len),
            separator: is_sig_separator(&chars, &self.config.signature_separator),
        }
    }

    /// Width of the word starting at `from`, stopping at whitespace or
    /// `end`.
    fn word_width(&self, buffer: &TextBuffer, from: usize, end: usize) -> u32 {
        buffer
            .chars_in(from..end)
            .take_while(|ch| !ch.is_whitespace())
            .map(|ch| self.metrics.char_width(FontId::default(), ch))
            .sum()
    }

    /// Column reached after the characters `from..to`.
    fn columns(&self, buffer: &TextBuffer, from: usize, to: usize) -> u32 {
        let mut tab = TabStopMark::start(&self.stops);
        let mut col = 0;
        for ch in buffer.chars_in(from..to) {
            let w = if ch == '\t' {
                tab.to_next_tab
            } else {
                self.metrics.char_width(FontId::default(), ch)
            };
            tab.advance(&self.stops, w);
            col += w;
        }
        col
    }

    /// Refresh link and quote tags of a finished line.
    fn tag_line(&self, buffer: &mut TextBuffer, info: &LineInfo) {
        let (ls, le) = (info.start, info.end);
        let chars: Vec<char> = buffer.chars_in(ls..le).collect();
        let quote_end = (le + 1).min(buffer.len());
        let recycle = self.config.recycle_quote_colors;
        let tags = buffer.tags_mut();

        tags.remove(Tag::Link, ls..le);
        for link in find_links_in(&chars) {
            tags.apply(Tag::Link, ls + link.range.start..ls + link.range.end);
        }
        for tag in Tag::QUOTES {
            tags.remove(tag, ls..quote_end);
        }
        if let Some(level) = info.level {
            tags.apply(quote_tag_for_level(level, recycle), ls..quote_end);
        }
    }

    /// Tag everything from `sig` on as signature.
    fn tag_signature(&self, buffer: &mut TextBuffer, sig: Option<usize>) {
        let len = buffer.len();
        let tags = buffer.tags_mut();
        tags.remove(Tag::Signature, 0..len);
        if let Some(s) = sig {
            tags.apply(Tag::Signature, s..len);
        }
    }
}

fn is_wide(ch: char) -> bool {
    display_width_char_with_method(ch, WidthMethod::WcWidth) > 1
}

/// Plain column wrap at `width`, ignoring quotes and tags.
///
/// Breaks after the last whitespace or wide character that fits, dropping
/// the whitespace. Lines without a break opportunity are left long.
pub fn hard_wrap(buffer: &mut TextBuffer, width: usize) -> Vec<Edit> {
    let column_width = |ch: char| display_width_char_with_method(ch, WidthMethod::WcWidth).max(1);
    let mut edits = Vec::new();
    // last break opportunity: index after it and the columns up to it
    let mut line_pos = 0;
    let mut line_len = 0;
    let mut cur_len = 0;
    let mut cur = 0;

    while cur < buffer.len() {
        let ch = buffer.char_at(cur);
        if ch == '\n' {
            line_len = 0;
            cur_len = 0;
            cur += 1;
            continue;
        }
        let w = column_width(ch);
        let overflows = cur_len + w > width;
        if overflows && ch.is_whitespace() {
            let style = buffer.style_at_index(cur);
            edits.push(buffer.delete(cur, 1));
            edits.push(buffer.insert(cur, "\n", style));
            line_len = 0;
            cur_len = 0;
            cur += 1;
            continue;
        }
        if overflows && line_len > 0 {
            let before = buffer.char_at(line_pos - 1);
            if before.is_whitespace() {
                edits.push(buffer.delete(line_pos - 1, 1));
                let bw = column_width(before);
                cur -= 1;
                line_pos -= 1;
                cur_len -= bw;
                line_len -= bw;
            }
            let style = buffer.style_at_index(line_pos - 1);
            edits.push(buffer.insert(line_pos, "\n", style));
            // the current character opens the new line
            cur_len = cur_len - line_len + w;
            line_len = 0;
            cur += 2;
            continue;
        }
        if ch.is_whitespace() || w > 1 {
            line_pos = cur + 1;
            line_len = cur_len + w;
        }
        cur_len += w;
        cur += 1;
    }
    edits
}
