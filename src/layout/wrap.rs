//! Line-break engine.
//!
//! [`find_line_params`] lays out a single display line: it walks forward
//! from a mark, measuring each character through [`CharMetrics`], until a
//! newline, the end of the buffer, or the wrap width stops it.
//!
//! Every display line except an empty last one holds at least one
//! character, so callers looping over lines always make progress, even
//! when a single glyph is wider than the view.

use crate::link::{LinkSpan, find_links_in};
use crate::metrics::CharMetrics;
use crate::text::motion::line_end;
use crate::text::{Mark, TextBuffer};

use super::params::{LineEnd, LineParams, TabCont, TabStops};

/// Everything the engine needs besides the text.
#[derive(Clone, Copy)]
pub struct LayoutContext<'a> {
    pub metrics: &'a dyn CharMetrics,
    pub tab_stops: &'a TabStops,
    /// Widest a line may be, in metric units.
    pub max_width: u32,
    /// Break at whitespace rather than between any two characters.
    pub word_wrap: bool,
    /// Break overlong lines at all.
    pub line_wrap: bool,
}

impl<'a> LayoutContext<'a> {
    /// Word- and line-wrapping context.
    #[must_use]
    pub const fn new(metrics: &'a dyn CharMetrics, tab_stops: &'a TabStops, max_width: u32) -> Self {
        Self {
            metrics,
            tab_stops,
            max_width,
            word_wrap: true,
            line_wrap: true,
        }
    }

    #[must_use]
    pub const fn with_word_wrap(mut self, word_wrap: bool) -> Self {
        self.word_wrap = word_wrap;
        self
    }

    #[must_use]
    pub const fn with_line_wrap(mut self, line_wrap: bool) -> Self {
        self.line_wrap = line_wrap;
        self
    }
}

enum Break {
    /// At the whitespace with this index.
    Word(usize),
    /// After the character with this index.
    Hard(usize),
    /// Inside the current tab, keeping this many of its columns.
    Tab(u32),
}

/// Lay out the display line starting at `start`.
///
/// `tab_cont` is the state the previous display line handed over; use
/// [`TabCont::line_start`] at the start of a paragraph.
#[must_use]
pub fn find_line_params(
    buffer: &TextBuffer,
    start: &Mark,
    tab_cont: &TabCont,
    ctx: &LayoutContext<'_>,
) -> LineParams {
    let stops = ctx.tab_stops;
    let first = start.index();
    let len = buffer.len();

    let mut end = start.clone();
    let mut width = tab_cont.pixel_offset;
    let mut tab_mark = tab_cont.tab_start;
    let mut ascent = 0;
    let mut descent = 0;
    // width of the line before each placed character
    let mut placed: Vec<u32> = Vec::new();
    // a link starting the line is never split
    let mut no_break_until = first;
    let mut links: Option<Vec<LinkSpan>> = None;

    let line = |end: Mark,
                terminator: LineEnd,
                pixel_width: u32,
                displayable_chars: usize,
                ascent: u32,
                descent: u32,
                next: TabCont| {
        LineParams {
            start: start.clone(),
            end,
            terminator,
            pixel_width,
            displayable_chars,
            wraps: !matches!(terminator, LineEnd::Newline | LineEnd::BufferEnd),
            ascent,
            descent,
            tab_cont: *tab_cont,
            tab_cont_next: next,
        }
    };

    while end.index() < len {
        let index = end.index();
        let ch = buffer.char_at(index);
        let font = buffer.style_at(&end).font;

        if ch == '\n' {
            if ascent == 0 && descent == 0 {
                ascent = ctx.metrics.ascent(font);
                descent = ctx.metrics.descent(font);
            }
            return line(
                end,
                LineEnd::Newline,
                width,
                index - first,
                ascent,
                descent,
                TabCont::line_start(stops),
            );
        }

        let space = ctx.metrics.char_width(font, ' ').max(1);
        let (char_width, columns) = if ch == '\t' {
            (tab_mark.to_next_tab * space, tab_mark.to_next_tab)
        } else {
            let w = ctx.metrics.char_width(font, ch);
            (w, w.div_ceil(space))
        };

        let overflows = ctx.line_wrap
            && index > first
            && index >= no_break_until
            && width + char_width > ctx.max_width;
        if overflows {
            let brk = if ch == '\t' {
                match ctx.max_width.saturating_sub(width) / space {
                    0 => Some(Break::Hard(index - 1)),
                    avail => Some(Break::Tab(avail)),
                }
            } else if !ctx.word_wrap {
                Some(Break::Hard(index - 1))
            } else if let Some(ws) = (first + 1..=index)
                .rev()
                .find(|&j| buffer.char_at(j).is_whitespace())
            {
                Some(Break::Word(ws))
            } else {
                let spans = links.get_or_insert_with(|| {
                    let chars: Vec<char> = buffer.chars_in(first..line_end(buffer, first)).collect();
                    find_links_in(&chars)
                });
                let at = index - first;
                match spans.iter().find(|l| l.range.start < at && at < l.range.end) {
                    Some(link) if link.range.start > 0 => {
                        Some(Break::Hard(first + link.range.start - 1))
                    }
                    Some(link) => {
                        no_break_until = first + link.range.end;
                        None
                    }
                    None => Some(Break::Hard(index - 1)),
                }
            };

            let width_before = |i: usize| placed.get(i - first).copied().unwrap_or(width);
            match brk {
                Some(Break::Word(ws)) => {
                    return line(
                        buffer.find_mark_near(ws, &end),
                        LineEnd::WordBreak,
                        width_before(ws),
                        ws - first,
                        ascent,
                        descent,
                        TabCont::line_start(stops),
                    );
                }
                Some(Break::Hard(last)) => {
                    return line(
                        buffer.find_mark_near(last, &end),
                        LineEnd::HardBreak,
                        width_before(last + 1),
                        last + 1 - first,
                        ascent,
                        descent,
                        TabCont::line_start(stops),
                    );
                }
                Some(Break::Tab(avail)) => {
                    let rest = tab_mark.to_next_tab - avail;
                    return line(
                        end,
                        LineEnd::TabBreak,
                        width + avail * space,
                        index + 1 - first,
                        ascent.max(ctx.metrics.ascent(font)),
                        descent.max(ctx.metrics.descent(font)),
                        TabCont::at_column(stops, rest, space),
                    );
                }
                None => {}
            }
        }

        placed.push(width);
        width += char_width;
        tab_mark.advance(stops, columns);
        ascent = ascent.max(ctx.metrics.ascent(font));
        descent = descent.max(ctx.metrics.descent(font));
        buffer.advance_mark(&mut end, 1);
    }

    if ascent == 0 && descent == 0 {
        let font = buffer.style_at(&end).font;
        ascent = ctx.metrics.ascent(font);
        descent = ctx.metrics.descent(font);
    }
    line(
        end,
        LineEnd::BufferEnd,
        width,
        len - first,
        ascent,
        descent,
        TabCont::line_start(stops),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MonospaceMetrics;
    use crate::style::Style;

    fn lay(text: &str, width: u32, word_wrap: bool, line_wrap: bool) -> Vec<(String, LineEnd)> {
        let buffer = TextBuffer::with_text(text, Style::NONE);
        let metrics = MonospaceMetrics::columns();
        let stops = TabStops::default();
        let ctx = LayoutContext::new(&metrics, &stops, width)
            .with_word_wrap(word_wrap)
            .with_line_wrap(line_wrap);
        let mut out = Vec::new();
        let mut mark = buffer.start_mark();
        let mut cont = TabCont::line_start(&stops);
        loop {
            let lp = find_line_params(&buffer, &mark, &cont, &ctx);
            let shown = lp.visible_range();
            out.push((buffer.text_range(shown.start, shown.end), lp.terminator));
            if lp.is_last() {
                break;
            }
            assert!(lp.next_start() > lp.start.index(), "no progress at {}", lp.start.index());
            mark = buffer.find_mark(lp.next_start());
            cont = lp.tab_cont_next;
        }
        out
    }

    fn texts(lines: &[(String, LineEnd)]) -> Vec<&str> {
        lines.iter().map(|(s, _)| s.as_str()).collect()
    }

    #[test]
    fn test_word_wrap_at_spaces() {
        let lines = lay("aaaa bbbb cccc", 5, true, true);
        assert_eq!(texts(&lines), vec!["aaaa", "bbbb", "cccc"]);
        assert_eq!(lines[0].1, LineEnd::WordBreak);
        assert_eq!(lines[2].1, LineEnd::BufferEnd);
    }

    #[test]
    fn test_newline_terminates() {
        let lines = lay("ab\ncd\n", 80, true, true);
        assert_eq!(texts(&lines), vec!["ab", "cd", ""]);
        assert_eq!(lines[1].1, LineEnd::Newline);
        assert_eq!(lines[2].1, LineEnd::BufferEnd);
    }

    #[test]
    fn test_single_word_hard_breaks() {
        let lines = lay("abcdefgh", 3, true, true);
        assert_eq!(texts(&lines), vec!["abc", "def", "gh"]);
        assert_eq!(lines[0].1, LineEnd::HardBreak);
    }

    #[test]
    fn test_char_wrap_without_word_wrap() {
        let lines = lay("ab cd", 4, false, true);
        assert_eq!(texts(&lines), vec!["ab c", "d"]);
    }

    #[test]
    fn test_no_line_wrap_keeps_overlong_line() {
        let lines = lay("aaaa bbbb cccc", 5, true, false);
        assert_eq!(texts(&lines), vec!["aaaa bbbb cccc"]);
    }

    #[test]
    fn test_url_never_split() {
        let lines = lay("http://example.com/long/path rest", 10, true, true);
        assert_eq!(texts(&lines), vec!["http://example.com/long/path", "rest"]);
    }

    #[test]
    fn test_break_before_url_inside_word() {
        let lines = lay("(http://example.com/x", 10, true, true);
        assert_eq!(texts(&lines), vec!["(", "http://example.com/x"]);
    }

    #[test]
    fn test_wide_chars_in_narrow_view() {
        let lines = lay("日本語", 1, true, true);
        assert_eq!(texts(&lines), vec!["日", "本", "語"]);
        let lines = lay("日本語", 4, true, true);
        assert_eq!(texts(&lines), vec!["日本", "語"]);
    }

    #[test]
    fn test_tab_widths_and_tab_break() {
        let buffer = TextBuffer::with_text("ab\tc", Style::NONE);
        let metrics = MonospaceMetrics::columns();
        let stops = TabStops::default();
        let ctx = LayoutContext::new(&metrics, &stops, 80);
        let lp = find_line_params(&buffer, &buffer.start_mark(), &TabCont::line_start(&stops), &ctx);
        // the tab fills columns 2..8
        assert_eq!(lp.pixel_width, 9);

        let ctx = LayoutContext::new(&metrics, &stops, 5);
        let lp = find_line_params(&buffer, &buffer.start_mark(), &TabCont::line_start(&stops), &ctx);
        assert_eq!(lp.terminator, LineEnd::TabBreak);
        assert_eq!(lp.end.index(), 2);
        assert_eq!(lp.pixel_width, 5);
        assert_eq!(lp.displayable_chars, 3);
        // three of the tab's six columns spill over
        assert_eq!(lp.tab_cont_next.pixel_offset, 3);

        let next = buffer.find_mark(lp.next_start());
        let rest = find_line_params(&buffer, &next, &lp.tab_cont_next, &ctx);
        assert_eq!(rest.pixel_width, 4);
        assert_eq!(rest.terminator, LineEnd::BufferEnd);
    }

    #[test]
    fn test_tab_with_no_room_breaks_before_it() {
        let lines = lay("abcde\tf", 5, false, true);
        assert_eq!(texts(&lines), vec!["abcde", "\t", "f"]);
        assert_eq!(lines[0].1, LineEnd::HardBreak);
    }

    #[test]
    fn test_empty_buffer_has_one_line() {
        let lines = lay("", 10, true, true);
        assert_eq!(lines, vec![(String::new(), LineEnd::BufferEnd)]);
    }

    #[test]
    fn test_line_height_uses_metrics() {
        let buffer = TextBuffer::with_text("x", Style::NONE);
        let metrics = MonospaceMetrics::with_cell(8, 12, 4);
        let stops = TabStops::default();
        let ctx = LayoutContext::new(&metrics, &stops, 800);
        let lp = find_line_params(&buffer, &buffer.start_mark(), &TabCont::line_start(&stops), &ctx);
        assert_eq!(lp.height(), 16);
        assert_eq!(lp.pixel_width, 8);
    }
}
