//! Line parameters and tab stops.

use std::ops::Range;

use crate::text::Mark;

/// Tab width used when no usable stop is configured.
pub const DEFAULT_TAB_WIDTH: u32 = 8;

/// Tab stop widths in columns.
///
/// Stops are consumed left to right; once the list runs out every further
/// stop is `default_width` wide. Zero widths fall back to
/// [`DEFAULT_TAB_WIDTH`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabStops {
    stops: Vec<u32>,
    default_width: u32,
}

impl Default for TabStops {
    fn default() -> Self {
        Self::uniform(DEFAULT_TAB_WIDTH)
    }
}

impl TabStops {
    /// Explicit stops followed by `default_width`-wide ones.
    #[must_use]
    pub fn new(stops: Vec<u32>, default_width: u32) -> Self {
        Self {
            stops,
            default_width,
        }
    }

    /// Every stop `width` columns apart.
    #[must_use]
    pub fn uniform(width: u32) -> Self {
        Self::new(Vec::new(), width)
    }

    /// Width of the stop at position `index`.
    #[must_use]
    pub fn width_at(&self, index: usize) -> u32 {
        let width = self.stops.get(index).copied().unwrap_or(self.default_width);
        if width == 0 {
            if self.default_width == 0 {
                DEFAULT_TAB_WIDTH
            } else {
                self.default_width
            }
        } else {
            width
        }
    }
}

/// Position within the tab stop list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TabStopMark {
    /// Which stop the current column belongs to.
    pub stop: usize,
    /// Columns left before the next stop.
    pub to_next_tab: u32,
}

impl TabStopMark {
    /// Mark for column 0.
    #[must_use]
    pub fn start(stops: &TabStops) -> Self {
        Self {
            stop: 0,
            to_next_tab: stops.width_at(0),
        }
    }

    /// Move forward by `columns`.
    pub fn advance(&mut self, stops: &TabStops, columns: u32) {
        let mut columns = columns;
        while columns > 0 {
            if columns < self.to_next_tab {
                self.to_next_tab -= columns;
                return;
            }
            columns -= self.to_next_tab;
            self.stop += 1;
            self.to_next_tab = stops.width_at(self.stop);
        }
    }
}

/// State carried from one display line into the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TabCont {
    /// Tab stop position at the start of the line.
    pub tab_start: TabStopMark,
    /// Width already occupied when the line starts, e.g. the part of a
    /// tab that did not fit on the previous line.
    pub pixel_offset: u32,
}

impl TabCont {
    /// Fresh state for the first display line of a paragraph.
    #[must_use]
    pub fn line_start(stops: &TabStops) -> Self {
        Self {
            tab_start: TabStopMark::start(stops),
            pixel_offset: 0,
        }
    }

    /// State for a line whose first `columns` columns are already taken.
    #[must_use]
    pub fn at_column(stops: &TabStops, columns: u32, column_width: u32) -> Self {
        let mut tab_start = TabStopMark::start(stops);
        tab_start.advance(stops, columns);
        Self {
            tab_start,
            pixel_offset: columns * column_width,
        }
    }
}

/// How a display line ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineEnd {
    /// At a `'\n'`, which is the line's terminator.
    Newline,
    /// Word-wrapped; the terminator is the whitespace broken at.
    WordBreak,
    /// Broken between characters; the terminator is the last character
    /// shown on the line.
    HardBreak,
    /// Broken inside a tab; the terminator is the tab.
    TabBreak,
    /// At the end of the buffer; the terminator mark is the end mark.
    BufferEnd,
}

/// One displayed line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineParams {
    /// First character of the line.
    pub start: Mark,
    /// The terminator (see [`LineEnd`]).
    pub end: Mark,
    pub terminator: LineEnd,
    /// Width of the drawn part, including any leading tab continuation.
    pub pixel_width: u32,
    /// Characters drawn, counted from `start`.
    pub displayable_chars: usize,
    /// The paragraph continues on the next display line.
    pub wraps: bool,
    pub ascent: u32,
    pub descent: u32,
    /// State this line started with.
    pub tab_cont: TabCont,
    /// State the following display line starts with.
    pub tab_cont_next: TabCont,
}

impl LineParams {
    /// Height of the line, never zero.
    #[must_use]
    pub fn height(&self) -> u32 {
        (self.ascent + self.descent).max(1)
    }

    /// Index where the next display line starts.
    #[must_use]
    pub fn next_start(&self) -> usize {
        match self.terminator {
            LineEnd::BufferEnd => self.end.index(),
            _ => self.end.index() + 1,
        }
    }

    /// Every character the line owns, terminator included.
    #[must_use]
    pub fn char_range(&self) -> Range<usize> {
        self.start.index()..self.next_start()
    }

    /// Characters actually drawn.
    #[must_use]
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.start.index();
        start..start + self.displayable_chars
    }

    /// Whether this is the last line of the buffer.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.terminator == LineEnd::BufferEnd
    }

    /// Whether the logical line ends here, i.e. the next display line (if
    /// any) starts a new paragraph of the cache.
    #[must_use]
    pub fn ends_logical_line(&self) -> bool {
        matches!(self.terminator, LineEnd::Newline | LineEnd::BufferEnd)
    }

    /// Whether character `index` belongs to this line.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        let start = self.start.index();
        if self.is_last() {
            (start..=self.end.index()).contains(&index)
        } else {
            (start..self.next_start()).contains(&index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_stops_fallback() {
        let stops = TabStops::new(vec![4, 0, 2], 0);
        assert_eq!(stops.width_at(0), 4);
        assert_eq!(stops.width_at(1), DEFAULT_TAB_WIDTH);
        assert_eq!(stops.width_at(2), 2);
        assert_eq!(stops.width_at(3), DEFAULT_TAB_WIDTH);
        assert_eq!(TabStops::uniform(3).width_at(10), 3);
    }

    #[test]
    fn test_tab_mark_advance() {
        let stops = TabStops::new(vec![4, 2], 8);
        let mut mark = TabStopMark::start(&stops);
        mark.advance(&stops, 3);
        assert_eq!(mark, TabStopMark { stop: 0, to_next_tab: 1 });
        mark.advance(&stops, 1);
        assert_eq!(mark, TabStopMark { stop: 1, to_next_tab: 2 });
        mark.advance(&stops, 5);
        assert_eq!(mark, TabStopMark { stop: 2, to_next_tab: 5 });
    }

    #[test]
    fn test_tab_cont_at_column() {
        let stops = TabStops::uniform(8);
        let cont = TabCont::at_column(&stops, 2, 10);
        assert_eq!(cont.pixel_offset, 20);
        assert_eq!(cont.tab_start.to_next_tab, 6);
        assert_eq!(TabCont::line_start(&stops).pixel_offset, 0);
    }
}
