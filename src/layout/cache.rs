//! Incremental line layout cache.
//!
//! [`LineCache`] keeps the [`LineParams`] of the region around the viewport:
//! from the start of the logical line holding the top of the view to at
//! least two viewport heights below the top (one screen of lookahead). The
//! head of the cache always starts a logical line, so backward scrolling and
//! edit repair can restart layout from a known state.
//!
//! Edits are repaired locally: the logical lines touched by an edit are laid
//! out again and everything after them is shifted. Marks in the cache are
//! re-derived after every edit, since run handles do not survive edits.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::text::motion::line_start;
use crate::text::{Edit, Mark, TextBuffer};

use super::params::{LineParams, TabCont};
use super::wrap::{LayoutContext, find_line_params};

/// How far [`fetch_lines`] goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchMode {
    /// Stop after this many logical lines; wrapped continuations do not
    /// count.
    Lines(usize),
    /// Stop once the fetched lines are at least this tall.
    Pixels(u32),
}

/// Lay out display lines from `from` onwards.
///
/// Always returns at least one line and never runs past the last line of
/// the buffer.
#[must_use]
pub fn fetch_lines(
    buffer: &TextBuffer,
    from: &Mark,
    tab_cont: &TabCont,
    mode: FetchMode,
    ctx: &LayoutContext<'_>,
) -> Vec<LineParams> {
    let mut lines = Vec::new();
    let mut mark = from.clone();
    let mut cont = *tab_cont;
    let mut logical = 0;
    let mut height = 0;

    loop {
        let line = find_line_params(buffer, &mark, &cont, ctx);
        if line.ends_logical_line() {
            logical += 1;
        }
        height += line.height();
        let last = line.is_last();
        if !last {
            mark = line.end.clone();
            buffer.advance_mark(&mut mark, 1);
            cont = line.tab_cont_next;
        }
        lines.push(line);

        let done = match mode {
            FetchMode::Lines(n) => logical >= n,
            FetchMode::Pixels(h) => height >= h,
        };
        if last || done {
            return lines;
        }
    }
}

/// Edits merged into one: `removed` characters at `at` were replaced by
/// `inserted` characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Splice {
    at: usize,
    removed: usize,
    inserted: usize,
}

impl Splice {
    const fn of(edit: Edit) -> Self {
        match edit {
            Edit::Insert { at, len } => Self {
                at,
                removed: 0,
                inserted: len,
            },
            Edit::Delete { at, len } => Self {
                at,
                removed: len,
                inserted: 0,
            },
        }
    }

    /// Extend by `edit`, whose position refers to the text after `self`.
    fn then(self, edit: Edit) -> Self {
        let next = Self::of(edit);
        let mut at = self.at;
        let mut end = self.at + self.inserted;
        let mut removed = self.removed;
        // untouched text between the two edits becomes part of the splice
        if next.at < at {
            removed += at - next.at;
            at = next.at;
        }
        if next.at + next.removed > end {
            removed += next.at + next.removed - end;
            end = next.at + next.removed;
        }
        Self {
            at,
            removed,
            inserted: end - at - next.removed + next.inserted,
        }
    }

    const fn delta(self) -> isize {
        self.inserted as isize - self.removed as isize
    }

    /// Where old position `index` ends up; positions inside the replaced
    /// text move to its start.
    const fn map_index_before(self, index: usize) -> usize {
        if index <= self.at {
            index
        } else if index >= self.at + self.removed {
            index - self.removed + self.inserted
        } else {
            self.at
        }
    }
}

/// Lay out the whole buffer.
#[must_use]
pub fn layout_all(buffer: &TextBuffer, ctx: &LayoutContext<'_>) -> Vec<LineParams> {
    fetch_lines(
        buffer,
        &buffer.start_mark(),
        &TabCont::line_start(ctx.tab_stops),
        FetchMode::Lines(usize::MAX),
        ctx,
    )
}

/// Display lines around the viewport.
#[derive(Clone, Debug, Default)]
pub struct LineCache {
    lines: VecDeque<LineParams>,
    /// Offset of the viewport top below the top of the first cached line.
    scroll_y: u32,
    viewport_height: u32,
}

impl LineCache {
    /// Create an empty cache for a viewport `viewport_height` units tall.
    #[must_use]
    pub fn new(viewport_height: u32) -> Self {
        Self {
            lines: VecDeque::new(),
            scroll_y: 0,
            viewport_height,
        }
    }

    #[must_use]
    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    /// Change the viewport height. Takes effect on the next rebuild.
    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height;
    }

    /// All cached lines, top to bottom.
    #[must_use]
    pub fn lines(&self) -> &VecDeque<LineParams> {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll_y = 0;
    }

    /// Offset of the viewport top below the first cached line.
    #[must_use]
    pub fn scroll_y(&self) -> u32 {
        self.scroll_y
    }

    /// Combined height of the cached lines.
    #[must_use]
    pub fn total_height(&self) -> u32 {
        self.lines.iter().map(LineParams::height).sum()
    }

    fn line_top(&self, k: usize) -> u32 {
        self.lines.iter().take(k).map(LineParams::height).sum()
    }

    /// Position in [`lines`](Self::lines) of the first onscreen line.
    #[must_use]
    pub fn top_line(&self) -> Option<usize> {
        let mut y = 0;
        for (k, line) in self.lines.iter().enumerate() {
            y += line.height();
            if self.scroll_y < y {
                return Some(k);
            }
        }
        self.lines.len().checked_sub(1)
    }

    /// Index of the first character on screen.
    #[must_use]
    pub fn top_index(&self) -> usize {
        self.top_line().map_or(0, |k| self.lines[k].start.index())
    }

    /// Start of the logical line holding the top of the view.
    #[must_use]
    pub fn first_line_start(&self) -> usize {
        let Some(mut k) = self.top_line() else {
            return 0;
        };
        while k > 0 && !self.lines[k - 1].ends_logical_line() {
            k -= 1;
        }
        self.lines[k].start.index()
    }

    /// Position in [`lines`](Self::lines) of the line holding `index`.
    #[must_use]
    pub fn line_index_at(&self, index: usize) -> Option<usize> {
        self.lines.iter().position(|line| line.contains(index))
    }

    /// Lines at least partly inside the viewport.
    pub fn visible_lines(&self) -> impl Iterator<Item = &LineParams> + '_ {
        let top = self.scroll_y;
        let bottom = self.scroll_y + self.viewport_height;
        let mut y = 0;
        self.lines.iter().filter(move |line| {
            let line_top = y;
            y += line.height();
            y > top && line_top < bottom
        })
    }

    /// Lay out again with the display line holding `anchor` at the top.
    pub fn rebuild(&mut self, buffer: &TextBuffer, anchor: usize, ctx: &LayoutContext<'_>) {
        let anchor = anchor.min(buffer.len());
        let from = buffer.find_mark(line_start(buffer, anchor));
        self.lines = fetch_lines(
            buffer,
            &from,
            &TabCont::line_start(ctx.tab_stops),
            FetchMode::Lines(1),
            ctx,
        )
        .into();
        let k = self.line_index_at(anchor).unwrap_or(0);
        self.scroll_y = self.line_top(k);
        self.ensure_coverage(buffer, ctx);
        debug!(anchor, lines = self.lines.len(), "line cache rebuilt");
    }

    /// Repair the cache after `edit` has been applied to `buffer`.
    pub fn apply_edit(&mut self, buffer: &TextBuffer, edit: Edit, ctx: &LayoutContext<'_>) {
        self.repair(buffer, Splice::of(edit), ctx);
    }

    /// Repair the cache after `edits`, applied in order, brought `buffer`
    /// to its current state.
    ///
    /// The edits are merged into one replacement first, since the
    /// positions of all but the last refer to text that no longer exists.
    pub fn apply_edits(&mut self, buffer: &TextBuffer, edits: &[Edit], ctx: &LayoutContext<'_>) {
        let Some((&first, rest)) = edits.split_first() else {
            return;
        };
        let splice = rest
            .iter()
            .fold(Splice::of(first), |splice, &edit| splice.then(edit));
        self.repair(buffer, splice, ctx);
    }

    fn repair(&mut self, buffer: &TextBuffer, splice: Splice, ctx: &LayoutContext<'_>) {
        let Some(top) = self.top_line() else {
            return;
        };
        let Splice {
            at,
            removed,
            inserted,
        } = splice;
        let old_end = at + removed;
        let delta = splice.delta();
        let intra = self.scroll_y - self.line_top(top);
        let anchor = splice
            .map_index_before(self.lines[top].start.index())
            .min(buffer.len());
        let head = self.lines[0].start.index();

        if old_end < head {
            // entirely above the cache
            self.resync_marks(buffer, 0, delta);
        } else {
            let ps = line_start(buffer, at);
            let i0 = self
                .lines
                .iter()
                .position(|line| line.start.index() >= ps)
                .unwrap_or(self.lines.len());
            let i1 = (i0 + 1..self.lines.len())
                .find(|&k| {
                    self.lines[k - 1].ends_logical_line() && self.lines[k].start.index() > old_end
                })
                .unwrap_or(self.lines.len());

            let mut fresh = Vec::new();
            if i0 < self.lines.len() {
                let cont = TabCont::line_start(ctx.tab_stops);
                let from = buffer.find_mark(ps);
                if i1 < self.lines.len() {
                    let target = self.lines[i1].start.index().saturating_add_signed(delta);
                    let mut from = from;
                    loop {
                        let batch = fetch_lines(buffer, &from, &cont, FetchMode::Lines(1), ctx);
                        let Some(last) = batch.last() else { break };
                        let done = last.is_last() || last.next_start() >= target;
                        if !done {
                            from = buffer.find_mark_near(last.next_start(), &last.end);
                        }
                        fresh.extend(batch);
                        if done {
                            break;
                        }
                    }
                } else {
                    let newlines = buffer.chars_in(at..at + inserted).filter(|&c| c == '\n').count();
                    fresh = fetch_lines(buffer, &from, &cont, FetchMode::Lines(newlines + 1), ctx);
                }
            }

            let reaches_end = fresh.last().is_some_and(LineParams::is_last);
            let mut tail: Vec<LineParams> = self.lines.drain(i0..).skip(i1 - i0).collect();
            if reaches_end {
                tail.clear();
            }
            trace!(
                ?splice,
                replaced = i1 - i0,
                fetched = fresh.len(),
                shifted = tail.len(),
                "line cache repaired"
            );
            let kept = i0 + fresh.len();
            self.lines.extend(fresh);
            self.lines.extend(tail);
            self.resync_marks(buffer, kept, delta);
        }

        self.extend_to(buffer, anchor, ctx);
        let k = self.line_index_at(anchor).unwrap_or(0);
        let height = self.lines.get(k).map_or(1, LineParams::height);
        self.scroll_y = self.line_top(k) + intra.min(height - 1);
        self.ensure_coverage(buffer, ctx);
    }

    /// Scroll the view down by `px`.
    pub fn scroll_down(&mut self, buffer: &TextBuffer, px: u32, ctx: &LayoutContext<'_>) {
        if self.lines.is_empty() {
            self.rebuild(buffer, 0, ctx);
        }
        self.scroll_y += px;
        self.ensure_coverage(buffer, ctx);
        if let Some(last) = self.lines.back() {
            if last.is_last() {
                let last_top = self.total_height() - last.height();
                self.scroll_y = self.scroll_y.min(last_top);
            }
        }
    }

    /// Scroll the view up by `px`, laying out earlier paragraphs as needed.
    pub fn scroll_up(&mut self, buffer: &TextBuffer, px: u32, ctx: &LayoutContext<'_>) {
        if self.lines.is_empty() {
            self.rebuild(buffer, 0, ctx);
        }
        while self.scroll_y < px {
            let Some(first) = self.lines.front() else {
                break;
            };
            let head = first.start.index();
            if head == 0 {
                break;
            }
            let from = buffer.find_mark_near(line_start(buffer, head - 1), &first.start);
            let paragraph = fetch_lines(
                buffer,
                &from,
                &TabCont::line_start(ctx.tab_stops),
                FetchMode::Lines(1),
                ctx,
            );
            self.scroll_y += paragraph.iter().map(LineParams::height).sum::<u32>();
            for line in paragraph.into_iter().rev() {
                self.lines.push_front(line);
            }
        }
        self.scroll_y = self.scroll_y.saturating_sub(px);
        self.ensure_coverage(buffer, ctx);
    }

    /// Scroll to `px` below the top of the buffer.
    pub fn scroll_to(&mut self, buffer: &TextBuffer, px: u32, ctx: &LayoutContext<'_>) {
        self.clear();
        self.rebuild(buffer, 0, ctx);
        self.scroll_down(buffer, px, ctx);
    }

    /// Bring the display line holding `index` to the top of the view.
    pub fn scroll_to_index(&mut self, buffer: &TextBuffer, index: usize, ctx: &LayoutContext<'_>) {
        self.rebuild(buffer, index, ctx);
    }

    /// Check structural invariants against `buffer`.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn check_invariants(&self, buffer: &TextBuffer) -> Result<(), String> {
        let Some(first) = self.lines.front() else {
            return Err("cache is empty".to_string());
        };
        let head = first.start.index();
        if head > 0 && buffer.char_at(head - 1) != '\n' {
            return Err(format!("head {head} does not start a logical line"));
        }
        for (k, line) in self.lines.iter().enumerate() {
            if !buffer.is_mark_consistent(&line.start) || !buffer.is_mark_consistent(&line.end) {
                return Err(format!("stale mark in line {k}"));
            }
            if line.is_last() {
                if k + 1 != self.lines.len() {
                    return Err(format!("line {k} ends the buffer but is not last"));
                }
            } else if line.next_start() <= line.start.index() {
                return Err(format!("line {k} makes no progress"));
            }
            if let Some(next) = self.lines.get(k + 1) {
                if next.start.index() != line.next_start() {
                    return Err(format!("gap between lines {k} and {}", k + 1));
                }
            }
        }
        let reaches_end = self.lines.back().is_some_and(LineParams::is_last);
        if !reaches_end && self.total_height() < self.scroll_y + self.viewport_height {
            return Err("cache does not cover the viewport".to_string());
        }
        Ok(())
    }

    fn ensure_coverage(&mut self, buffer: &TextBuffer, ctx: &LayoutContext<'_>) {
        if self.lines.is_empty() {
            self.lines.extend(fetch_lines(
                buffer,
                &buffer.start_mark(),
                &TabCont::line_start(ctx.tab_stops),
                FetchMode::Lines(1),
                ctx,
            ));
        }
        let want = self.scroll_y + 2 * self.viewport_height.max(1);
        let mut height = self.total_height();
        while height < want {
            let Some(last) = self.lines.back() else {
                break;
            };
            if last.is_last() {
                break;
            }
            let from = buffer.find_mark_near(last.next_start(), &last.end);
            let cont = last.tab_cont_next;
            for line in fetch_lines(buffer, &from, &cont, FetchMode::Lines(1), ctx) {
                height += line.height();
                self.lines.push_back(line);
            }
        }
        self.evict();
    }

    /// Keep lines within one viewport above and two below the top.
    fn evict(&mut self) {
        let vh = self.viewport_height.max(1);
        loop {
            let Some(n) = self.lines.iter().position(LineParams::ends_logical_line) else {
                break;
            };
            if n + 1 >= self.lines.len() {
                break;
            }
            let h: u32 = self.lines.iter().take(n + 1).map(LineParams::height).sum();
            if h + vh > self.scroll_y {
                break;
            }
            self.lines.drain(..=n);
            self.scroll_y -= h;
        }

        let limit = self.scroll_y + 2 * vh;
        let mut top = 0;
        let mut keep = 0;
        for line in &self.lines {
            if top >= limit {
                break;
            }
            top += line.height();
            keep += 1;
        }
        self.lines.truncate(keep.max(1));
    }

    /// Lay out further lines until `index` is covered.
    fn extend_to(&mut self, buffer: &TextBuffer, index: usize, ctx: &LayoutContext<'_>) {
        while let Some(last) = self.lines.back() {
            if last.is_last() || last.contains(index) || last.start.index() > index {
                break;
            }
            let from = buffer.find_mark_near(last.next_start(), &last.end);
            let cont = last.tab_cont_next;
            let batch = fetch_lines(buffer, &from, &cont, FetchMode::Lines(1), ctx);
            self.lines.extend(batch);
        }
    }

    /// Re-derive every mark. Lines from `shifted` on still hold indices
    /// from before an edit of length change `delta`.
    fn resync_marks(&mut self, buffer: &TextBuffer, shifted: usize, delta: isize) {
        let mut hint = buffer.point().clone();
        for (k, line) in self.lines.iter_mut().enumerate() {
            let (start, end) = if k >= shifted {
                (
                    line.start.index().saturating_add_signed(delta),
                    line.end.index().saturating_add_signed(delta),
                )
            } else {
                (line.start.index(), line.end.index())
            };
            line.start = buffer.find_mark_near(start, &hint);
            line.end = buffer.find_mark_near(end, &line.start);
            hint = line.end.clone();
        }
    }
}
