//! The host-facing compose editor.
//!
//! [`ComposeEditor`] owns a [`TextBuffer`], the [`LineCache`] laid out
//! over it and the [`ComposeConfig`]. Every edit goes through the editor so
//! the cache can follow it, and user edits can trigger autowrap.

use std::ops::Range;

use tracing::{debug, trace};

use crate::error::{Result, check_index, check_range};
use crate::layout::{LayoutContext, LineCache, LineParams, TabStops};
use crate::link::{LinkSpan, find_links_in};
use crate::metrics::{CharMetrics, MonospaceMetrics};
use crate::style::{FontId, Style};
use crate::text::motion::{self, Motion, line_end, line_start};
use crate::text::{Edit, Mark, Tag, TagSet, TextBuffer};

use super::config::ComposeConfig;
use super::quote::quote_text;
use super::reflow::{Reflow, ReflowReport, hard_wrap};

/// Edits longer than this are laid out once at the end instead of
/// incrementally.
pub const FREEZE_LENGTH: usize = 1024;

const DEFAULT_VIEWPORT: (u32, u32) = (80, 24);

/// Where display lines are broken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapWidth {
    /// At the viewport's right edge.
    #[default]
    Viewport,
    /// After this many columns, measured as the width of `'W'`.
    Columns(u32),
    /// After this many metric units.
    Pixels(u32),
}

/// Who made an edit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Origin {
    /// Typed or otherwise requested by the user. Newlines become hard
    /// paragraph breaks and autowrap runs afterwards.
    #[default]
    User,
    /// Made by the program, e.g. loading a draft.
    Automatic,
}

/// Which quote mark [`ComposeEditor::insert_quoted`] uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteKind {
    Reply,
    Forward,
}

/// Editable, wrapped, tagged mail body.
pub struct ComposeEditor {
    buffer: TextBuffer,
    config: ComposeConfig,
    stops: TabStops,
    metrics: Box<dyn CharMetrics + Send>,
    cache: LineCache,
    wrap_width: WrapWidth,
    viewport_width: u32,
    freeze_count: usize,
    /// First line start to rebuild from on thaw.
    frozen_anchor: usize,
    reflowing: bool,
}

impl Default for ComposeEditor {
    fn default() -> Self {
        Self::new(ComposeConfig::default())
    }
}

impl std::fmt::Debug for ComposeEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposeEditor")
            .field("len", &self.buffer.len())
            .field("wrap_width", &self.wrap_width)
            .field("viewport_width", &self.viewport_width)
            .field("lines", &self.cache.len())
            .field("freeze_count", &self.freeze_count)
            .finish_non_exhaustive()
    }
}

impl ComposeEditor {
    /// Create an empty editor measuring in terminal columns.
    #[must_use]
    pub fn new(config: ComposeConfig) -> Self {
        Self::with_metrics(config, MonospaceMetrics::columns())
    }

    /// Create an empty editor measuring with `metrics`.
    #[must_use]
    pub fn with_metrics(config: ComposeConfig, metrics: impl CharMetrics + Send + 'static) -> Self {
        let (width, height) = DEFAULT_VIEWPORT;
        let mut editor = Self {
            buffer: TextBuffer::new(),
            stops: config.tab_stop_list(),
            config,
            metrics: Box::new(metrics),
            cache: LineCache::new(height),
            wrap_width: WrapWidth::Viewport,
            viewport_width: width,
            freeze_count: 0,
            frozen_anchor: 0,
            reflowing: false,
        };
        editor.relayout(0);
        editor
    }

    #[must_use]
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn cache(&self) -> &LineCache {
        &self.cache
    }

    #[must_use]
    pub fn config(&self) -> &ComposeConfig {
        &self.config
    }

    /// Replace the configuration and lay out again.
    pub fn set_config(&mut self, config: ComposeConfig) {
        self.stops = config.tab_stop_list();
        self.config = config;
        self.relayout(self.cache.first_line_start());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Text of `start..end`.
    ///
    /// # Panics
    ///
    /// Panics if the range is reversed or runs past the end.
    #[must_use]
    pub fn text_range(&self, start: usize, end: usize) -> String {
        self.buffer.text_range(start, end)
    }

    /// Replace the whole text, as when loading a draft.
    pub fn set_text(&mut self, text: &str) {
        self.freeze();
        let len = self.buffer.len();
        self.delete_with_origin(0, len, Origin::Automatic);
        self.insert_with_origin(0, text, Style::NONE, Origin::Automatic);
        let len = self.buffer.len();
        Reflow::new(&self.config).retag(&mut self.buffer, 0, len);
        self.buffer.set_point(0);
        self.frozen_anchor = 0;
        self.thaw();
    }

    /// Insert user text at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert(&mut self, index: usize, text: &str, style: Style) -> Edit {
        self.insert_with_origin(index, text, style, Origin::User)
    }

    /// Checked [`insert`](Self::insert).
    pub fn try_insert(&mut self, index: usize, text: &str, style: Style) -> Result<Edit> {
        check_index(index, self.buffer.len())?;
        Ok(self.insert(index, text, style))
    }

    /// Insert `text` at `index` on behalf of `origin`.
    pub fn insert_with_origin(&mut self, index: usize, text: &str, style: Style, origin: Origin) -> Edit {
        let count = text.chars().count();
        let auto_freeze = count > FREEZE_LENGTH;
        if auto_freeze {
            self.freeze();
        }

        let edit = self.buffer.insert(index, text, style);
        if origin == Origin::User {
            for (i, ch) in text.chars().enumerate() {
                if ch == '\n' {
                    self.buffer.tags_mut().apply(Tag::NoJoin, index + i..index + i + 1);
                }
            }
        }
        self.note_edit(edit);
        if origin == Origin::User && self.config.autowrap {
            self.reflow_paragraph(index + count, false);
        }

        if auto_freeze {
            self.thaw();
        }
        edit
    }

    /// Delete `count` characters at `index` on behalf of the user.
    ///
    /// # Panics
    ///
    /// Panics if `index + count > len()`.
    pub fn delete(&mut self, index: usize, count: usize) -> Edit {
        self.delete_with_origin(index, count, Origin::User)
    }

    /// Checked [`delete`](Self::delete).
    pub fn try_delete(&mut self, index: usize, count: usize) -> Result<Edit> {
        check_range(index, index.saturating_add(count), self.buffer.len())?;
        Ok(self.delete(index, count))
    }

    /// Delete `count` characters at `index` on behalf of `origin`.
    pub fn delete_with_origin(&mut self, index: usize, count: usize, origin: Origin) -> Edit {
        let auto_freeze = count > FREEZE_LENGTH;
        if auto_freeze {
            self.freeze();
        }

        let edit = self.buffer.delete(index, count);
        self.note_edit(edit);
        if origin == Origin::User && self.config.autowrap && !self.buffer.is_empty() {
            self.reflow_paragraph(index, false);
        }

        if auto_freeze {
            self.thaw();
        }
        edit
    }

    /// Insert pasted text. It is reflowed when `linewrap_pastes` is set,
    /// and otherwise protected from later reflow with `no_wrap`.
    pub fn paste(&mut self, index: usize, text: &str, style: Style) -> Edit {
        let edit = self.insert_with_origin(index, text, style, Origin::Automatic);
        let end = index + text.chars().count();
        if self.config.linewrap_pastes {
            self.reflow_range(index, end, false);
        } else {
            self.buffer.tags_mut().apply(Tag::NoWrap, index..end);
            Reflow::new(&self.config).retag(&mut self.buffer, index, end);
        }
        edit
    }

    /// Insert `text` at `index` with every line quoted.
    pub fn insert_quoted(&mut self, index: usize, text: &str, kind: QuoteKind) -> Edit {
        let mark = match kind {
            QuoteKind::Reply => &self.config.quote_mark,
            QuoteKind::Forward => &self.config.fw_quote_mark,
        };
        let wrap = self
            .config
            .linewrap_quote
            .then_some(self.config.linewrap_len as usize);
        let quoted = quote_text(text, mark, wrap);
        let end = index + quoted.chars().count();

        let edit = self.insert_with_origin(index, &quoted, Style::NONE, Origin::Automatic);
        if self.config.autowrap {
            self.reflow_range(index, end, false);
        } else {
            Reflow::new(&self.config).retag(&mut self.buffer, index, end);
        }
        edit
    }

    /// Append the signature separator and `signature`.
    pub fn insert_signature(&mut self, signature: &str) -> Edit {
        let len = self.buffer.len();
        let mut block = String::new();
        if len > 0 {
            block.push_str(if self.buffer.char_at(len - 1) == '\n' { "\n" } else { "\n\n" });
        }
        let sig_start = len + block.chars().count();
        block.push_str(&self.config.signature_separator);
        block.push('\n');
        block.push_str(signature);

        let edit = self.insert_with_origin(len, &block, Style::NONE, Origin::Automatic);
        let end = self.buffer.len();
        self.buffer.tags_mut().apply(Tag::Signature, sig_start..end);
        edit
    }

    /// Reflow the paragraph holding `index`.
    ///
    /// Ignored while another reflow is running.
    pub fn reflow_paragraph(&mut self, index: usize, force: bool) -> ReflowReport {
        if self.reflowing {
            trace!(index, "nested reflow ignored");
            return ReflowReport::default();
        }
        self.reflowing = true;
        let report = Reflow::new(&self.config).beautify_paragraph(&mut self.buffer, index, force);
        self.reflowing = false;
        self.note_edits(&report.edits);
        report
    }

    /// Reflow every paragraph before the signature.
    pub fn reflow_all(&mut self, force: bool) -> ReflowReport {
        if self.reflowing {
            trace!("nested reflow ignored");
            return ReflowReport::default();
        }
        self.reflowing = true;
        self.freeze();
        let report = Reflow::new(&self.config).reflow_all(&mut self.buffer, force);
        self.note_edits(&report.edits);
        self.thaw();
        self.reflowing = false;
        report
    }

    /// Wrap every line at `linewrap_len` columns, ignoring quotes and tags.
    pub fn hard_wrap_all(&mut self) -> Vec<Edit> {
        self.freeze();
        let edits = hard_wrap(&mut self.buffer, self.config.linewrap_len as usize);
        self.note_edits(&edits);
        self.thaw();
        edits
    }

    fn reflow_range(&mut self, start: usize, end: usize, force: bool) {
        if self.reflowing {
            return;
        }
        self.reflowing = true;
        self.freeze();
        let reflow = Reflow::new(&self.config);
        let mut edits = Vec::new();
        let mut index = start;
        let mut end = end;
        while index <= end && index < self.buffer.len() {
            let report = reflow.beautify_paragraph(&mut self.buffer, index, force);
            for edit in &report.edits {
                end = edit.map_index(end);
            }
            edits.extend(report.edits);
            if report.next <= index {
                break;
            }
            index = report.next;
        }
        self.note_edits(&edits);
        self.thaw();
        self.reflowing = false;
    }

    /// Break display lines at `width`.
    pub fn set_wrap_width(&mut self, width: WrapWidth) {
        self.wrap_width = width;
        self.relayout(self.cache.first_line_start());
    }

    #[must_use]
    pub fn wrap_width(&self) -> WrapWidth {
        self.wrap_width
    }

    pub fn set_word_wrap(&mut self, enabled: bool) {
        self.config.word_wrap = enabled;
        self.relayout(self.cache.first_line_start());
    }

    pub fn set_line_wrap(&mut self, enabled: bool) {
        self.config.line_wrap = enabled;
        self.relayout(self.cache.first_line_start());
    }

    /// Resize the viewport, in metric units.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport_width = width;
        self.cache.set_viewport_height(height);
        self.relayout(self.cache.first_line_start());
    }

    /// Widest a display line may be.
    #[must_use]
    pub fn max_width(&self) -> u32 {
        match self.wrap_width {
            WrapWidth::Viewport => self.viewport_width,
            WrapWidth::Columns(n) => n * self.metrics.char_width(FontId::default(), 'W'),
            WrapWidth::Pixels(px) => px,
        }
    }

    pub fn apply_tag(&mut self, tag: Tag, range: Range<usize>) {
        self.check_tag_range(&range);
        self.buffer.tags_mut().apply(tag, range);
    }

    pub fn remove_tag(&mut self, tag: Tag, range: Range<usize>) {
        self.check_tag_range(&range);
        self.buffer.tags_mut().remove(tag, range);
    }

    /// [`apply_tag`](Self::apply_tag) by tag name.
    pub fn apply_tag_by_name(&mut self, name: &str, range: Range<usize>) -> Result<()> {
        let tag = name.parse()?;
        check_range(range.start, range.end, self.buffer.len())?;
        self.buffer.tags_mut().apply(tag, range);
        Ok(())
    }

    /// [`remove_tag`](Self::remove_tag) by tag name.
    pub fn remove_tag_by_name(&mut self, name: &str, range: Range<usize>) -> Result<()> {
        let tag = name.parse()?;
        check_range(range.start, range.end, self.buffer.len())?;
        self.buffer.tags_mut().remove(tag, range);
        Ok(())
    }

    #[must_use]
    pub fn has_tag(&self, tag: Tag, index: usize) -> bool {
        self.buffer.tags().contains(tag, index)
    }

    /// Whether the tag called `name` covers `index`.
    pub fn has_tag_by_name(&self, name: &str, index: usize) -> Result<bool> {
        let tag: Tag = name.parse()?;
        Ok(self.has_tag(tag, index))
    }

    #[must_use]
    pub fn tags_at(&self, index: usize) -> TagSet {
        self.buffer.tags().tags_at(index)
    }

    #[must_use]
    pub fn tag_ranges(&self, tag: Tag) -> &[Range<usize>] {
        self.buffer.tags().ranges(tag)
    }

    /// How text carrying `tag` is painted.
    #[must_use]
    pub fn tag_style(&self, tag: Tag) -> Style {
        self.config.tag_style(tag)
    }

    /// Style to paint the character at `index` with: its run style with
    /// the styles of its tags laid over it.
    #[must_use]
    pub fn display_style(&self, index: usize) -> Style {
        let tags = self.buffer.tags();
        Tag::ALL
            .into_iter()
            .filter(|&tag| tags.contains(tag, index))
            .fold(self.buffer.style_at_index(index), |style, tag| {
                style.merge(self.config.tag_style(tag))
            })
    }

    /// The link under `index`, with its range in buffer coordinates.
    #[must_use]
    pub fn link_at(&self, index: usize) -> Option<LinkSpan> {
        if index >= self.buffer.len() {
            return None;
        }
        let ls = line_start(&self.buffer, index);
        let le = line_end(&self.buffer, index);
        let chars: Vec<char> = self.buffer.chars_in(ls..le).collect();
        find_links_in(&chars)
            .into_iter()
            .find(|link| link.range.contains(&(index - ls)))
            .map(|link| LinkSpan {
                kind: link.kind,
                range: ls + link.range.start..ls + link.range.end,
            })
    }

    /// URI to open for the link under `index`.
    #[must_use]
    pub fn link_uri(&self, index: usize) -> Option<String> {
        self.link_at(index).map(|link| {
            let text = self.buffer.text_range(link.range.start, link.range.end);
            link.kind.build_uri(&text)
        })
    }

    /// The insertion point.
    #[must_use]
    pub fn point(&self) -> &Mark {
        self.buffer.point()
    }

    pub fn set_point(&mut self, index: usize) {
        self.buffer.set_point(index);
    }

    /// Move the insertion point and return its new index.
    pub fn move_point(&mut self, motion: Motion) -> usize {
        let index = motion::apply(&self.buffer, self.buffer.point().index(), motion);
        self.buffer.set_point(index);
        index
    }

    pub fn scroll_down(&mut self, px: u32) {
        if self.is_frozen() {
            return;
        }
        let ctx = layout_context(self.metrics.as_ref(), &self.stops, &self.config, self.max_width());
        self.cache.scroll_down(&self.buffer, px, &ctx);
    }

    pub fn scroll_up(&mut self, px: u32) {
        if self.is_frozen() {
            return;
        }
        let ctx = layout_context(self.metrics.as_ref(), &self.stops, &self.config, self.max_width());
        self.cache.scroll_up(&self.buffer, px, &ctx);
    }

    /// Scroll so the viewport top is `px` below the first cached line.
    pub fn scroll_to(&mut self, px: u32) {
        if self.is_frozen() {
            return;
        }
        let ctx = layout_context(self.metrics.as_ref(), &self.stops, &self.config, self.max_width());
        self.cache.scroll_to(&self.buffer, px, &ctx);
    }

    /// Scroll the display line holding `index` to the top.
    pub fn scroll_to_index(&mut self, index: usize) {
        if self.is_frozen() {
            self.frozen_anchor = index.min(self.buffer.len());
            return;
        }
        let ctx = layout_context(self.metrics.as_ref(), &self.stops, &self.config, self.max_width());
        self.cache.scroll_to_index(&self.buffer, index, &ctx);
    }

    /// Defer layout until the matching [`thaw`](Self::thaw). Nests.
    pub fn freeze(&mut self) {
        if self.freeze_count == 0 {
            self.frozen_anchor = self.cache.first_line_start();
            debug!(anchor = self.frozen_anchor, "layout frozen");
        }
        self.freeze_count += 1;
    }

    /// Undo one [`freeze`](Self::freeze); the last one lays out again.
    pub fn thaw(&mut self) {
        if self.freeze_count == 0 {
            return;
        }
        self.freeze_count -= 1;
        if self.freeze_count == 0 {
            debug!(anchor = self.frozen_anchor, "layout thawed");
            self.relayout(self.frozen_anchor);
        }
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.freeze_count > 0
    }

    /// Text of every display line on screen.
    #[must_use]
    pub fn display_lines(&self) -> Vec<String> {
        self.cache
            .visible_lines()
            .map(|line| {
                let shown = line.visible_range();
                self.buffer.text_range(shown.start, shown.end)
            })
            .collect()
    }

    /// Every display line of the whole buffer, laid out from scratch.
    #[must_use]
    pub fn layout_all(&self) -> Vec<LineParams> {
        let ctx = layout_context(self.metrics.as_ref(), &self.stops, &self.config, self.max_width());
        crate::layout::layout_all(&self.buffer, &ctx)
    }

    /// Check the line cache against a fresh layout.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.is_frozen() {
            return Ok(());
        }
        self.cache.check_invariants(&self.buffer)
    }

    fn relayout(&mut self, anchor: usize) {
        if self.is_frozen() {
            self.frozen_anchor = anchor;
            return;
        }
        let ctx = layout_context(self.metrics.as_ref(), &self.stops, &self.config, self.max_width());
        self.cache.rebuild(&self.buffer, anchor, &ctx);
    }

    fn note_edit(&mut self, edit: Edit) {
        if self.is_frozen() {
            self.frozen_anchor = edit.map_index_before(self.frozen_anchor);
            return;
        }
        let ctx = layout_context(self.metrics.as_ref(), &self.stops, &self.config, self.max_width());
        self.cache.apply_edit(&self.buffer, edit, &ctx);
    }

    fn note_edits(&mut self, edits: &[Edit]) {
        if self.is_frozen() {
            for edit in edits {
                self.frozen_anchor = edit.map_index_before(self.frozen_anchor);
            }
            return;
        }
        let ctx = layout_context(self.metrics.as_ref(), &self.stops, &self.config, self.max_width());
        self.cache.apply_edits(&self.buffer, edits, &ctx);
    }

    fn check_tag_range(&self, range: &Range<usize>) {
        if let Err(err) = check_range(range.start, range.end, self.buffer.len()) {
            panic!("{err}");
        }
    }
}

fn layout_context<'a>(
    metrics: &'a dyn CharMetrics,
    stops: &'a TabStops,
    config: &ComposeConfig,
    max_width: u32,
) -> LayoutContext<'a> {
    LayoutContext::new(metrics, stops, max_width)
        .with_word_wrap(config.word_wrap)
        .with_line_wrap(config.line_wrap)
}
