//! Styled gap buffer.
//!
//! [`TextBuffer`] owns the three pieces of editor state that must change
//! together: the [`GapBuffer`] holding the characters, the [`RunList`]
//! holding their styles, and the [`TagTable`]. It also keeps the insertion
//! point as a [`Mark`], which every lookup uses as its starting hint.
//!
//! Indices are character offsets. Out-of-range indices are programmer
//! errors: the plain methods panic, the `try_*` methods return
//! [`Error`](crate::Error).

use std::ops::Range;

use crate::error::{Result, check_index, check_range};
use crate::style::Style;

use super::gap::GapBuffer;
use super::mark::{BufferId, Mark};
use super::runs::{Run, RunList};
use super::tags::TagTable;

/// One completed edit, used to carry positions across it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edit {
    /// `len` characters inserted at `at`.
    Insert { at: usize, len: usize },
    /// `len` characters deleted at `at`.
    Delete { at: usize, len: usize },
}

impl Edit {
    /// Position `index` moves to once this edit is applied.
    ///
    /// Positions at an insertion point move after the inserted text;
    /// positions inside a deleted span collapse onto its start.
    #[must_use]
    pub const fn map_index(self, index: usize) -> usize {
        match self {
            Self::Insert { at, len } => {
                if index >= at {
                    index + len
                } else {
                    index
                }
            }
            Self::Delete { at, len } => {
                if index >= at + len {
                    index - len
                } else if index > at {
                    at
                } else {
                    index
                }
            }
        }
    }

    /// Like [`map_index`](Self::map_index), except that a position at an
    /// insertion point stays before the inserted text.
    #[must_use]
    pub const fn map_index_before(self, index: usize) -> usize {
        match self {
            Self::Insert { at, .. } if index == at => index,
            _ => self.map_index(index),
        }
    }

    /// Signed change in buffer length.
    #[must_use]
    pub const fn delta(self) -> isize {
        match self {
            Self::Insert { len, .. } => len as isize,
            Self::Delete { len, .. } => -(len as isize),
        }
    }
}

/// Text with style runs, tags and an insertion point.
#[derive(Clone, Debug)]
pub struct TextBuffer {
    id: BufferId,
    text: GapBuffer,
    runs: RunList,
    tags: TagTable,
    point: Mark,
    revision: u64,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        let id = BufferId::next();
        let runs = RunList::new(id);
        let point = runs.start_mark();
        Self {
            id,
            text: GapBuffer::new(),
            runs,
            tags: TagTable::new(),
            point,
            revision: 0,
        }
    }

    /// Create a buffer with initial text in one style.
    #[must_use]
    pub fn with_text(text: &str, style: Style) -> Self {
        let mut buffer = Self::new();
        buffer.insert(0, text, style);
        buffer.set_point(0);
        buffer
    }

    /// Identity used to reject marks from other buffers.
    #[must_use]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Counter bumped on every edit.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The raw gap storage.
    #[must_use]
    pub fn gap(&self) -> &GapBuffer {
        &self.text
    }

    /// The style runs.
    #[must_use]
    pub fn runs(&self) -> &RunList {
        &self.runs
    }

    /// The tag table.
    #[must_use]
    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    /// Mutable access to the tag table.
    pub fn tags_mut(&mut self) -> &mut TagTable {
        &mut self.tags
    }

    /// Character at `index`.
    #[must_use]
    pub fn char_at(&self, index: usize) -> char {
        self.text.char_at(index)
    }

    /// Characters in `start..end` as a `String`.
    #[must_use]
    pub fn text_range(&self, start: usize, end: usize) -> String {
        self.text.get_range(start, end)
    }

    /// Checked [`text_range`](Self::text_range).
    pub fn try_text_range(&self, start: usize, end: usize) -> Result<String> {
        check_range(start, end, self.len())?;
        Ok(self.text.get_range(start, end))
    }

    /// Iterate over the characters of `range`.
    pub fn chars_in(&self, range: Range<usize>) -> impl Iterator<Item = char> + '_ {
        let (a, b) = self.text.as_slices(range);
        a.iter().chain(b).copied()
    }

    /// Whole text.
    #[must_use]
    pub fn text(&self) -> String {
        self.text.chars().collect()
    }

    /// The insertion point.
    #[must_use]
    pub fn point(&self) -> &Mark {
        &self.point
    }

    /// Move the insertion point.
    pub fn set_point(&mut self, index: usize) {
        self.point = self.find_mark(index);
    }

    /// Mark at index 0.
    #[must_use]
    pub fn start_mark(&self) -> Mark {
        self.runs.start_mark()
    }

    /// Mark past the last character.
    #[must_use]
    pub fn end_mark(&self) -> Mark {
        self.runs.end_mark()
    }

    /// Materialize `index` as a mark, walking from the insertion point.
    #[must_use]
    pub fn find_mark(&self, index: usize) -> Mark {
        self.runs.find_mark_near(index, Some(&self.point))
    }

    /// Materialize `index` as a mark, walking from `near`.
    #[must_use]
    pub fn find_mark_near(&self, index: usize, near: &Mark) -> Mark {
        self.runs.find_mark_near(index, Some(near))
    }

    /// Re-derive a mark taken before `edit`.
    #[must_use]
    pub fn remap_mark(&self, mark: &Mark, edit: Edit) -> Mark {
        self.runs.check_owner(mark);
        self.find_mark(edit.map_index(mark.index()))
    }

    /// Move `mark` forward by `n` characters.
    pub fn advance_mark(&self, mark: &mut Mark, n: usize) {
        self.runs.advance_n(mark, n);
    }

    /// Move `mark` back by `n` characters.
    pub fn decrement_mark(&self, mark: &mut Mark, n: usize) {
        self.runs.decrement_n(mark, n);
    }

    /// Whether `mark` still walks to its own index.
    #[must_use]
    pub fn is_mark_consistent(&self, mark: &Mark) -> bool {
        self.runs.is_consistent(mark)
    }

    /// Style of the character under `mark`.
    #[must_use]
    pub fn style_at(&self, mark: &Mark) -> Style {
        self.runs.style_at(mark).unwrap_or_default()
    }

    /// Style of the character at `index`.
    #[must_use]
    pub fn style_at_index(&self, index: usize) -> Style {
        self.style_at(&self.find_mark(index))
    }

    /// Iterate over `(start, run)` pairs.
    pub fn runs_with_offsets(&self) -> impl Iterator<Item = (usize, &Run)> + '_ {
        let mut start = 0;
        self.runs.iter().map(move |(_, run)| {
            let at = start;
            start += run.len;
            (at, run)
        })
    }

    /// Insert `text` at `index` in `style`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert(&mut self, index: usize, text: &str, style: Style) -> Edit {
        if let Err(err) = check_index(index, self.len()) {
            panic!("{err}");
        }
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let edit = Edit::Insert { at: index, len };
        if len == 0 {
            return edit;
        }

        let mut at = self.find_mark(index);
        self.text.insert(index, &chars);
        self.runs.insert(&mut at, style, len);
        self.tags.on_insert(index, len);
        self.point = self
            .runs
            .find_mark_near(edit.map_index(self.point.index()), Some(&at));
        self.revision += 1;
        edit
    }

    /// Checked [`insert`](Self::insert).
    pub fn try_insert(&mut self, index: usize, text: &str, style: Style) -> Result<Edit> {
        check_index(index, self.len())?;
        Ok(self.insert(index, text, style))
    }

    /// Delete `count` characters starting at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the span runs past the end of the buffer.
    pub fn delete(&mut self, index: usize, count: usize) -> Edit {
        if let Err(err) = check_range(index, index.saturating_add(count), self.len()) {
            panic!("{err}");
        }
        let edit = Edit::Delete {
            at: index,
            len: count,
        };
        if count == 0 {
            return edit;
        }

        let mut at = self.find_mark(index);
        self.text.delete(index, count);
        self.runs.delete(&mut at, count);
        self.tags.on_delete(index, count);
        self.point = self
            .runs
            .find_mark_near(edit.map_index(self.point.index()), Some(&at));
        self.revision += 1;
        edit
    }

    /// Checked [`delete`](Self::delete).
    pub fn try_delete(&mut self, index: usize, count: usize) -> Result<Edit> {
        check_range(index, index.saturating_add(count), self.len())?;
        Ok(self.delete(index, count))
    }

    /// Give `start..end` a new run style without touching the text.
    pub fn restyle(&mut self, start: usize, end: usize, style: Style) {
        if let Err(err) = check_range(start, end, self.len()) {
            panic!("{err}");
        }
        if start == end {
            return;
        }
        let mut at = self.find_mark(start);
        self.runs.restyle(&mut at, end - start, style);
        self.point = self.runs.find_mark_near(self.point.index(), Some(&at));
        self.revision += 1;
    }

    /// Remove all text, runs and tags.
    pub fn clear(&mut self) {
        self.text = GapBuffer::new();
        self.runs.clear();
        self.tags.clear();
        self.point = self.runs.start_mark();
        self.revision += 1;
    }
}
