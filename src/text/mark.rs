//! Property marks.

use std::sync::atomic::{AtomicU64, Ordering};

use super::runs::RunId;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one text buffer instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u64);

impl BufferId {
    pub(crate) fn next() -> Self {
        Self(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A position expressed as `(run, offset within run, absolute index)`.
///
/// A mark is consistent when walking `offset` characters from the start
/// of `run` lands on `index`. Marks are always canonical: `offset` is
/// strictly less than the run's length, and the position just past the
/// last character is represented with no run at all.
///
/// Marks do not follow edits. After an insert or delete at or before a
/// stored mark, re-derive it with
/// [`TextBuffer::find_mark`](super::TextBuffer::find_mark) or
/// [`TextBuffer::remap_mark`](super::TextBuffer::remap_mark).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mark {
    pub(crate) owner: BufferId,
    pub(crate) run: Option<RunId>,
    pub(crate) offset: usize,
    pub(crate) index: usize,
}

impl Mark {
    /// Absolute character index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Offset of the mark inside its run.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Run the mark points into, `None` at the end of the buffer.
    #[must_use]
    pub const fn run(&self) -> Option<RunId> {
        self.run
    }

    /// Buffer that produced this mark.
    #[must_use]
    pub const fn owner(&self) -> BufferId {
        self.owner
    }

    /// Whether the mark sits past the last character.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.run.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_ids_are_unique() {
        let a = BufferId::next();
        let b = BufferId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn test_end_mark_accessors() {
        let mark = Mark {
            owner: BufferId(7),
            run: None,
            offset: 0,
            index: 12,
        };
        assert!(mark.is_end());
        assert_eq!(mark.index(), 12);
        assert_eq!(mark.offset(), 0);
        assert_eq!(mark.owner().get(), 7);
    }
}
