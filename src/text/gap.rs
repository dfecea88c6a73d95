//! Gapped character storage.
//!
//! Text lives in one `Vec<char>` split by a movable gap:
//!
//! ```text
//! [0, gap_position)                          text before the gap
//! [gap_position, gap_position + gap_size)    free space
//! [gap_position + gap_size, capacity)        text after the gap
//! ```
//!
//! Every edit first moves the gap to the edit point, so runs of nearby
//! edits only copy the characters between consecutive edit points.

use crate::error::{Error, check_index, check_range};
use std::ops::Range;

/// Capacity of a fresh buffer.
pub const INITIAL_BUFFER_SIZE: usize = 1024;
/// Smallest amount the gap grows by.
pub const MIN_GAP_SIZE: usize = 256;

/// Character buffer with a movable gap.
#[derive(Clone, Debug)]
pub struct GapBuffer {
    buf: Vec<char>,
    gap_position: usize,
    gap_size: usize,
}

impl Default for GapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl GapBuffer {
    /// Create an empty buffer with the initial capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec!['\0'; INITIAL_BUFFER_SIZE],
            gap_position: 0,
            gap_size: INITIAL_BUFFER_SIZE,
        }
    }

    /// Create a buffer holding `text`.
    #[must_use]
    pub fn with_text(text: &str) -> Self {
        let mut gap = Self::new();
        let chars: Vec<char> = text.chars().collect();
        gap.insert(0, &chars);
        gap
    }

    /// Number of valid characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len() - self.gap_size
    }

    /// Check if the buffer holds no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total storage, text plus gap.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Current `(gap_position, gap_size)`.
    #[must_use]
    pub fn gap(&self) -> (usize, usize) {
        (self.gap_position, self.gap_size)
    }

    /// Insert `chars` so the first one lands at `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at > len()`.
    pub fn insert(&mut self, at: usize, chars: &[char]) {
        if let Err(err) = check_index(at, self.len()) {
            panic!("{err}");
        }
        if chars.is_empty() {
            return;
        }
        self.move_gap(at);
        self.make_forward_space(chars.len());
        let n = chars.len();
        self.buf[self.gap_position..self.gap_position + n].copy_from_slice(chars);
        self.gap_position += n;
        self.gap_size -= n;
    }

    /// Forget `count` characters starting at `at`.
    ///
    /// # Panics
    ///
    /// Panics if the range runs past the end of the text.
    pub fn delete(&mut self, at: usize, count: usize) {
        let end = at.saturating_add(count);
        if let Err(err) = check_range(at, end, self.len()) {
            panic!("{err}");
        }
        if count == 0 {
            return;
        }
        self.move_gap(at);
        self.gap_size += count;
    }

    /// Character at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[must_use]
    pub fn char_at(&self, index: usize) -> char {
        let len = self.len();
        assert!(index < len, "{}", Error::OutOfBounds { index, len });
        if index < self.gap_position {
            self.buf[index]
        } else {
            self.buf[index + self.gap_size]
        }
    }

    /// The two contiguous pieces making up `range`.
    ///
    /// The second slice is empty unless the gap sits inside the range.
    ///
    /// # Panics
    ///
    /// Panics if the range is reversed or out of bounds.
    #[must_use]
    pub fn as_slices(&self, range: Range<usize>) -> (&[char], &[char]) {
        if let Err(err) = check_range(range.start, range.end, self.len()) {
            panic!("{err}");
        }
        let Range { start, end } = range;
        let after = self.gap_position + self.gap_size;
        if end <= self.gap_position {
            (&self.buf[start..end], &[])
        } else if start >= self.gap_position {
            (&self.buf[start + self.gap_size..end + self.gap_size], &[])
        } else {
            (
                &self.buf[start..self.gap_position],
                &self.buf[after..end + self.gap_size],
            )
        }
    }

    /// Copy `start..end` into a `String`, reading around the gap.
    #[must_use]
    pub fn get_range(&self, start: usize, end: usize) -> String {
        let (a, b) = self.as_slices(start..end);
        a.iter().chain(b).collect()
    }

    /// Iterate over every character in order.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.buf[..self.gap_position]
            .iter()
            .chain(&self.buf[self.gap_position + self.gap_size..])
            .copied()
    }

    /// Move the gap to the end so the text is one contiguous slice.
    pub fn compact(&mut self) {
        self.move_gap(self.len());
    }

    fn move_gap(&mut self, index: usize) {
        if index < self.gap_position {
            self.buf
                .copy_within(index..self.gap_position, index + self.gap_size);
        } else if index > self.gap_position {
            let after = self.gap_position + self.gap_size;
            let n = index - self.gap_position;
            self.buf.copy_within(after..after + n, self.gap_position);
        }
        self.gap_position = index;
    }

    fn make_forward_space(&mut self, len: usize) {
        if self.gap_size >= len {
            return;
        }
        let old_capacity = self.buf.len();
        let tail_start = self.gap_position + self.gap_size;
        let tail_len = old_capacity - tail_start;

        let wanted = self.len() + self.gap_size + (2 * len).max(MIN_GAP_SIZE);
        let new_capacity = wanted.next_power_of_two();
        self.buf.resize(new_capacity, '\0');
        self.buf
            .copy_within(tail_start..old_capacity, new_capacity - tail_len);
        self.gap_size = new_capacity - tail_len - self.gap_position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(gap: &GapBuffer) -> String {
        gap.chars().collect()
    }

    #[test]
    fn test_insert_and_read() {
        let mut gap = GapBuffer::new();
        gap.insert(0, &['h', 'e', 'l', 'l', 'o']);
        assert_eq!(gap.len(), 5);
        assert_eq!(gap.char_at(1), 'e');
        assert_eq!(gap.gap(), (5, INITIAL_BUFFER_SIZE - 5));

        gap.insert(0, &['>', ' ']);
        assert_eq!(text(&gap), "> hello");
        assert_eq!(gap.gap(), (2, INITIAL_BUFFER_SIZE - 7));
    }

    #[test]
    fn test_delete_moves_gap() {
        let mut gap = GapBuffer::with_text("one two three");
        gap.delete(3, 4);
        assert_eq!(text(&gap), "one three");
        assert_eq!(gap.gap().0, 3);
        gap.delete(0, 0);
        assert_eq!(gap.len(), 9);
    }

    #[test]
    fn test_get_range_across_gap() {
        let mut gap = GapBuffer::with_text("abcdef");
        gap.insert(3, &['X']);
        // gap now sits right after the X
        let (a, b) = gap.as_slices(1..6);
        assert_eq!(a, &['b', 'c', 'X']);
        assert_eq!(b, &['d', 'e']);
        assert_eq!(gap.get_range(1, 6), "bcXde");
        assert_eq!(gap.get_range(4, 4), "");
    }

    #[test]
    fn test_growth_is_geometric() {
        let mut gap = GapBuffer::new();
        let chunk: Vec<char> = "x".repeat(INITIAL_BUFFER_SIZE).chars().collect();
        gap.insert(0, &chunk);
        assert_eq!(gap.capacity(), INITIAL_BUFFER_SIZE);
        gap.insert(10, &['y']);
        assert!(gap.capacity().is_power_of_two());
        assert!(gap.gap().1 >= MIN_GAP_SIZE);
        assert_eq!(gap.len(), INITIAL_BUFFER_SIZE + 1);
        assert_eq!(gap.char_at(10), 'y');
        assert_eq!(gap.char_at(INITIAL_BUFFER_SIZE), 'x');
    }

    #[test]
    fn test_growth_keeps_tail() {
        let mut gap = GapBuffer::with_text("head|tail");
        let big: Vec<char> = "-".repeat(3000).chars().collect();
        gap.insert(5, &big);
        assert_eq!(gap.len(), 3009);
        assert_eq!(gap.get_range(0, 5), "head|");
        assert_eq!(gap.get_range(3005, 3009), "tail");
    }

    #[test]
    fn test_compact() {
        let mut gap = GapBuffer::with_text("abc");
        gap.insert(1, &['-']);
        gap.compact();
        assert_eq!(gap.gap().0, 4);
        assert_eq!(gap.as_slices(0..4).1.len(), 0);
        assert_eq!(text(&gap), "a-bc");
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_char_at_past_end_panics() {
        let gap = GapBuffer::with_text("ab");
        let _ = gap.char_at(2);
    }

    #[test]
    #[should_panic(expected = "invalid range")]
    fn test_delete_past_end_panics() {
        let mut gap = GapBuffer::with_text("ab");
        gap.delete(1, 5);
    }
}
