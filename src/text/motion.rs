//! Cursor motion over a [`TextBuffer`].
//!
//! All functions take and return character indices and clamp at the
//! buffer bounds. A logical line ends at its `'\n'` (or the buffer end);
//! a paragraph is a run of non-blank lines.

use super::buffer::TextBuffer;

/// Direction-and-unit of a cursor move, as bound to keys by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    CharForward,
    CharBackward,
    WordForward,
    WordBackward,
    LineStart,
    LineEnd,
    LineDown,
    LineUp,
    ParagraphForward,
    ParagraphBackward,
    BufferStart,
    BufferEnd,
}

/// Where `motion` takes the cursor from `index`.
#[must_use]
pub fn apply(buffer: &TextBuffer, index: usize, motion: Motion) -> usize {
    let index = index.min(buffer.len());
    match motion {
        Motion::CharForward => (index + 1).min(buffer.len()),
        Motion::CharBackward => index.saturating_sub(1),
        Motion::WordForward => next_word_boundary(buffer, index),
        Motion::WordBackward => prev_word_boundary(buffer, index),
        Motion::LineStart => line_start(buffer, index),
        Motion::LineEnd => line_end(buffer, index),
        Motion::LineDown => line_down(buffer, index),
        Motion::LineUp => line_up(buffer, index),
        Motion::ParagraphForward => next_paragraph(buffer, index),
        Motion::ParagraphBackward => prev_paragraph(buffer, index),
        Motion::BufferStart => 0,
        Motion::BufferEnd => buffer.len(),
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Start of the logical line containing `index`.
#[must_use]
pub fn line_start(buffer: &TextBuffer, index: usize) -> usize {
    let mut i = index.min(buffer.len());
    while i > 0 && buffer.char_at(i - 1) != '\n' {
        i -= 1;
    }
    i
}

/// Index of the `'\n'` ending the line containing `index`, or the buffer
/// length for the last line.
#[must_use]
pub fn line_end(buffer: &TextBuffer, index: usize) -> usize {
    let len = buffer.len();
    let mut i = index.min(len);
    while i < len && buffer.char_at(i) != '\n' {
        i += 1;
    }
    i
}

/// Whether the line starting at `start` holds only whitespace.
#[must_use]
pub fn is_blank_line(buffer: &TextBuffer, start: usize) -> bool {
    let end = line_end(buffer, start);
    buffer.chars_in(start..end).all(char::is_whitespace)
}

/// End of the word at or after `index`.
#[must_use]
pub fn next_word_boundary(buffer: &TextBuffer, index: usize) -> usize {
    let len = buffer.len();
    let mut i = index;
    while i < len && !is_word_char(buffer.char_at(i)) {
        i += 1;
    }
    while i < len && is_word_char(buffer.char_at(i)) {
        i += 1;
    }
    i
}

/// Start of the word at or before `index`.
#[must_use]
pub fn prev_word_boundary(buffer: &TextBuffer, index: usize) -> usize {
    let mut i = index.min(buffer.len());
    // Skip any non-word characters first
    while i > 0 && !is_word_char(buffer.char_at(i - 1)) {
        i -= 1;
    }
    while i > 0 && is_word_char(buffer.char_at(i - 1)) {
        i -= 1;
    }
    i
}

fn line_down(buffer: &TextBuffer, index: usize) -> usize {
    let start = line_start(buffer, index);
    let column = index - start;
    let end = line_end(buffer, index);
    if end == buffer.len() {
        return end;
    }
    let next = end + 1;
    (next + column).min(line_end(buffer, next))
}

fn line_up(buffer: &TextBuffer, index: usize) -> usize {
    let start = line_start(buffer, index);
    if start == 0 {
        return 0;
    }
    let column = index - start;
    let prev = line_start(buffer, start - 1);
    (prev + column).min(start - 1)
}

/// Start of the next paragraph after `index`, or the buffer end.
#[must_use]
pub fn next_paragraph(buffer: &TextBuffer, index: usize) -> usize {
    let len = buffer.len();
    let mut line = line_start(buffer, index);
    // leave the current paragraph
    while line < len && !is_blank_line(buffer, line) {
        line = line_end(buffer, line) + 1;
    }
    // skip the separating blank lines
    while line < len && is_blank_line(buffer, line) {
        line = line_end(buffer, line) + 1;
    }
    line.min(len)
}

/// Start of the paragraph containing `index`, or of the previous one when
/// already there.
#[must_use]
pub fn prev_paragraph(buffer: &TextBuffer, index: usize) -> usize {
    let mut line = line_start(buffer, index);
    let at_start = line == index.min(buffer.len());
    if at_start || is_blank_line(buffer, line) {
        // step back over blank lines into the previous paragraph
        if line == 0 {
            return 0;
        }
        line = line_start(buffer, line - 1);
        while line > 0 && is_blank_line(buffer, line) {
            line = line_start(buffer, line - 1);
        }
    }
    while line > 0 {
        let prev = line_start(buffer, line - 1);
        if is_blank_line(buffer, prev) {
            break;
        }
        line = prev;
    }
    line
}
