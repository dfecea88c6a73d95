//! Text storage: gap buffer, style runs, marks and tags.
//!
//! This module provides the editable text model:
//!
//! - [`GapBuffer`]: character storage with a movable gap
//! - [`RunList`]: arena-backed list of style runs covering the text
//! - [`Mark`]: `(run, offset, index)` position used for navigation
//! - [`TagTable`]: named ranges for quote colors, links and reflow hints
//! - [`TextBuffer`]: the combination, plus the insertion point
//!
//! # Examples
//!
//! ```
//! use mailwrap::text::{Tag, TextBuffer};
//! use mailwrap::{Rgba, Style};
//!
//! let mut buffer = TextBuffer::new();
//! buffer.insert(0, "Hello", Style::NONE);
//! buffer.insert(5, " world", Style::fg(Rgba::RED));
//! assert_eq!(buffer.text(), "Hello world");
//! assert_eq!(buffer.runs().run_count(), 2);
//!
//! buffer.tags_mut().apply(Tag::Link, 6..11);
//! assert!(buffer.tags().contains(Tag::Link, 8));
//! ```

mod buffer;
mod gap;
mod mark;
pub mod motion;
mod runs;
mod tags;

pub use buffer::{Edit, TextBuffer};
pub use gap::{GapBuffer, INITIAL_BUFFER_SIZE, MIN_GAP_SIZE};
pub use mark::{BufferId, Mark};
pub use motion::Motion;
pub use runs::{Run, RunId, RunList};
pub use tags::{Tag, TagSet, TagTable};
