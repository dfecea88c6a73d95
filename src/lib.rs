//! `mailwrap` - text engine for a mail composer
//!
//! A GUI-independent core for the body of a mail being written: a gap
//! buffer with style runs and tags, an incremental line layout cache, a
//! line-break engine that never splits links, and a reflow driver that
//! rewraps quoted paragraphs.
//!
//! The host supplies character metrics through [`CharMetrics`] and drives
//! a [`ComposeEditor`]; everything else is plain data.
//!
//! ```
//! use mailwrap::{ComposeEditor, Style, WrapWidth};
//!
//! let mut editor = ComposeEditor::default();
//! editor.set_wrap_width(WrapWidth::Columns(5));
//! editor.insert(0, "aaaa bbbb cccc", Style::NONE);
//! assert_eq!(editor.display_lines(), ["aaaa", "bbbb", "cccc"]);
//! ```

#![allow(clippy::cast_possible_truncation)] // Widths fit in u32
#![allow(clippy::cast_possible_wrap)] // Edit lengths fit in isize
#![allow(clippy::module_name_repetitions)] // Allow text::TextBuffer etc
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::cast_lossless)] // as casts are fine for primitive widening
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::semicolon_if_nothing_returned)] // Style preference
#![allow(clippy::needless_collect)] // Collect for assertions is clear

pub mod color;
pub mod compose;
pub mod error;
pub mod layout;
pub mod link;
pub mod metrics;
pub mod style;
pub mod text;
pub mod unicode;

// Re-export core types at crate root
pub use color::Rgba;
pub use error::{Error, Result};
pub use metrics::{CharMetrics, MonospaceMetrics};
pub use style::{FontId, Style, TextAttributes};

// Re-export commonly used types
pub use compose::{ComposeConfig, ComposeEditor, Origin, QuoteKind, WrapWidth};
pub use layout::{LineCache, LineEnd, LineParams};
pub use link::{LinkKind, LinkSpan, find_links};
pub use text::{Edit, Mark, Tag, TextBuffer};
pub use unicode::WidthMethod;
