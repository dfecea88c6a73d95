//! Mail composition on top of the text model and layout.
//!
//! - [`quote`]: quote prefix, list item and signature detection
//! - [`Reflow`]: quote-aware paragraph rewrapping and tagging
//! - [`ComposeEditor`]: the editor a host drives, with autowrap and
//!   freeze/thaw
//!
//! # Examples
//!
//! ```
//! use mailwrap::compose::{ComposeConfig, ComposeEditor};
//! use mailwrap::text::Tag;
//!
//! let config = ComposeConfig::default()
//!     .with_linewrap_len(20)
//!     .with_linewrap_quote(true);
//! let mut editor = ComposeEditor::new(config);
//! editor.set_text("> quoted text that is long enough to wrap");
//! editor.reflow_all(false);
//!
//! assert_eq!(
//!     editor.text(),
//!     "> quoted text that\n> is long enough to\n> wrap"
//! );
//! assert!(editor.has_tag(Tag::Quote1, 20));
//! ```

mod config;
mod editor;
pub mod quote;
mod reflow;

pub use config::{ComposeConfig, TagColors};
pub use editor::{ComposeEditor, FREEZE_LENGTH, Origin, QuoteKind, WrapWidth};
pub use reflow::{Reflow, ReflowReport, hard_wrap};
