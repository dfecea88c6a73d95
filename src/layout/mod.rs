//! Line layout.
//!
//! - [`find_line_params`]: the break engine, one display line at a time
//! - [`LineParams`]: what the engine reports for a line
//! - [`LineCache`]: the incrementally maintained lines around the viewport
//!
//! Widths are in whatever unit the [`CharMetrics`](crate::CharMetrics)
//! implementation reports: pixels for a GUI host, columns for
//! [`MonospaceMetrics::columns`](crate::MonospaceMetrics::columns).
//!
//! # Examples
//!
//! ```
//! use mailwrap::layout::{LayoutContext, TabStops, layout_all};
//! use mailwrap::{MonospaceMetrics, Style, TextBuffer};
//!
//! let buffer = TextBuffer::with_text("aaaa bbbb cccc", Style::NONE);
//! let metrics = MonospaceMetrics::columns();
//! let stops = TabStops::default();
//! let ctx = LayoutContext::new(&metrics, &stops, 5);
//!
//! let lines: Vec<String> = layout_all(&buffer, &ctx)
//!     .iter()
//!     .map(|line| {
//!         let shown = line.visible_range();
//!         buffer.text_range(shown.start, shown.end)
//!     })
//!     .collect();
//! assert_eq!(lines, ["aaaa", "bbbb", "cccc"]);
//! ```

mod cache;
mod params;
mod wrap;

pub use cache::{FetchMode, LineCache, fetch_lines, layout_all};
pub use params::{DEFAULT_TAB_WIDTH, LineEnd, LineParams, TabCont, TabStopMark, TabStops};
pub use wrap::{LayoutContext, find_line_params};
