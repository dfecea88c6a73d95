//! Unicode utilities for display width.

mod width;

pub use width::{
    WidthMethod, display_width_char_with_method, display_width_with_method, is_wide_with_method,
};
