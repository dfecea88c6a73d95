//! Error types for mailwrap.
//!
//! Index and mark misuse are programmer errors. The plain editing API
//! panics on them with the [`Error`] rendered as the message; the `try_*`
//! variants hand the same value back instead.

use std::fmt;

/// Result type alias for mailwrap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mailwrap operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Character index outside `0..=len`.
    OutOfBounds { index: usize, len: usize },
    /// Range that is reversed or runs past the end of the buffer.
    InvalidRange { start: usize, end: usize, len: usize },
    /// Mark produced by a different buffer instance.
    ForeignMark { expected: u64, found: u64 },
    /// Tag name that is not one of the known style tags.
    UnknownTag(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for buffer of length {len}")
            }
            Self::InvalidRange { start, end, len } => {
                write!(f, "invalid range {start}..{end} for buffer of length {len}")
            }
            Self::ForeignMark { expected, found } => {
                write!(f, "mark from buffer #{found} used with buffer #{expected}")
            }
            Self::UnknownTag(name) => write!(f, "unknown tag: {name}"),
        }
    }
}

impl std::error::Error for Error {}

/// Check that `index` is a valid insertion point for a buffer of `len` chars.
pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index > len {
        return Err(Error::OutOfBounds { index, len });
    }
    Ok(())
}

/// Check that `start..end` addresses existing characters.
pub(crate) fn check_range(start: usize, end: usize, len: usize) -> Result<()> {
    if start > end || end > len {
        return Err(Error::InvalidRange { start, end, len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::OutOfBounds { index: 10, len: 4 };
        assert!(err.to_string().contains("index 10"));
        assert!(err.to_string().contains("length 4"));

        let err = Error::InvalidRange {
            start: 5,
            end: 2,
            len: 9,
        };
        assert!(err.to_string().contains("5..2"));

        let err = Error::ForeignMark {
            expected: 1,
            found: 2,
        };
        assert!(err.to_string().contains("#2"));

        let err = Error::UnknownTag("bogus".to_string());
        assert_eq!(err.to_string(), "unknown tag: bogus");
    }

    #[test]
    fn test_checks() {
        assert!(check_index(3, 3).is_ok());
        assert_eq!(
            check_index(4, 3),
            Err(Error::OutOfBounds { index: 4, len: 3 })
        );
        assert!(check_range(0, 3, 3).is_ok());
        assert!(check_range(2, 1, 3).is_err());
        assert!(check_range(1, 4, 3).is_err());
    }
}
