//! Error handling for the nestrie library
//!
//! Every fallible operation in the crate reports one of the error kinds
//! defined here; the kind is part of the API contract (callers match on it
//! to distinguish misuse from corrupt input from I/O failure).

use thiserror::Error;

/// Main error type for the nestrie library
#[derive(Error, Debug)]
pub enum NestrieError {
    /// Invalid argument: bad config flags, nonsense sizes, rejected input
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument
        message: String,
    },

    /// Misuse of the API: operating on an uninitialized trie, mutating a
    /// mapped (borrowed) vector, or an internal invariant breach
    #[error("Logic error: {message}")]
    Logic {
        /// Description of the misuse
        message: String,
    },

    /// Underlying source/sink failure, with the source attached
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted-format violation: magic mismatch, truncation, or
    /// inconsistent sizes between related sections
    #[error("Format error: {message}")]
    Format {
        /// Description of the format violation
        message: String,
    },

    /// Out-of-bounds access: oversized key, id past the key count
    #[error("Out of bounds: index {index}, size {size}")]
    Bounds {
        /// The offending index or length
        index: usize,
        /// The valid size
        size: usize,
    },

    /// Integer overflow while computing a size or offset
    #[error("Range error: {message}")]
    Range {
        /// Description of the overflowing computation
        message: String,
    },
}

impl NestrieError {
    /// Create an invalid-argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    /// Create a logic error
    pub fn logic<S: Into<String>>(message: S) -> Self {
        Self::Logic { message: message.into() }
    }

    /// Create an I/O error from a message
    pub fn io_error<S: Into<String>>(message: S) -> Self {
        Self::Io(std::io::Error::new(std::io::ErrorKind::Other, message.into()))
    }

    /// Create a format error
    pub fn format<S: Into<String>>(message: S) -> Self {
        Self::Format { message: message.into() }
    }

    /// Create an out-of-bounds error
    pub fn bounds(index: usize, size: usize) -> Self {
        Self::Bounds { index, size }
    }

    /// Create a range (overflow) error
    pub fn range<S: Into<String>>(message: S) -> Self {
        Self::Range { message: message.into() }
    }

    /// Get the error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Logic { .. } => "logic",
            Self::Io(_) => "io",
            Self::Format { .. } => "format",
            Self::Bounds { .. } => "bounds",
            Self::Range { .. } => "range",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, NestrieError>;

/// Assert that an index is within bounds
#[inline]
pub(crate) fn check_bounds(index: usize, size: usize) -> Result<()> {
    if index >= size {
        Err(NestrieError::bounds(index, size))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = NestrieError::invalid_argument("bad flags");
        assert_eq!(err.category(), "invalid_argument");
        assert!(err.to_string().contains("bad flags"));
    }

    #[test]
    fn test_bounds_checking() {
        assert!(check_bounds(5, 10).is_ok());
        assert!(check_bounds(10, 10).is_err());
        assert!(check_bounds(15, 10).is_err());
    }

    #[test]
    fn test_bounds_display() {
        let err = NestrieError::bounds(10, 5);
        let display = err.to_string();
        assert!(display.contains("10"));
        assert!(display.contains("5"));
    }

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: NestrieError = io_error.into();
        assert_eq!(err.category(), "io");
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_all_categories_distinct() {
        let errors = [
            NestrieError::invalid_argument("a"),
            NestrieError::logic("b"),
            NestrieError::io_error("c"),
            NestrieError::format("d"),
            NestrieError::bounds(1, 0),
            NestrieError::range("e"),
        ];
        let mut categories: Vec<&str> = errors.iter().map(|e| e.category()).collect();
        categories.sort_unstable();
        categories.dedup();
        assert_eq!(categories.len(), errors.len());
    }
}
