//! I/O error types.

use std::sync::Arc;

use thiserror::Error;

/// Errors from sources, sinks, and encoding preparation.
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Underlying I/O failure (wrapped in Arc for Clone support).
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    /// Byte sequence invalid for the declared encoding.
    #[error("invalid {encoding} byte sequence")]
    InvalidText {
        /// Encoding name.
        encoding: &'static str,
    },

    /// Input length is not a whole number of code units.
    #[error("truncated {encoding} input: {len} bytes is not a whole number of code units")]
    TruncatedInput {
        /// Encoding name.
        encoding: &'static str,
        /// Input length in bytes.
        len: usize,
    },

    /// Write attempted after the sink was closed.
    #[error("sink is closed")]
    Closed,
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Io(Arc::new(e))
    }
}

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, IoError>;
