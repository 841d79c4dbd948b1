//! Type conversion error types.

use thiserror::Error;

/// Errors that can occur while parsing or formatting field values.
#[derive(Debug, Clone, Error)]
pub enum TypeError {
    /// Value is null/absent when a non-null value was expected.
    #[error("unexpected null value")]
    UnexpectedNull,

    /// The field string does not parse as the expected type.
    #[error("type mismatch: expected {expected}, got {actual:?}{}", hint_suffix(.hint))]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// The offending field string.
        actual: String,
        /// One-sentence suggestion when a common strategy would succeed.
        hint: Option<&'static str>,
    },

    /// Invalid date/time value.
    #[error("invalid date/time: {0:?}")]
    InvalidDateTime(String),

    /// Invalid numeric value.
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    /// A value that cannot be represented on output (NaN, infinity).
    #[error("value cannot be encoded: {0}")]
    Unrepresentable(String),
}

fn hint_suffix(hint: &Option<&'static str>) -> String {
    match hint {
        Some(h) => format!(" ({h})"),
        None => String::new(),
    }
}

impl TypeError {
    /// Construct a mismatch error without a hint.
    pub fn mismatch(expected: &'static str, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected,
            actual: actual.into(),
            hint: None,
        }
    }

    /// Construct a mismatch error with a recovery hint.
    pub fn mismatch_with_hint(
        expected: &'static str,
        actual: impl Into<String>,
        hint: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            expected,
            actual: actual.into(),
            hint: Some(hint),
        }
    }
}
