//! Engine error types.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Where in the input a failure occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// 1-based row number (header excluded from data numbering).
    pub row: Option<u64>,
    /// Column (header) name.
    pub column: Option<String>,
    /// Coding path for nested records (outermost first).
    pub path: Vec<String>,
}

impl Location {
    /// A location with only a row number.
    #[must_use]
    pub fn row(row: u64) -> Self {
        Self {
            row: Some(row),
            ..Self::default()
        }
    }

    /// Attach a column name.
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Prepend a nested-record path segment.
    #[must_use]
    pub fn inside(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(row) = self.row {
            write!(f, "row {row}")?;
            wrote = true;
        }
        if let Some(column) = &self.column {
            if wrote {
                write!(f, ", ")?;
            }
            write!(f, "column {column:?}")?;
            wrote = true;
        }
        if !self.path.is_empty() {
            if wrote {
                write!(f, ", ")?;
            }
            write!(f, "path {}", self.path.join("."))?;
        }
        Ok(())
    }
}

/// Errors that can occur during decode and encode operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A column required by the record type is absent.
    #[error("column {name:?} not found ({location}){}", suggestion_suffix(.suggestion))]
    KeyNotFound {
        /// The field name that was sought.
        name: String,
        /// Failure location.
        location: Location,
        /// Headers that were available.
        available: Vec<String>,
        /// Nearest-header suggestion, when one is close enough.
        suggestion: Option<String>,
    },

    /// A field string does not parse under the configured strategy.
    #[error("type mismatch at {location}: expected {expected}, got {value:?}{}", hint_suffix(.hint))]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// The offending field string.
        value: String,
        /// Failure location.
        location: Location,
        /// One-sentence suggestion when a common strategy would succeed.
        hint: Option<String>,
    },

    /// Structural CSV violation.
    #[error("parse error: {message}{}", line_column_suffix(.line, .column))]
    Parse {
        /// Stable description of the violation.
        message: String,
        /// 1-based line number.
        line: Option<u64>,
        /// 1-based column (field) number.
        column: Option<u64>,
    },

    /// Operation outside the codec's contract.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A value that cannot be encoded (NaN/infinite float, invalid text).
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Underlying source/sink failure (wrapped in Arc for Clone support).
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!("; did you mean {s:?}?"),
        None => String::new(),
    }
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(" ({h})"),
        None => String::new(),
    }
}

fn line_column_suffix(line: &Option<u64>, column: &Option<u64>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!(" at line {l}, column {c}"),
        (Some(l), None) => format!(" at line {l}"),
        _ => String::new(),
    }
}

impl Error {
    /// Construct a parse error with position information.
    pub fn parse(message: impl Into<String>, line: u64, column: u64) -> Self {
        Self::Parse {
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Construct a key-not-found error, attaching a suggestion when an
    /// available header is within edit distance 2 or differs only in case.
    pub fn key_not_found(
        name: impl Into<String>,
        location: Location,
        available: Vec<String>,
    ) -> Self {
        let name = name.into();
        let suggestion = suggest_nearest(&name, &available);
        Self::KeyNotFound {
            name,
            location,
            available,
            suggestion,
        }
    }

    /// True for structural parse failures.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// True for data-level failures (missing column, bad value).
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. } | Self::TypeMismatch { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(Arc::new(e))
    }
}

impl From<fastcsv_io::IoError> for Error {
    fn from(e: fastcsv_io::IoError) -> Self {
        match e {
            fastcsv_io::IoError::Io(inner) => Self::Io(inner),
            other => Self::InvalidValue(other.to_string()),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Nearest available header by edit distance.
fn suggest_nearest(name: &str, available: &[String]) -> Option<String> {
    let mut best: Option<(usize, &String)> = None;
    for candidate in available {
        if candidate.eq_ignore_ascii_case(name) {
            return Some(candidate.clone());
        }
        let distance = levenshtein(name, candidate);
        if distance <= 2 && best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, candidate)| candidate.clone())
}

/// Classic two-row Levenshtein distance.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}
