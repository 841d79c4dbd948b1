//! Typed field value representation.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

/// A decoded CSV field value.
///
/// This enum provides a type-safe way to carry field values between the
/// value parsers and the record binder, including the absent case.
#[derive(Debug, Clone, PartialEq)]
pub enum CsvValue {
    /// Absent value (empty field, configured nil token, or missing column).
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Exact decimal value.
    Decimal(rust_decimal::Decimal),
    /// String value.
    String(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time (no offset; strategies define the interpretation).
    DateTime(NaiveDateTime),
    /// JSON value (nested records under the `json` strategy).
    Json(serde_json::Value),
    /// Nested record (nested records under the `flatten` strategy).
    Record(BTreeMap<String, CsvValue>),
}

impl CsvValue {
    /// Check if the value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the value as a bool, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an i64, if it is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an f64, widening from integer if needed.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as a date, truncating a datetime if needed.
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(v) => Some(*v),
            Self::DateTime(v) => Some(v.date()),
            _ => None,
        }
    }

    /// Get the value as a datetime, widening a date to midnight if needed.
    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(v) => Some(*v),
            Self::Date(v) => v.and_hms_opt(0, 0, 0),
            _ => None,
        }
    }

    /// Get the type name as a string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Json(_) => "json",
            Self::Record(_) => "record",
        }
    }
}

impl Default for CsvValue {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for CsvValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for CsvValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for CsvValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for CsvValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for CsvValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for CsvValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<NaiveDate> for CsvValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for CsvValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<rust_decimal::Decimal> for CsvValue {
    fn from(v: rust_decimal::Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl<T> From<Option<T>> for CsvValue
where
    T: Into<CsvValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}
