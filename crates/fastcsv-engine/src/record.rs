//! The record-binding contract.
//!
//! The reflective part of record binding lives outside this crate: a
//! record type describes itself through [`CsvRecord`] (hand-written or
//! generated) and the engine drives the descriptor table. The trait is
//! deliberately small: a descriptor slice, an optional declared column
//! order for headerless inputs, and construct/destructure entry points
//! working over a [`FieldMap`] of typed values.

use std::collections::BTreeMap;

use fastcsv_types::CsvValue;

use crate::error::{Error, Location, Result};

/// The shape of one target field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Field name in the canonical (snake_case) convention.
    pub name: &'static str,
    /// Target type driving the value parser.
    pub kind: FieldKind,
    /// Whether an absent column or nil value is tolerated.
    pub optional: bool,
    /// Explicit column-name override (bypasses the key strategy).
    pub column: Option<&'static str>,
}

impl FieldDescriptor {
    /// A required field.
    #[must_use]
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            optional: false,
            column: None,
        }
    }

    /// An optional field.
    #[must_use]
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            optional: true,
            column: None,
        }
    }

    /// Override the column name used for header matching.
    #[must_use]
    pub const fn with_column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    /// The name used when matching headers.
    #[must_use]
    pub fn match_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }
}

/// Target type of a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Boolean, parsed under the bool strategy.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// Exact decimal.
    Decimal,
    /// String (trimmed when configured; never otherwise transformed).
    String,
    /// Calendar date, parsed under the date strategy.
    Date,
    /// Date and time, parsed under the date strategy.
    DateTime,
    /// Arbitrary JSON payload in one column.
    Json,
    /// Nested record; the function returns the nested descriptor table.
    Nested(fn() -> &'static [FieldDescriptor]),
}

/// A type that binds to and from CSV rows.
///
/// Typically generated; a hand-written implementation looks like:
///
/// ```rust,ignore
/// struct User {
///     id: i64,
///     name: String,
///     email: Option<String>,
/// }
///
/// impl CsvRecord for User {
///     fn descriptors() -> &'static [FieldDescriptor] {
///         &[
///             FieldDescriptor::required("id", FieldKind::Int),
///             FieldDescriptor::required("name", FieldKind::String),
///             FieldDescriptor::optional("email", FieldKind::String),
///         ]
///     }
///
///     fn construct(fields: &mut FieldMap) -> Result<Self> {
///         Ok(Self {
///             id: fields.take_int("id")?,
///             name: fields.take_string("name")?,
///             email: fields.take_opt_string("email")?,
///         })
///     }
///
///     fn destructure(&self) -> Vec<(&'static str, CsvValue)> {
///         vec![
///             ("id", CsvValue::Int(self.id)),
///             ("name", CsvValue::from(self.name.as_str())),
///             ("email", CsvValue::from(self.email.clone())),
///         ]
///     }
/// }
/// ```
pub trait CsvRecord: Sized {
    /// The field descriptor table, in declaration order.
    fn descriptors() -> &'static [FieldDescriptor];

    /// Declared column order for headerless inputs.
    ///
    /// `None` (the default) means descriptor order.
    fn column_order() -> Option<&'static [&'static str]> {
        None
    }

    /// Assemble an instance from bound field values.
    fn construct(fields: &mut FieldMap) -> Result<Self>;

    /// Break an instance into ordered `(field, value)` pairs for encoding.
    fn destructure(&self) -> Vec<(&'static str, CsvValue)>;
}

/// Typed field values for one record, keyed by field name.
#[derive(Debug, Default)]
pub struct FieldMap {
    values: BTreeMap<String, CsvValue>,
}

impl FieldMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing value map.
    #[must_use]
    pub fn from_values(values: BTreeMap<String, CsvValue>) -> Self {
        Self { values }
    }

    /// Build a map from a JSON object (nested `json` strategy).
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match json_to_value(value) {
            CsvValue::Record(map) => Ok(Self::from_values(map)),
            other => Err(Error::TypeMismatch {
                expected: "JSON object",
                value: other.type_name().to_owned(),
                location: Location::default(),
                hint: None,
            }),
        }
    }

    /// Insert a value.
    pub fn insert(&mut self, name: impl Into<String>, value: CsvValue) {
        self.values.insert(name.into(), value);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no entries remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the map into its underlying values.
    #[must_use]
    pub fn into_values(self) -> BTreeMap<String, CsvValue> {
        self.values
    }

    /// Remove and return a value; absent names yield `Null`.
    pub fn take(&mut self, name: &str) -> CsvValue {
        self.values.remove(name).unwrap_or(CsvValue::Null)
    }

    /// Take a required boolean.
    pub fn take_bool(&mut self, name: &str) -> Result<bool> {
        required(name, self.take(name), "bool", CsvValue::as_bool)
    }

    /// Take an optional boolean.
    pub fn take_opt_bool(&mut self, name: &str) -> Result<Option<bool>> {
        optional(name, self.take(name), "bool", CsvValue::as_bool)
    }

    /// Take a required integer.
    pub fn take_int(&mut self, name: &str) -> Result<i64> {
        required(name, self.take(name), "int", CsvValue::as_i64)
    }

    /// Take an optional integer.
    pub fn take_opt_int(&mut self, name: &str) -> Result<Option<i64>> {
        optional(name, self.take(name), "int", CsvValue::as_i64)
    }

    /// Take a required float (integers widen).
    pub fn take_float(&mut self, name: &str) -> Result<f64> {
        required(name, self.take(name), "float", CsvValue::as_f64)
    }

    /// Take an optional float.
    pub fn take_opt_float(&mut self, name: &str) -> Result<Option<f64>> {
        optional(name, self.take(name), "float", CsvValue::as_f64)
    }

    /// Take a required decimal.
    pub fn take_decimal(&mut self, name: &str) -> Result<rust_decimal::Decimal> {
        match self.take(name) {
            CsvValue::Decimal(d) => Ok(d),
            CsvValue::Int(i) => Ok(rust_decimal::Decimal::from(i)),
            other => Err(take_error(name, "decimal", &other)),
        }
    }

    /// Take a required string.
    pub fn take_string(&mut self, name: &str) -> Result<String> {
        match self.take(name) {
            CsvValue::String(s) => Ok(s),
            other => Err(take_error(name, "string", &other)),
        }
    }

    /// Take an optional string.
    pub fn take_opt_string(&mut self, name: &str) -> Result<Option<String>> {
        match self.take(name) {
            CsvValue::Null => Ok(None),
            CsvValue::String(s) => Ok(Some(s)),
            other => Err(take_error(name, "string", &other)),
        }
    }

    /// Take a required date.
    pub fn take_date(&mut self, name: &str) -> Result<chrono::NaiveDate> {
        required(name, self.take(name), "date", CsvValue::as_date)
    }

    /// Take an optional date.
    pub fn take_opt_date(&mut self, name: &str) -> Result<Option<chrono::NaiveDate>> {
        optional(name, self.take(name), "date", CsvValue::as_date)
    }

    /// Take a required datetime.
    pub fn take_datetime(&mut self, name: &str) -> Result<chrono::NaiveDateTime> {
        required(name, self.take(name), "datetime", CsvValue::as_datetime)
    }

    /// Take an optional datetime.
    pub fn take_opt_datetime(&mut self, name: &str) -> Result<Option<chrono::NaiveDateTime>> {
        optional(name, self.take(name), "datetime", CsvValue::as_datetime)
    }

    /// Take a required JSON value.
    pub fn take_json(&mut self, name: &str) -> Result<serde_json::Value> {
        match self.take(name) {
            CsvValue::Json(v) => Ok(v),
            other => Err(take_error(name, "json", &other)),
        }
    }

    /// Take a required nested record.
    pub fn take_nested<T: CsvRecord>(&mut self, name: &str) -> Result<T> {
        match self.take(name) {
            CsvValue::Record(map) => T::construct(&mut Self::from_values(map)),
            CsvValue::Json(value) => T::construct(&mut Self::from_json(value)?),
            other => Err(take_error(name, "record", &other)),
        }
    }

    /// Take an optional nested record.
    pub fn take_opt_nested<T: CsvRecord>(&mut self, name: &str) -> Result<Option<T>> {
        match self.take(name) {
            CsvValue::Null => Ok(None),
            CsvValue::Record(map) => T::construct(&mut Self::from_values(map)).map(Some),
            CsvValue::Json(value) => T::construct(&mut Self::from_json(value)?).map(Some),
            other => Err(take_error(name, "record", &other)),
        }
    }
}

fn required<T>(
    name: &str,
    value: CsvValue,
    expected: &'static str,
    get: impl Fn(&CsvValue) -> Option<T>,
) -> Result<T> {
    match get(&value) {
        Some(v) => Ok(v),
        None => Err(take_error(name, expected, &value)),
    }
}

fn optional<T>(
    name: &str,
    value: CsvValue,
    expected: &'static str,
    get: impl Fn(&CsvValue) -> Option<T>,
) -> Result<Option<T>> {
    if value.is_null() {
        return Ok(None);
    }
    required(name, value, expected, get).map(Some)
}

fn take_error(name: &str, expected: &'static str, value: &CsvValue) -> Error {
    Error::TypeMismatch {
        expected,
        value: value.type_name().to_owned(),
        location: Location::default().with_column(name),
        hint: None,
    }
}

/// Destructure a nested record into a [`CsvValue::Record`] value, for use
/// inside a parent's `destructure`.
pub fn nested_value<T: CsvRecord>(record: &T) -> CsvValue {
    CsvValue::Record(
        record
            .destructure()
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect(),
    )
}

/// Convert a JSON value into the [`CsvValue`] model.
fn json_to_value(value: serde_json::Value) -> CsvValue {
    match value {
        serde_json::Value::Null => CsvValue::Null,
        serde_json::Value::Bool(b) => CsvValue::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                CsvValue::Int(i)
            } else {
                CsvValue::Float(n.as_f64().unwrap_or(f64::MAX))
            }
        }
        serde_json::Value::String(s) => CsvValue::String(s),
        array @ serde_json::Value::Array(_) => CsvValue::Json(array),
        serde_json::Value::Object(map) => {
            let converted = map
                .into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect();
            CsvValue::Record(converted)
        }
    }
}
