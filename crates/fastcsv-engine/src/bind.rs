//! Row-to-record binding.
//!
//! A [`RecordBinder`] is built once per input, after header resolution:
//! every descriptor resolves to a column index (or to a nested sub-binding)
//! up front, so the per-row work is extract, parse, assemble. Column
//! resolution precedence: index mapping, column mapping, declared column
//! order (headerless), key-strategy-transformed header match.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use fastcsv_io::{TextEncoding, decode_text};
use fastcsv_scan::RowView;
use fastcsv_types::{CsvValue, DateStrategy, NestedStrategy, TypeError, ValueParser};

use crate::config::DecodeOptions;
use crate::error::{Error, Location, Result};
use crate::header::HeaderMap;
use crate::record::{CsvRecord, FieldDescriptor, FieldKind, FieldMap};

/// A descriptor bound to its column source.
#[derive(Debug)]
struct BoundField {
    descriptor: FieldDescriptor,
    binding: Binding,
}

#[derive(Debug)]
enum Binding {
    /// Scalar (or JSON) field read from one column; `None` means absent.
    Column(Option<usize>),
    /// Nested record assembled from prefixed columns.
    Flatten(Vec<BoundField>),
    /// Nested record decoded from one JSON column.
    JsonColumn(Option<usize>),
}

/// Binds parsed rows to instances of `T`.
pub struct RecordBinder<T: CsvRecord> {
    bindings: Vec<BoundField>,
    headers: Arc<HeaderMap>,
    parser: ValueParser,
    dates_deferred: bool,
    trim: bool,
    encoding: TextEncoding,
    _marker: PhantomData<fn() -> T>,
}

impl<T: CsvRecord> RecordBinder<T> {
    /// Resolve every descriptor of `T` against the headers.
    ///
    /// `headerless` enables the declared-column-order rule; it is false
    /// whenever a real header row was parsed.
    pub fn new(headers: Arc<HeaderMap>, options: &DecodeOptions, headerless: bool) -> Result<Self> {
        let transformed: Vec<String> = headers
            .names()
            .iter()
            .map(|h| options.keys.apply(h))
            .collect();
        let ctx = ResolveContext {
            headers: &headers,
            transformed: &transformed,
            options,
            headerless,
        };
        let bindings = resolve_all(T::descriptors(), "", T::column_order(), &ctx)?;
        Ok(Self {
            bindings,
            headers,
            parser: ValueParser {
                bools: options.bools.clone(),
                numbers: options.numbers.clone(),
                dates: options.dates.clone(),
                nil: options.nil.clone(),
            },
            dates_deferred: matches!(options.dates, DateStrategy::Deferred),
            trim: options.trim_whitespace,
            encoding: options.encoding,
            _marker: PhantomData,
        })
    }

    /// The headers this binder was resolved against.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Bind one row. `row_number` is the 1-based data row index used in
    /// error locations.
    pub fn bind(&self, row: &RowView<'_>, row_number: u64) -> Result<T> {
        let mut fields = FieldMap::new();
        self.bind_into(&self.bindings, row, row_number, &[], &mut fields)?;
        T::construct(&mut fields).map_err(|e| attach_row(e, row_number))
    }

    fn bind_into(
        &self,
        bound: &[BoundField],
        row: &RowView<'_>,
        row_number: u64,
        path: &[&str],
        out: &mut FieldMap,
    ) -> Result<()> {
        for field in bound {
            let value = self.field_value(field, row, row_number, path)?;
            out.insert(field.descriptor.name, value);
        }
        Ok(())
    }

    fn field_value(
        &self,
        field: &BoundField,
        row: &RowView<'_>,
        row_number: u64,
        path: &[&str],
    ) -> Result<CsvValue> {
        let descriptor = &field.descriptor;
        match &field.binding {
            Binding::Column(source) | Binding::JsonColumn(source) => {
                let Some(index) = source else {
                    return self.absent(descriptor, row_number, path);
                };
                let Some(bytes) = row.field_bytes(*index) else {
                    // The row is shorter than the header row.
                    return self.absent(descriptor, row_number, path);
                };
                let text = self.decode_field(&bytes, row_number, *index, path)?;
                if self.parser.is_nil(&text) {
                    return Ok(CsvValue::Null);
                }
                let kind = match field.binding {
                    Binding::JsonColumn(_) => FieldKind::Json,
                    _ => descriptor.kind,
                };
                self.parse_scalar(kind, &text, || {
                    self.location(row_number, *index, path)
                })
            }
            Binding::Flatten(subfields) => {
                let mut sub = FieldMap::new();
                let mut subpath = path.to_vec();
                subpath.push(descriptor.name);
                self.bind_into(subfields, row, row_number, &subpath, &mut sub)?;
                Ok(CsvValue::Record(sub.into_values()))
            }
        }
    }

    fn absent(
        &self,
        descriptor: &FieldDescriptor,
        row_number: u64,
        path: &[&str],
    ) -> Result<CsvValue> {
        if descriptor.optional {
            return Ok(CsvValue::Null);
        }
        let mut location = Location::row(row_number);
        for segment in path.iter().rev() {
            location = location.inside(*segment);
        }
        Err(Error::key_not_found(
            descriptor.match_name(),
            location,
            self.headers.names().to_vec(),
        ))
    }

    fn decode_field(
        &self,
        bytes: &Cow<'_, [u8]>,
        row_number: u64,
        index: usize,
        path: &[&str],
    ) -> Result<String> {
        let text = decode_text(bytes, self.encoding).map_err(|e| Error::TypeMismatch {
            expected: "text",
            value: e.to_string(),
            location: self.location(row_number, index, path),
            hint: None,
        })?;
        let text = if self.trim { text.trim() } else { &text };
        Ok(text.to_owned())
    }

    fn parse_scalar(
        &self,
        kind: FieldKind,
        text: &str,
        location: impl Fn() -> Location,
    ) -> Result<CsvValue> {
        let map_err = |e: TypeError| type_error(e, location());
        match kind {
            FieldKind::Bool => self.parser.parse_bool(text).map(CsvValue::Bool).map_err(map_err),
            FieldKind::Int => self.parser.parse_int(text).map(CsvValue::Int).map_err(map_err),
            FieldKind::Float => self
                .parser
                .parse_float(text)
                .map(CsvValue::Float)
                .map_err(map_err),
            FieldKind::Decimal => self
                .parser
                .parse_decimal(text)
                .map(CsvValue::Decimal)
                .map_err(map_err),
            FieldKind::String => Ok(CsvValue::String(text.to_owned())),
            FieldKind::Date => {
                if self.dates_deferred {
                    return Ok(CsvValue::String(text.to_owned()));
                }
                self.parser.parse_date(text).map(CsvValue::Date).map_err(map_err)
            }
            FieldKind::DateTime => {
                if self.dates_deferred {
                    return Ok(CsvValue::String(text.to_owned()));
                }
                self.parser
                    .parse_datetime(text)
                    .map(CsvValue::DateTime)
                    .map_err(map_err)
            }
            FieldKind::Json | FieldKind::Nested(_) => serde_json::from_str(text)
                .map(CsvValue::Json)
                .map_err(|e| Error::TypeMismatch {
                    expected: "json",
                    value: format!("{text:.60}: {e}"),
                    location: location(),
                    hint: None,
                }),
        }
    }

    fn location(&self, row_number: u64, index: usize, path: &[&str]) -> Location {
        let mut location = Location::row(row_number);
        if let Some(name) = self.headers.get(index) {
            location = location.with_column(name);
        }
        for segment in path.iter().rev() {
            location = location.inside(*segment);
        }
        location
    }
}

struct ResolveContext<'a> {
    headers: &'a HeaderMap,
    transformed: &'a [String],
    options: &'a DecodeOptions,
    headerless: bool,
}

fn resolve_all(
    descriptors: &'static [FieldDescriptor],
    prefix: &str,
    column_order: Option<&'static [&'static str]>,
    ctx: &ResolveContext<'_>,
) -> Result<Vec<BoundField>> {
    descriptors
        .iter()
        .map(|descriptor| {
            let binding = match descriptor.kind {
                FieldKind::Nested(shape) => match &ctx.options.nested {
                    NestedStrategy::Error => {
                        return Err(Error::Unsupported(format!(
                            "nested record field {:?} (nested strategy is `error`)",
                            descriptor.name
                        )));
                    }
                    NestedStrategy::Json => {
                        Binding::JsonColumn(resolve_column(descriptor, prefix, column_order, ctx))
                    }
                    NestedStrategy::Flatten(sep) => {
                        let sub_prefix = format!("{prefix}{}{sep}", descriptor.match_name());
                        // Mapping and ordinal rules apply at the top level
                        // only; nested fields match by prefixed name.
                        Binding::Flatten(resolve_all(shape(), &sub_prefix, None, ctx)?)
                    }
                },
                _ => Binding::Column(resolve_column(descriptor, prefix, column_order, ctx)),
            };
            Ok(BoundField {
                descriptor: *descriptor,
                binding,
            })
        })
        .collect()
}

fn resolve_column(
    descriptor: &FieldDescriptor,
    prefix: &str,
    column_order: Option<&'static [&'static str]>,
    ctx: &ResolveContext<'_>,
) -> Option<usize> {
    let top_level = prefix.is_empty();

    if top_level {
        // 1. Explicit index mapping.
        if let Some((index, _)) = ctx
            .options
            .index_mapping
            .iter()
            .find(|(_, field)| field.as_str() == descriptor.name)
        {
            if *index < ctx.headers.len() {
                return Some(*index);
            }
        }
        // 2. Explicit column mapping.
        for (header, field) in &ctx.options.column_mapping {
            if field == descriptor.name {
                if let Some(index) = ctx.headers.index_of(header) {
                    return Some(index);
                }
            }
        }
    }

    // Explicit column-name override matches the raw header.
    if let Some(column) = descriptor.column {
        if let Some(index) = ctx.headers.index_of(&format!("{prefix}{column}")) {
            return Some(index);
        }
    }

    // 3. Declared column order, headerless inputs only.
    if ctx.headerless && top_level {
        if let Some(order) = column_order {
            if let Some(position) = order.iter().position(|n| *n == descriptor.name) {
                if position < ctx.headers.len() {
                    return Some(position);
                }
            }
        }
    }

    // 4. Key-strategy-transformed header match.
    let want = format!("{prefix}{}", descriptor.name);
    ctx.transformed.iter().position(|t| *t == want)
}

fn type_error(err: TypeError, location: Location) -> Error {
    match err {
        TypeError::TypeMismatch {
            expected,
            actual,
            hint,
        } => Error::TypeMismatch {
            expected,
            value: actual,
            location,
            hint: hint.map(str::to_owned),
        },
        TypeError::InvalidDateTime(value) => Error::TypeMismatch {
            expected: "date",
            value,
            location,
            hint: None,
        },
        TypeError::InvalidNumber(value) => Error::TypeMismatch {
            expected: "number",
            value,
            location,
            hint: None,
        },
        other => Error::TypeMismatch {
            expected: "value",
            value: other.to_string(),
            location,
            hint: None,
        },
    }
}

/// Fill in the row number on errors surfaced from `construct`.
fn attach_row(error: Error, row_number: u64) -> Error {
    match error {
        Error::TypeMismatch {
            expected,
            value,
            mut location,
            hint,
        } => {
            location.row.get_or_insert(row_number);
            Error::TypeMismatch {
                expected,
                value,
                location,
                hint,
            }
        }
        Error::KeyNotFound {
            name,
            mut location,
            available,
            suggestion,
        } => {
            location.row.get_or_insert(row_number);
            Error::KeyNotFound {
                name,
                location,
                available,
                suggestion,
            }
        }
        other => other,
    }
}
