//! Decode entry points.
//!
//! [`Decoder`] fronts the whole decode side: sequential in-memory decode,
//! raw row access, and construction of the streaming and parallel
//! pipelines. Header resolution happens here, once, on the first parsed
//! row; everything downstream sees an immutable [`HeaderMap`].

use std::path::Path;
use std::sync::Arc;

use fastcsv_io::{Source, prepare_input};
use fastcsv_scan::{RowParser, RowView};

use crate::bind::RecordBinder;
use crate::config::{DecodeOptions, ParseMode};
use crate::error::{Error, Result};
use crate::header::HeaderMap;
use crate::record::CsvRecord;

/// CSV decoder configured once and reusable across inputs.
///
/// ```rust
/// use fastcsv_engine::{CsvRecord, DecodeOptions, Decoder, FieldDescriptor, FieldKind, FieldMap};
///
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// impl CsvRecord for Person {
///     fn descriptors() -> &'static [FieldDescriptor] {
///         const {
///             &[
///                 FieldDescriptor::required("name", FieldKind::String),
///                 FieldDescriptor::required("age", FieldKind::Int),
///             ]
///         }
///     }
///     fn construct(fields: &mut FieldMap) -> fastcsv_engine::Result<Self> {
///         Ok(Self {
///             name: fields.take_string("name")?,
///             age: fields.take_int("age")?,
///         })
///     }
///     fn destructure(&self) -> Vec<(&'static str, fastcsv_engine::CsvValue)> {
///         vec![
///             ("name", self.name.as_str().into()),
///             ("age", self.age.into()),
///         ]
///     }
/// }
///
/// let decoder = Decoder::new(DecodeOptions::default());
/// let people: Vec<Person> = decoder.decode_slice(b"name,age\nAlice,30\n").unwrap();
/// assert_eq!(people.len(), 1);
/// assert_eq!(people[0].age, 30);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    /// Create a decoder with the given options.
    #[must_use]
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    /// The decoder's options.
    #[must_use]
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode a whole file sequentially.
    pub fn decode_path<T: CsvRecord>(&self, path: impl AsRef<Path>) -> Result<Vec<T>> {
        let source = Source::open(path)?;
        self.decode_source(&source)
    }

    /// Decode an in-memory buffer sequentially.
    pub fn decode_slice<T: CsvRecord>(&self, bytes: &[u8]) -> Result<Vec<T>> {
        let source = Source::from_vec(bytes.to_vec());
        self.decode_source(&source)
    }

    /// Decode a prepared source sequentially.
    pub fn decode_source<T: CsvRecord>(&self, source: &Source) -> Result<Vec<T>> {
        let prepared = prepare_input(source.as_bytes(), self.options.encoding)?;
        let mut local_options = self.options.clone();
        local_options.encoding = prepared.encoding;

        let mut parser = RowParser::new(&prepared.bytes, self.options.delimiter);
        let Some(resolution) = resolve_headers::<T>(&mut parser, &local_options)? else {
            return Ok(Vec::new());
        };
        let binder = RecordBinder::<T>::new(resolution.headers, &local_options, resolution.headerless)?;

        let mut records = Vec::new();
        let mut row_number = 0u64;
        let mut pending = resolution.first_data_row;
        loop {
            let row = match pending.take() {
                Some(row) => row,
                None => match parser.next_row() {
                    Some(row) => row,
                    None => break,
                },
            };
            row_number += 1;
            check_row(&row, &local_options)?;
            records.push(binder.bind(&row, row_number)?);
        }
        tracing::debug!(rows = records.len(), "sequential decode complete");
        Ok(records)
    }

    /// Decode raw rows (no record binding); the header row is excluded.
    pub fn decode_rows(&self, bytes: &[u8]) -> Result<Vec<Vec<String>>> {
        let prepared = prepare_input(bytes, self.options.encoding)?;
        let mut local_options = self.options.clone();
        local_options.encoding = prepared.encoding;

        let mut parser = RowParser::new(&prepared.bytes, self.options.delimiter);
        let mut rows = Vec::new();
        let mut first = true;
        while let Some(row) = parser.next_row() {
            check_row(&row, &local_options)?;
            if first && self.options.has_headers {
                first = false;
                continue;
            }
            first = false;
            rows.push(row_strings(&row, &local_options)?);
        }
        Ok(rows)
    }

    /// Read just the header row, if the options expect one.
    pub fn read_headers(&self, bytes: &[u8]) -> Result<Option<Vec<String>>> {
        if !self.options.has_headers {
            return Ok(None);
        }
        let prepared = prepare_input(bytes, self.options.encoding)?;
        let mut local_options = self.options.clone();
        local_options.encoding = prepared.encoding;
        let mut parser = RowParser::new(&prepared.bytes, self.options.delimiter);
        match parser.next_row() {
            Some(row) => {
                check_row(&row, &local_options)?;
                Ok(Some(row_strings(&row, &local_options)?))
            }
            None => Ok(None),
        }
    }
}

/// Outcome of header resolution on a fresh parser.
pub(crate) struct HeaderResolution<'a> {
    /// The immutable header map.
    pub headers: Arc<HeaderMap>,
    /// True when no header row existed (enables ordinal binding).
    pub headerless: bool,
    /// The first data row, when it was consumed to size synthetic headers.
    pub first_data_row: Option<RowView<'a>>,
}

/// Resolve headers from the first row. Returns `None` on empty input.
pub(crate) fn resolve_headers<'a, T: CsvRecord>(
    parser: &mut RowParser<'a>,
    options: &DecodeOptions,
) -> Result<Option<HeaderResolution<'a>>> {
    if options.has_headers {
        let Some(row) = parser.next_row() else {
            return Ok(None);
        };
        check_row(&row, options)?;
        let names = row_strings(&row, options)?;
        return Ok(Some(HeaderResolution {
            headers: Arc::new(HeaderMap::from_row(names)),
            headerless: false,
            first_data_row: None,
        }));
    }
    // Headerless: a declared column order overrides synthesis.
    if let Some(order) = T::column_order() {
        return Ok(Some(HeaderResolution {
            headers: Arc::new(HeaderMap::from_column_order(order)),
            headerless: true,
            first_data_row: None,
        }));
    }
    let Some(row) = parser.next_row() else {
        return Ok(None);
    };
    check_row(&row, options)?;
    let headers = Arc::new(HeaderMap::synthetic(row.len()));
    Ok(Some(HeaderResolution {
        headers,
        headerless: true,
        first_data_row: Some(row),
    }))
}

/// Structural checks applied to every row before binding.
pub(crate) fn check_row(row: &RowView<'_>, options: &DecodeOptions) -> Result<()> {
    if row.unterminated_quote() {
        let column = row
            .span(row.len().saturating_sub(1))
            .map_or(0, |span| span.start as u64);
        return Err(Error::parse("Unterminated quoted field", row.line(), column));
    }
    if options.mode == ParseMode::Strict {
        if row.quote_in_unquoted() {
            return Err(Error::Parse {
                message: "Quote character in unquoted field".to_owned(),
                line: Some(row.line()),
                column: None,
            });
        }
        if row.stray_after_quote() {
            return Err(Error::Parse {
                message: "Unexpected character after closing quote".to_owned(),
                line: Some(row.line()),
                column: None,
            });
        }
        if let Some(expected) = options.expected_field_count {
            if row.len() != expected {
                return Err(Error::Parse {
                    message: format!("Expected {expected} fields, found {}", row.len()),
                    line: Some(row.line()),
                    column: None,
                });
            }
        }
    }
    Ok(())
}

/// Extract every field of a row as an owned string.
pub(crate) fn row_strings(row: &RowView<'_>, options: &DecodeOptions) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(row.len());
    for bytes in row.iter_fields() {
        let text = fastcsv_io::decode_text(&bytes, options.encoding)
            .map_err(|e| Error::InvalidValue(e.to_string()))?;
        let text = if options.trim_whitespace {
            text.trim()
        } else {
            &text
        };
        out.push(text.to_owned());
    }
    Ok(out)
}
