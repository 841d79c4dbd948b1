//! Encode entry points.
//!
//! The first record fixes the column universe: its destructured key order
//! (nested records flattened with a `.` separator) becomes the header and
//! the field order of every subsequent row. Later records missing a known
//! key emit the nil representation; keys outside the universe are ignored.

use std::path::Path;

use bytes::BytesMut;
use futures_util::{Stream, StreamExt};
use tokio::io::AsyncWrite;

use fastcsv_io::BufferedSink;
use fastcsv_scan::RowWriter;
use fastcsv_types::{CsvValue, ValueFormatter};

use crate::config::EncodeOptions;
use crate::error::{Error, Result};
use crate::record::CsvRecord;

/// Separator for flattened nested keys on output.
const FLATTEN_SEP: &str = ".";

/// Renders records to row bytes under the encode options.
#[derive(Debug, Clone)]
pub(crate) struct RowRenderer {
    writer: RowWriter,
    formatter: ValueFormatter,
    keys: fastcsv_types::KeyStrategy,
    nil_repr: String,
}

impl RowRenderer {
    pub(crate) fn new(options: &EncodeOptions) -> Self {
        Self {
            writer: RowWriter::new(options.delimiter, options.line_ending),
            formatter: ValueFormatter {
                bools: options.bools.clone(),
                numbers: options.numbers.clone(),
                dates: options.dates.clone(),
            },
            keys: options.keys.clone(),
            nil_repr: options.nil_repr.clone(),
        }
    }

    /// Flattened key order of a destructured record.
    pub(crate) fn derive_columns(pairs: &[(&'static str, CsvValue)]) -> Vec<String> {
        flatten_pairs(pairs.to_vec()).into_iter().map(|(k, _)| k).collect()
    }

    /// Write the header row (key transform applied).
    pub(crate) fn render_header(&self, columns: &[String], out: &mut BytesMut) {
        let names: Vec<String> = columns.iter().map(|c| self.keys.unapply(c)).collect();
        self.writer.write_row(out, names.iter().map(String::as_bytes));
    }

    /// Write one record as a row in column order.
    pub(crate) fn render_record(
        &self,
        columns: &[String],
        pairs: &[(&'static str, CsvValue)],
        out: &mut BytesMut,
    ) -> Result<()> {
        let flattened = flatten_pairs(pairs.to_vec());
        let mut texts = Vec::with_capacity(columns.len());
        for column in columns {
            let value = flattened
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value);
            let text = match value {
                None | Some(CsvValue::Null) => self.nil_repr.clone(),
                Some(value) => self
                    .formatter
                    .format(value)
                    .map_err(|e| Error::InvalidValue(e.to_string()))?,
            };
            texts.push(text);
        }
        self.writer.write_row(out, texts.iter().map(String::as_bytes));
        Ok(())
    }
}

/// Expand nested `Record` values into dot-joined keys, depth first.
fn flatten_pairs(pairs: Vec<(&'static str, CsvValue)>) -> Vec<(String, CsvValue)> {
    fn walk(prefix: &str, name: &str, value: CsvValue, out: &mut Vec<(String, CsvValue)>) {
        let full = if prefix.is_empty() {
            name.to_owned()
        } else {
            format!("{prefix}{FLATTEN_SEP}{name}")
        };
        match value {
            CsvValue::Record(map) => {
                for (key, nested) in map {
                    walk(&full, &key, nested, out);
                }
            }
            other => out.push((full, other)),
        }
    }
    let mut out = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        walk("", name, value, &mut out);
    }
    out
}

/// CSV encoder configured once and reusable across outputs.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    options: EncodeOptions,
}

impl Encoder {
    /// Create an encoder with the given options.
    #[must_use]
    pub fn new(options: EncodeOptions) -> Self {
        Self { options }
    }

    /// The encoder's options.
    #[must_use]
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encode records into an in-memory buffer.
    pub fn encode_to_vec<T: CsvRecord>(&self, records: &[T]) -> Result<Vec<u8>> {
        let Some(first) = records.first() else {
            return Ok(Vec::new());
        };
        let renderer = RowRenderer::new(&self.options);
        let columns = RowRenderer::derive_columns(&first.destructure());
        let mut out = BytesMut::new();
        if self.options.has_headers {
            renderer.render_header(&columns, &mut out);
        }
        for record in records {
            renderer.render_record(&columns, &record.destructure(), &mut out)?;
        }
        Ok(out.to_vec())
    }

    /// Encode records to a file.
    pub async fn encode_path<T: CsvRecord>(
        &self,
        records: &[T],
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let sink = BufferedSink::create(path).await?;
        let mut encoder = self.stream_writer(sink);
        for record in records {
            encoder.write_record(record).await?;
        }
        encoder.finish().await
    }

    /// Wrap a sink in a push-style streaming encoder.
    #[must_use]
    pub fn stream_writer<W: AsyncWrite + Unpin>(&self, sink: BufferedSink<W>) -> StreamEncoder<W> {
        StreamEncoder {
            renderer: RowRenderer::new(&self.options),
            has_headers: self.options.has_headers,
            sink,
            columns: None,
            rows: 0,
        }
    }
}

/// Push-style streaming encoder over a buffered sink.
///
/// ```rust,ignore
/// let mut encoder = Encoder::new(options).stream_writer(sink);
/// while let Some(record) = records.next().await {
///     encoder.write_record(&record).await?;
/// }
/// encoder.finish().await?;
/// ```
pub struct StreamEncoder<W> {
    renderer: RowRenderer,
    has_headers: bool,
    sink: BufferedSink<W>,
    columns: Option<Vec<String>>,
    rows: u64,
}

impl<W: AsyncWrite + Unpin> StreamEncoder<W> {
    /// Rows written so far (header excluded).
    #[must_use]
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Encode and write one record.
    ///
    /// The first record fixes the column universe and, when configured,
    /// writes the header row.
    pub async fn write_record<T: CsvRecord>(&mut self, record: &T) -> Result<()> {
        let pairs = record.destructure();
        let mut out = BytesMut::new();
        if self.columns.is_none() {
            let columns = RowRenderer::derive_columns(&pairs);
            if self.has_headers {
                self.renderer.render_header(&columns, &mut out);
            }
            self.columns = Some(columns);
        }
        let columns = self.columns.as_ref().ok_or_else(|| {
            Error::Unsupported("encoder column state lost".to_owned())
        })?;
        self.renderer.render_record(columns, &pairs, &mut out)?;
        self.sink.write(&out).await?;
        self.rows += 1;
        Ok(())
    }

    /// Pull every record from a stream and write it.
    pub async fn write_stream<T, S>(&mut self, mut stream: S) -> Result<()>
    where
        T: CsvRecord,
        S: Stream<Item = T> + Unpin,
    {
        while let Some(record) = stream.next().await {
            self.write_record(&record).await?;
        }
        Ok(())
    }

    /// Flush and close the sink.
    pub async fn finish(self) -> Result<()> {
        tracing::debug!(rows = self.rows, "stream encoder finished");
        self.sink.close().await?;
        Ok(())
    }
}
