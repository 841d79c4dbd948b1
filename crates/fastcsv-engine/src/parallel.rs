//! Parallel decode and encode.
//!
//! Decode: the input splits into quote-aware row-aligned chunks, a bounded
//! rayon pool runs the parse-and-bind pipeline per chunk, and results
//! drain either in chunk order (an index-keyed pending map holds
//! early-arriving later chunks) or in completion order. The first worker
//! error raises a shared cancel flag; peers observe it between rows and
//! stop, and partial results are discarded.
//!
//! Encode: workers render record chunks to owned byte buffers; a single
//! writer drains the buffers in chunk order, so output order is
//! unconditional.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use rayon::ThreadPoolBuilder;

use fastcsv_io::{BufferedSink, Source, prepare_input};
use fastcsv_scan::{RowParser, split_chunks};
use tokio::io::AsyncWrite;

use crate::bind::RecordBinder;
use crate::config::{DecodeOptions, ParallelConfig, ParallelEncodeConfig};
use crate::decode::{Decoder, check_row, resolve_headers};
use crate::encode::{Encoder, RowRenderer};
use crate::error::{Error, Result};
use crate::record::CsvRecord;

/// How often workers poll the cancel flag, in rows.
const CANCEL_CHECK_INTERVAL: u64 = 256;

impl Decoder {
    /// Decode a file with a bounded worker pool.
    pub fn decode_parallel_path<T>(
        &self,
        path: impl AsRef<std::path::Path>,
        config: &ParallelConfig,
    ) -> Result<Vec<T>>
    where
        T: CsvRecord + Send,
    {
        let source = Source::open(path)?;
        self.decode_parallel(&source, config)
    }

    /// Decode a source with a bounded worker pool, collecting all records.
    pub fn decode_parallel<T>(&self, source: &Source, config: &ParallelConfig) -> Result<Vec<T>>
    where
        T: CsvRecord + Send,
    {
        let mut records = Vec::new();
        self.decode_parallel_each(source, config, |mut batch: Vec<T>| {
            records.append(&mut batch);
        })?;
        Ok(records)
    }

    /// Decode a source in parallel, delivering each chunk's records to the
    /// callback (in chunk order when `preserve_order` is set, in completion
    /// order otherwise).
    pub fn decode_parallel_each<T, F>(
        &self,
        source: &Source,
        config: &ParallelConfig,
        mut on_batch: F,
    ) -> Result<()>
    where
        T: CsvRecord + Send,
        F: FnMut(Vec<T>),
    {
        let prepared = prepare_input(source.as_bytes(), self.options().encoding)?;
        let mut options = self.options().clone();
        options.encoding = prepared.encoding;

        // Header resolution runs sequentially before fan-out.
        let mut parser = RowParser::new(&prepared.bytes, options.delimiter);
        let Some(resolution) = resolve_headers::<T>(&mut parser, &options)? else {
            return Ok(());
        };
        let binder =
            RecordBinder::<T>::new(Arc::clone(&resolution.headers), &options, resolution.headerless)?;
        // A consumed first data row only happens for synthetic headers;
        // hand it to the callback as a leading one-row batch.
        if let Some(row) = resolution.first_data_row {
            on_batch(vec![binder.bind(&row, 1)?]);
        }
        let data_start = parser.position();

        let chunks = split_chunks(
            &prepared.bytes[data_start..],
            options.delimiter,
            config.chunk_size_bytes,
            false,
        );
        if chunks.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            chunks = chunks.len(),
            parallelism = config.parallelism,
            preserve_order = config.preserve_order,
            "parallel decode"
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.parallelism)
            .build()
            .map_err(|e| Error::Io(Arc::new(std::io::Error::other(e))))?;

        let cancel = AtomicBool::new(false);
        let data = &prepared.bytes[data_start..];
        let (sender, receiver) = mpsc::channel::<(usize, Result<Vec<T>>)>();

        // The drain loop must run on the caller thread: with the scope body
        // on a pool thread, a single-worker pool would have nowhere left to
        // run the spawned chunks.
        pool.in_place_scope(|scope| -> Result<()> {
            for chunk in &chunks {
                let sender = sender.clone();
                let cancel = &cancel;
                let binder = &binder;
                let options = &options;
                scope.spawn(move |_| {
                    if cancel.load(Ordering::Relaxed) {
                        return;
                    }
                    let result = decode_chunk(&data[chunk.start..chunk.end], options, binder, cancel);
                    if result.is_err() {
                        cancel.store(true, Ordering::Relaxed);
                    }
                    // The receiver may be gone after an error; nothing to do.
                    let _ = sender.send((chunk.index, result));
                });
            }
            drop(sender);

            // Ordered drain: hold early-arriving later chunks until the
            // expected index shows up.
            let mut pending: hashbrown::HashMap<usize, Vec<T>> = hashbrown::HashMap::new();
            let mut next = 0usize;
            for (index, result) in receiver {
                let batch = match result {
                    Ok(batch) => batch,
                    Err(e) => {
                        cancel.store(true, Ordering::Relaxed);
                        return Err(e);
                    }
                };
                if !config.preserve_order {
                    on_batch(batch);
                    continue;
                }
                pending.insert(index, batch);
                while let Some(ready) = pending.remove(&next) {
                    on_batch(ready);
                    next += 1;
                }
            }
            Ok(())
        })
    }
}

/// Parse and bind one chunk. Row numbers are chunk-local.
fn decode_chunk<T: CsvRecord>(
    bytes: &[u8],
    options: &DecodeOptions,
    binder: &RecordBinder<T>,
    cancel: &AtomicBool,
) -> Result<Vec<T>> {
    let mut parser = RowParser::new(bytes, options.delimiter);
    let mut records = Vec::new();
    let mut row_number = 0u64;
    while let Some(row) = parser.next_row() {
        row_number += 1;
        if row_number % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return Ok(records);
        }
        check_row(&row, options)?;
        records.push(binder.bind(&row, row_number)?);
    }
    Ok(records)
}

impl Encoder {
    /// Encode a bounded record slice with a worker pool, writing ordered
    /// chunks through the sink.
    ///
    /// The header derives from the first record and is written before any
    /// chunk. Rendering blocks the calling task while the pool works; run
    /// inside `spawn_blocking` when that matters.
    pub async fn encode_parallel<T, W>(
        &self,
        records: &[T],
        config: &ParallelEncodeConfig,
        sink: &mut BufferedSink<W>,
    ) -> Result<()>
    where
        T: CsvRecord + Sync,
        W: AsyncWrite + Unpin,
    {
        let Some(first) = records.first() else {
            return Ok(());
        };
        let renderer = RowRenderer::new(self.options());
        let columns = RowRenderer::derive_columns(&first.destructure());

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.parallelism)
            .build()
            .map_err(|e| Error::Io(Arc::new(std::io::Error::other(e))))?;

        tracing::debug!(
            records = records.len(),
            chunk_rows = config.chunk_rows,
            parallelism = config.parallelism,
            "parallel encode"
        );

        let rendered: Vec<Result<bytes::BytesMut>> = pool.install(|| {
            use rayon::prelude::*;
            records
                .par_chunks(config.chunk_rows)
                .map(|chunk| {
                    let mut out = bytes::BytesMut::with_capacity(config.buffer_bytes.min(1 << 20));
                    for record in chunk {
                        renderer.render_record(&columns, &record.destructure(), &mut out)?;
                    }
                    Ok(out)
                })
                .collect()
        });

        if self.options().has_headers {
            let mut header = bytes::BytesMut::new();
            renderer.render_header(&columns, &mut header);
            sink.write(&header).await?;
        }
        // `par_chunks` + `collect` preserves chunk order; the single writer
        // drains sequentially.
        for buffer in rendered {
            sink.write(&buffer?).await?;
        }
        sink.flush().await?;
        Ok(())
    }
}
