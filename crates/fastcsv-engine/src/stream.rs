//! Streaming decode with backpressure.
//!
//! A [`RecordStream`] is an async iterator over decoded records. A
//! dedicated producer thread parses and binds rows in batches into a
//! shared queue; the watermark controller parks the producer when the
//! queue crosses the high watermark and wakes it when the consumer drains
//! it to the low watermark. With watermarks disabled the queue is a hard
//! cap at `max_rows`.
//!
//! The producer owns the source. Dropping the stream cancels production,
//! which releases the source.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use futures_core::Stream;
use parking_lot::{Condvar, Mutex};

use fastcsv_io::{Source, prepare_input};
use fastcsv_scan::RowParser;
use fastcsv_scan::scan::count_newlines;

use crate::bind::RecordBinder;
use crate::config::{DecodeOptions, MemoryLimit};
use crate::decode::{Decoder, check_row, resolve_headers};
use crate::error::Result;
use crate::record::CsvRecord;

/// Periodic decode progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Rows decoded so far.
    pub rows_decoded: u64,
    /// Estimated total rows (LF count; quoted newlines inflate it).
    pub estimated_total: u64,
    /// Input bytes consumed.
    pub bytes_processed: u64,
    /// Total input bytes.
    pub total_bytes: u64,
}

/// Progress callback.
pub type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

struct State<T> {
    queue: VecDeque<Result<T>>,
    finished: bool,
    cancelled: bool,
    waker: Option<Waker>,
    headers: Option<Vec<String>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    producer_cv: Condvar,
    high: usize,
    low: usize,
}

impl<T> Shared<T> {
    fn new(limit: &MemoryLimit) -> Self {
        let (high, low) = if limit.use_watermarks {
            (limit.high_rows(), limit.low_rows())
        } else {
            let cap = limit.max_rows();
            (cap, cap.saturating_sub(1))
        };
        Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                finished: false,
                cancelled: false,
                waker: None,
                headers: None,
            }),
            producer_cv: Condvar::new(),
            high,
            low,
        }
    }

    fn set_headers(&self, names: Vec<String>) {
        self.state.lock().headers = Some(names);
    }

    /// Push a batch, wake the consumer, and park above the high watermark.
    /// Returns false once the consumer is gone.
    fn push_batch(&self, batch: &mut Vec<T>) -> bool {
        let mut state = self.state.lock();
        if state.cancelled {
            return false;
        }
        state.queue.extend(batch.drain(..).map(Ok));
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
        while state.queue.len() >= self.high && !state.cancelled {
            self.producer_cv.wait(&mut state);
        }
        !state.cancelled
    }

    fn finish(&self, error: Option<crate::error::Error>) {
        let mut state = self.state.lock();
        if let Some(e) = error {
            if !state.cancelled {
                state.queue.push_back(Err(e));
            }
        }
        state.finished = true;
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }
}

/// Async iterator of decoded records with watermark backpressure.
pub struct RecordStream<T> {
    shared: Arc<Shared<T>>,
}

impl<T> RecordStream<T> {
    /// Header names, available once the producer resolved them.
    #[must_use]
    pub fn headers(&self) -> Option<Vec<String>> {
        self.shared.state.lock().headers.clone()
    }

    /// Rows currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.shared.state.lock().queue.len()
    }
}

impl<T> Stream for RecordStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let shared = &self.get_mut().shared;
        let mut state = shared.state.lock();
        if let Some(item) = state.queue.pop_front() {
            if state.queue.len() <= shared.low {
                shared.producer_cv.notify_all();
            }
            return Poll::Ready(Some(item));
        }
        if state.finished {
            return Poll::Ready(None);
        }
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<T> Drop for RecordStream<T> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.cancelled = true;
        state.queue.clear();
        self.shared.producer_cv.notify_all();
    }
}

impl Decoder {
    /// Stream a file with backpressure.
    pub fn stream_path<T>(
        &self,
        path: impl AsRef<std::path::Path>,
        limit: MemoryLimit,
    ) -> Result<RecordStream<T>>
    where
        T: CsvRecord + Send + 'static,
    {
        let source = Source::open(path)?;
        Ok(self.stream_source(source, limit, None))
    }

    /// Stream an in-memory buffer with backpressure.
    #[must_use]
    pub fn stream_slice<T>(&self, bytes: Vec<u8>, limit: MemoryLimit) -> RecordStream<T>
    where
        T: CsvRecord + Send + 'static,
    {
        self.stream_source(Source::from_vec(bytes), limit, None)
    }

    /// Stream a source with backpressure and an optional progress callback.
    ///
    /// The source moves into the producer thread and is released when the
    /// stream ends or is dropped.
    #[must_use]
    pub fn stream_source<T>(
        &self,
        source: Source,
        limit: MemoryLimit,
        progress: Option<ProgressFn>,
    ) -> RecordStream<T>
    where
        T: CsvRecord + Send + 'static,
    {
        let shared = Arc::new(Shared::<T>::new(&limit));
        let producer_shared = Arc::clone(&shared);
        let options = self.options().clone();
        std::thread::spawn(move || {
            let result = produce(&source, options, &limit, progress.as_ref(), &producer_shared);
            producer_shared.finish(result.err());
            drop(source);
        });
        RecordStream { shared }
    }
}

/// Producer body: parse, bind, and push batches until EOF, error, or cancel.
fn produce<T: CsvRecord>(
    source: &Source,
    mut options: DecodeOptions,
    limit: &MemoryLimit,
    progress: Option<&ProgressFn>,
    shared: &Shared<T>,
) -> Result<()> {
    let prepared = prepare_input(source.as_bytes(), options.encoding)?;
    options.encoding = prepared.encoding;
    let total_bytes = prepared.bytes.len() as u64;
    let estimated_total = progress.map(|_| count_newlines(&prepared.bytes) as u64);

    let mut parser = RowParser::new(&prepared.bytes, options.delimiter);
    let Some(resolution) = resolve_headers::<T>(&mut parser, &options)? else {
        return Ok(());
    };
    shared.set_headers(resolution.headers.names().to_vec());
    let binder = RecordBinder::<T>::new(
        Arc::clone(&resolution.headers),
        &options,
        resolution.headerless,
    )?;

    let mut pending = resolution.first_data_row;
    let mut batch: Vec<T> = Vec::with_capacity(limit.batch_size);
    let mut row_number = 0u64;
    loop {
        let row = match pending.take() {
            Some(row) => Some(row),
            None => parser.next_row(),
        };
        let Some(row) = row else { break };
        row_number += 1;
        let bound = check_row(&row, &options).and_then(|()| binder.bind(&row, row_number));
        match bound {
            Ok(record) => batch.push(record),
            Err(e) => {
                // Deliver rows decoded ahead of the failure before it.
                if !batch.is_empty() {
                    shared.push_batch(&mut batch);
                }
                return Err(e);
            }
        }
        if batch.len() >= limit.batch_size {
            if !shared.push_batch(&mut batch) {
                tracing::debug!(rows = row_number, "stream cancelled by consumer");
                return Ok(());
            }
            if let (Some(cb), Some(estimated)) = (progress, estimated_total) {
                cb(Progress {
                    rows_decoded: row_number,
                    estimated_total: estimated,
                    bytes_processed: parser.position() as u64,
                    total_bytes,
                });
            }
        }
    }
    if !batch.is_empty() {
        shared.push_batch(&mut batch);
    }
    if let (Some(cb), Some(estimated)) = (progress, estimated_total) {
        cb(Progress {
            rows_decoded: row_number,
            estimated_total: estimated,
            bytes_processed: parser.position() as u64,
            total_bytes,
        });
    }
    tracing::debug!(rows = row_number, "stream producer finished");
    Ok(())
}
