//! Byte-buffered async output sink.
//!
//! Small writes accumulate in a fixed-capacity buffer; a write that would
//! overflow the buffer flushes first, and a write larger than the whole
//! buffer bypasses it entirely. `close()` flushes, shuts the writer down,
//! and consumes the sink, so every exit path that holds a sink either
//! closes it or loses buffered bytes loudly (a drop with buffered data
//! logs a warning; async drop cannot flush).

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{IoError, Result};

/// Default buffer capacity: 64 KiB.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// A byte-buffered writer over any async byte sink.
#[derive(Debug)]
pub struct BufferedSink<W> {
    writer: Option<W>,
    buf: BytesMut,
    capacity: usize,
    bytes_written: u64,
}

impl BufferedSink<tokio::fs::File> {
    /// Create (truncate) a file and wrap it in a sink.
    pub async fn create(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Self::new(file))
    }
}

impl<W: AsyncWrite + Unpin> BufferedSink<W> {
    /// Wrap a writer with the default capacity.
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, DEFAULT_CAPACITY)
    }

    /// Wrap a writer with an explicit buffer capacity.
    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            writer: Some(writer),
            buf: BytesMut::with_capacity(capacity),
            capacity,
            bytes_written: 0,
        }
    }

    /// Bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Get a reference to the underlying writer, if the sink is open.
    #[must_use]
    pub fn get_ref(&self) -> Option<&W> {
        self.writer.as_ref()
    }

    /// Total bytes accepted, buffered or flushed.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Append bytes, flushing beforehand if they would overflow the buffer.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.writer.is_none() {
            return Err(IoError::Closed);
        }
        if self.buf.len() + bytes.len() > self.capacity {
            self.flush().await?;
        }
        self.bytes_written += bytes.len() as u64;
        if bytes.len() > self.capacity {
            // Oversized writes skip the buffer (which is empty post-flush).
            let writer = self.writer.as_mut().ok_or(IoError::Closed)?;
            writer.write_all(bytes).await?;
            return Ok(());
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Drain the buffer to the writer.
    pub async fn flush(&mut self) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(IoError::Closed)?;
        if !self.buf.is_empty() {
            writer.write_all(&self.buf).await?;
            self.buf.clear();
        }
        writer.flush().await?;
        Ok(())
    }

    /// Flush, shut the writer down, and consume the sink.
    pub async fn close(mut self) -> Result<()> {
        self.flush().await?;
        if let Some(mut writer) = self.writer.take() {
            writer.shutdown().await?;
        }
        Ok(())
    }
}

impl<W> Drop for BufferedSink<W> {
    fn drop(&mut self) {
        if self.writer.is_some() && !self.buf.is_empty() {
            tracing::warn!(
                buffered = self.buf.len(),
                "BufferedSink dropped with unflushed bytes; call close()"
            );
        }
    }
}
