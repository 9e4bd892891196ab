//! stdio transport for MCP server.
//!
//! This module implements the stdio transport as specified by MCP:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not MCP messages)
//!
//! # Thread Safety
//!
//! Reading is single-consumer and owned by the server loop. Writing goes
//! through [`ResponseSink`], which many handler tasks share; its lock is
//! held for exactly one frame so responses never interleave.
//!
//! Both halves are generic over the underlying stream so tests can drive
//! them with in-memory pipes.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{trace, warn};

use crate::error::TransportError;
use crate::mcp::protocol::OutgoingMessage;

/// Default limit for a single incoming frame.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Reads newline-delimited frames from a byte stream.
pub struct FrameReader<R> {
    /// Buffered reader for the input stream.
    reader: BufReader<R>,
    /// Bytes of the frame being assembled.
    buf: Vec<u8>,
    /// Largest accepted frame, excluding the line terminator.
    max_frame_bytes: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Creates a new frame reader.
    #[must_use]
    pub fn new(reader: R, max_frame_bytes: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
            max_frame_bytes,
        }
    }

    /// Reads the next complete message.
    ///
    /// Blank lines are skipped. Returns `None` at end of stream; an
    /// unterminated trailing fragment is discarded rather than returned.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. Bytes of a partially received frame stay
    /// buffered until the next call.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails, a frame exceeds the size limit, or
    /// a frame is not valid UTF-8. All of these are fatal.
    pub async fn read_message(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            if !self.fill_frame().await? {
                if !self.buf.is_empty() {
                    warn!(
                        bytes = self.buf.len(),
                        "Discarding unterminated frame at end of stream"
                    );
                    self.buf.clear();
                }
                return Ok(None);
            }

            // Remove the trailing newline
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }

            let line = String::from_utf8(std::mem::take(&mut self.buf))
                .map_err(|_| TransportError::InvalidUtf8)?;

            if line.trim().is_empty() {
                continue;
            }

            trace!(bytes = line.len(), "Frame received");
            return Ok(Some(line));
        }
    }

    /// Accumulates bytes up to and including the next newline.
    ///
    /// Returns `false` if the stream ended first.
    async fn fill_frame(&mut self) -> Result<bool, TransportError> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(false);
            }

            let (take, complete) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };

            let content_len = self.buf.len() + if complete { take - 1 } else { take };
            if content_len > self.max_frame_bytes {
                return Err(TransportError::FrameTooLarge {
                    limit: self.max_frame_bytes,
                });
            }

            self.buf.extend_from_slice(&available[..take]);
            self.reader.consume(take);

            if complete {
                return Ok(true);
            }
        }
    }
}

/// Writes newline-terminated frames to a byte stream.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Creates a new frame writer.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one JSON message followed by a newline and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub async fn write_message(&mut self, json: &str) -> Result<(), TransportError> {
        // MCP spec: messages must not contain embedded newlines
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        let mut frame = Vec::with_capacity(json.len() + 1);
        frame.extend_from_slice(json.as_bytes());
        frame.push(b'\n');

        self.writer.write_all(&frame).await?;
        self.writer.flush().await?;

        Ok(())
    }
}

/// Shared, serialised access to the outgoing half of the transport.
pub struct ResponseSink<W> {
    inner: Arc<Mutex<FrameWriter<W>>>,
}

impl<W> Clone for ResponseSink<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: AsyncWrite + Unpin> ResponseSink<W> {
    /// Wraps a writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FrameWriter::new(writer))),
        }
    }

    /// Encodes and writes one response.
    ///
    /// Encoding happens before the lock is taken; the lock is held only for
    /// the single frame write. A payload that cannot be serialised is
    /// replaced by an internal error for the same request.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let json = message
            .encode_lossy()
            .map_err(|e| TransportError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        self.inner.lock().await.write_message(&json).await
    }
}

/// Creates the stdin reader and stdout sink for a server process.
#[must_use]
pub fn stdio(
    max_frame_bytes: usize,
) -> (FrameReader<tokio::io::Stdin>, ResponseSink<tokio::io::Stdout>) {
    (
        FrameReader::new(tokio::io::stdin(), max_frame_bytes),
        ResponseSink::new(tokio::io::stdout()),
    )
}
