//! Console channel: a transport plus the accumulation buffer.

use std::time::Duration;

use log::trace;
use regex::Regex;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use super::decode::Utf8Decoder;
use crate::error::Result;
use crate::transport::Transport;

/// Sleep between empty reads so quiet lines do not busy-spin.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Stand-in deadline for timeouts too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `start + timeout`, saturating to roughly 30 years out on overflow.
pub fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    start.checked_add(timeout).unwrap_or_else(|| start + FAR_FUTURE)
}

/// High-level channel for a serial console session.
///
/// Wraps the transport and provides text-level reads, time-boxed drains
/// and pattern-terminated reads over a shared [`PatternBuffer`].
pub struct ConsoleChannel<T> {
    transport: T,
    buffer: PatternBuffer,
    decoder: Utf8Decoder,
}

/// Result of a pattern-terminated read.
#[derive(Debug)]
pub struct ReadResult {
    /// Everything collected during the read.
    pub data: String,

    /// Whether the pattern was matched before the deadline.
    pub pattern_matched: bool,
}

impl<T: Transport> ConsoleChannel<T> {
    /// Create a channel over an open transport.
    pub fn new(transport: T, search_depth: usize) -> Self {
        Self {
            transport,
            buffer: PatternBuffer::new(search_depth),
            decoder: Utf8Decoder::new(),
        }
    }

    /// Check if the underlying transport is open.
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Get a reference to the buffer.
    pub fn buffer(&self) -> &PatternBuffer {
        &self.buffer
    }

    /// Get a mutable reference to the buffer.
    pub fn buffer_mut(&mut self) -> &mut PatternBuffer {
        &mut self.buffer
    }

    /// Clear the accumulation buffer.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Read one chunk and decode it. Empty when nothing was waiting.
    ///
    /// The text is not added to the buffer.
    pub async fn read_chunk(&mut self) -> Result<String> {
        let bytes = self.transport.read_chunk().await?;
        if bytes.is_empty() {
            return Ok(String::new());
        }
        let text = self.decoder.decode(&bytes);
        trace!("rx {:?}", text);
        Ok(text)
    }

    /// Write text as UTF-8.
    pub async fn write_str(&mut self, text: &str) -> Result<()> {
        self.transport.write(text.as_bytes()).await
    }

    /// Discard input already received by the transport but not read.
    pub async fn discard_input(&mut self) -> Result<()> {
        self.decoder.reset();
        self.transport.clear_input().await
    }

    /// Read everything that arrives within `duration`.
    ///
    /// The collected text is appended to the buffer and also returned.
    pub async fn drain(&mut self, duration: Duration) -> Result<String> {
        let end = deadline_after(Instant::now(), duration);
        let mut out = String::new();

        while Instant::now() < end {
            let chunk = self.read_chunk().await?;
            if chunk.is_empty() {
                tokio::time::sleep_until(end.min(Instant::now() + POLL_INTERVAL)).await;
            } else {
                self.buffer.push_str(&chunk);
                out.push_str(&chunk);
            }
        }

        Ok(out)
    }

    /// Read into the buffer until the tail matches `pattern` or `deadline`
    /// passes, whichever comes first.
    pub async fn read_until_pattern(
        &mut self,
        pattern: &Regex,
        deadline: Instant,
    ) -> Result<ReadResult> {
        let start = self.buffer.len();
        let mut pattern_matched = false;

        while Instant::now() < deadline {
            let chunk = self.read_chunk().await?;
            if chunk.is_empty() {
                tokio::time::sleep_until(deadline.min(Instant::now() + POLL_INTERVAL)).await;
                continue;
            }

            self.buffer.push_str(&chunk);
            if self.buffer.tail_contains(pattern) {
                pattern_matched = true;
                break;
            }
        }

        Ok(ReadResult {
            data: self.buffer.as_str()[start..].to_string(),
            pattern_matched,
        })
    }

    /// Close the transport. Safe to call more than once.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }
}
