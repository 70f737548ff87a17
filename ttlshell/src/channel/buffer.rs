//! Accumulation buffer with tail search and a consumption mark.
//!
//! Prompt detection only looks at the last `search_depth` bytes of what
//! has been read: the prompt is always at the end, and re-scanning a large
//! `dmesg` on every chunk would make the read loop quadratic.

use regex::Regex;

/// Buffer for accumulating console output and searching it for patterns.
///
/// Holds every character read since the last [`clear`](Self::clear).
/// A separate mark records how far the bootstrapper has already answered,
/// so a login prompt is not answered twice.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated output.
    buffer: String,

    /// How many bytes from the end to search for prompt patterns.
    search_depth: usize,

    /// Byte offset up to which the output has been consumed.
    mark: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: String::with_capacity(4096),
            search_depth,
            mark: 0,
        }
    }

    /// Append decoded output.
    pub fn push_str(&mut self, data: &str) {
        self.buffer.push_str(data);
    }

    /// Search the entire buffer for a pattern.
    pub fn search_full(&self, pattern: &Regex) -> Option<regex::Match<'_>> {
        pattern.find(&self.buffer)
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        pattern.is_match(self.tail())
    }

    /// Check whether the output after the mark matches a pattern.
    pub fn unconsumed_contains(&self, pattern: &Regex) -> bool {
        pattern.is_match(&self.buffer[self.mark..])
    }

    /// Mark everything read so far as consumed.
    pub fn consume(&mut self) {
        self.mark = self.buffer.len();
    }

    /// The last `search_depth` bytes, widened to a char boundary.
    fn tail(&self) -> &str {
        let mut start = self.buffer.len().saturating_sub(self.search_depth);
        while !self.buffer.is_char_boundary(start) {
            start -= 1;
        }
        &self.buffer[start..]
    }

    /// Get the buffer contents.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Get the current buffer length in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and the mark.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.mark = 0;
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
