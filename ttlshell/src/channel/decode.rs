//! Lossy UTF-8 decoding for chunked serial reads.

/// Incremental UTF-8 decoder.
///
/// Invalid sequences are dropped. A multi-byte character split across two
/// reads is held back and completed by the next chunk.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, returning every complete character it finishes.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // the first `valid_up_to` bytes are valid UTF-8
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => rest = &after[len..],
                        None => {
                            // incomplete sequence at the end of the chunk
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Drop any held-back partial character.
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
