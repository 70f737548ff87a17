//! Channel layer for pattern matching over the serial console.
//!
//! This module turns raw transport bytes into text, accumulates it for
//! prompt detection and cleans command transcripts.

mod buffer;
mod console;
mod decode;
mod patterns;
pub mod sanitize;

pub use buffer::PatternBuffer;
pub use console::{ConsoleChannel, POLL_INTERVAL, ReadResult, deadline_after};
pub use decode::Utf8Decoder;
pub use patterns::{
    ACTIVATE_PATTERN, DEFAULT_FAILURE_PHRASES, LOGIN_PATTERN, PASSWORD_PATTERN, PROMPT_PATTERN,
    PatternSet,
};
