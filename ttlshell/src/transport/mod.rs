//! Serial transport layer.
//!
//! This module owns the byte-level link to the board: opening the device,
//! short-timeout chunked reads and bounded writes. Everything above it
//! works against the [`Transport`] trait so the shell logic can be driven
//! by any half-duplex byte stream.

pub mod config;
#[cfg(test)]
pub(crate) mod mock;
mod serial;

pub use config::SerialConfig;
pub use serial::{PortInfo, SerialTransport, available_ports};

use std::future::Future;

use crate::error::Result;

/// Maximum number of bytes returned by a single [`Transport::read_chunk`].
pub const READ_CHUNK: usize = 4096;

/// A byte-stream connection to a remote console.
pub trait Transport: Send {
    /// Read up to [`READ_CHUNK`] bytes.
    ///
    /// Returns an empty vector when nothing arrived within the transport's
    /// short read timeout. Never waits longer than that timeout.
    fn read_chunk(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Write all bytes, failing with `TransportError::NotOpen` when closed.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Discard bytes that were received but not read yet.
    fn clear_input(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Release the connection. Calling it on a closed transport is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Check whether the transport is open.
    fn is_open(&self) -> bool;
}
