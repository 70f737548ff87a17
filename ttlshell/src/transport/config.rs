//! Serial connection configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::driver::config::secs;

/// Serial link parameters. Framing is always 8 data bits, no parity,
/// one stop bit.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Platform device path or name (e.g. `/dev/ttyUSB0`, `COM3`).
    pub port: String,

    /// Baud rate (default: 115200).
    pub baud_rate: u32,

    /// Hardware read timeout; bounds how long one chunk read may block.
    #[serde(with = "secs")]
    pub read_timeout: Duration,

    /// Upper bound for a single write.
    #[serde(with = "secs")]
    pub write_timeout: Duration,
}

impl SerialConfig {
    /// Create a config for `port` with default settings.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Default::default()
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 115_200,
            read_timeout: Duration::from_millis(100),
            write_timeout: Duration::from_secs(1),
        }
    }
}
