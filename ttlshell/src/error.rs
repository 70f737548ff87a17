//! Error types for ttlshell.

use std::io;
use thiserror::Error;

/// Main error type for ttlshell operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Serial transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Configuration loading errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Report serialization errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Transport layer errors (opening the device, byte I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The serial device could not be opened (missing, busy, no permission)
    #[error("Failed to open serial port {port}: {source}")]
    OpenFailed {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Write attempted on a closed transport
    #[error("Transport is not open")]
    NotOpen,

    /// Serial driver error after the port was opened
    #[error("Serial error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The blocking I/O task panicked or was cancelled
    #[error("Serial I/O task failed: {0}")]
    Task(String),
}

/// Channel layer errors.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (session state, configuration).
#[derive(Error, Debug)]
pub enum DriverError {
    /// No session attached
    #[error("Shell not connected - call connect() first")]
    NotConnected,

    /// Invalid configuration in the shell builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Errors while loading a [`ShellConfig`](crate::driver::ShellConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Malformed JSON
    #[error("Failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),

    /// Config file could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] io::Error),
}

/// Errors while writing a test report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Report could not be encoded
    #[error("Failed to serialize report: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Report file could not be written
    #[error("Failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias using ttlshell's Error.
pub type Result<T> = std::result::Result<T, Error>;
