//! Builder for creating serial shells.

use std::time::Duration;

use secrecy::SecretString;

use super::config::{BootstrapTiming, ShellConfig};
use super::executor::ShellExecutor;
use crate::channel::PatternSet;
use crate::error::{DriverError, Result};
use crate::transport::{SerialConfig, SerialTransport};

/// Builder for constructing a [`ShellExecutor`] over a serial port.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use ttlshell::ShellBuilder;
///
/// # fn example() -> Result<(), ttlshell::Error> {
/// let shell = ShellBuilder::new("/dev/ttyUSB0")
///     .baud_rate(115_200)
///     .username("root")
///     .password("")
///     .command_timeout(Duration::from_secs(10))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ShellBuilder {
    config: ShellConfig,
    patterns: Option<PatternSet>,
}

impl ShellBuilder {
    /// Create a new builder for the given serial device.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            config: ShellConfig {
                serial: SerialConfig::new(port),
                ..Default::default()
            },
            patterns: None,
        }
    }

    /// Start from a loaded configuration.
    pub fn from_config(config: ShellConfig) -> Self {
        Self {
            config,
            patterns: None,
        }
    }

    /// Set the baud rate (default: 115200).
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.config.serial.baud_rate = baud_rate;
        self
    }

    /// Set the username answered at a login prompt (default: `root`).
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.credentials.username = username.into();
        self
    }

    /// Set the password answered at a password prompt (default: empty).
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.credentials.password = SecretString::from(password.into());
        self
    }

    /// Set the default per-command timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Set the default bootstrap timeout.
    pub fn bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.config.bootstrap_timeout = timeout;
        self
    }

    /// Set the hardware read timeout used for each chunk read.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.serial.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.serial.write_timeout = timeout;
        self
    }

    /// Set how many trailing bytes are searched for the prompt.
    pub fn search_depth(mut self, depth: usize) -> Self {
        self.config.search_depth = depth;
        self
    }

    /// Override the bootstrap drain windows.
    pub fn timing(mut self, timing: BootstrapTiming) -> Self {
        self.config.timing = timing;
        self
    }

    /// Use custom prompt/login/password matchers.
    pub fn patterns(mut self, patterns: PatternSet) -> Self {
        self.patterns = Some(patterns);
        self
    }

    /// Build the shell.
    ///
    /// This validates the configuration but does not open the port. Call
    /// `connect()` on the returned shell to establish the connection.
    pub fn build(self) -> Result<ShellExecutor<SerialTransport>> {
        self.validate()?;
        Ok(ShellExecutor::new(self.config, self.patterns.unwrap_or_default()))
    }

    fn validate(&self) -> Result<()> {
        let invalid = |message: &str| -> Result<()> {
            Err(DriverError::InvalidConfig {
                message: message.to_string(),
            }
            .into())
        };

        if self.config.serial.port.trim().is_empty() {
            return invalid("serial port is required");
        }
        if self.config.serial.baud_rate == 0 {
            return invalid("baud rate must be non-zero");
        }
        if self.config.serial.read_timeout.is_zero() {
            return invalid("read timeout must be non-zero");
        }
        if self.config.search_depth == 0 {
            return invalid("search depth must be non-zero");
        }
        Ok(())
    }
}
