//! Shell session configuration.
//!
//! A [`ShellConfig`] can be built in code (see
//! [`ShellBuilder`](super::ShellBuilder)) or loaded from JSON, where every
//! duration is written as seconds:
//!
//! ```json
//! {
//!   "serial": { "port": "/dev/ttyUSB0", "baud_rate": 115200 },
//!   "credentials": { "username": "root", "password": "" },
//!   "command_timeout": 10.0,
//!   "bootstrap_timeout": 15.0
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::{ConfigError, Result};
use crate::transport::SerialConfig;

/// Login credentials answered during bootstrap.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Username sent at a `login:` prompt (default: `root`).
    pub username: String,

    /// Password sent at a `password:` prompt; may be empty.
    #[serde(deserialize_with = "secret")]
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("root", "")
    }
}

/// Drain windows used while bootstrapping a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapTiming {
    /// Bare newlines sent to wake the console before polling.
    pub wake_nudges: u32,

    #[serde(with = "secs")]
    pub wake_settle: Duration,

    #[serde(with = "secs")]
    pub wake_drain: Duration,

    #[serde(with = "secs")]
    pub poll_settle: Duration,

    #[serde(with = "secs")]
    pub poll_drain: Duration,

    #[serde(with = "secs")]
    pub login_drain: Duration,

    #[serde(with = "secs")]
    pub password_drain: Duration,

    #[serde(with = "secs")]
    pub activate_drain: Duration,
}

impl Default for BootstrapTiming {
    fn default() -> Self {
        Self {
            wake_nudges: 2,
            wake_settle: Duration::from_millis(80),
            wake_drain: Duration::from_millis(350),
            poll_settle: Duration::from_millis(60),
            poll_drain: Duration::from_millis(400),
            login_drain: Duration::from_millis(800),
            password_drain: Duration::from_millis(1000),
            activate_drain: Duration::from_millis(800),
        }
    }
}

/// Everything a shell needs for one connection.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Serial link parameters.
    pub serial: SerialConfig,

    /// Login credentials.
    pub credentials: Credentials,

    /// Default per-command timeout.
    #[serde(with = "secs")]
    pub command_timeout: Duration,

    /// Default overall bootstrap timeout.
    #[serde(with = "secs")]
    pub bootstrap_timeout: Duration,

    /// Bytes from the end of the buffer searched for the prompt.
    pub search_depth: usize,

    /// Bootstrap drain windows.
    pub timing: BootstrapTiming,
}

impl ShellConfig {
    /// Parse a config from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e).into())
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            credentials: Credentials::default(),
            command_timeout: Duration::from_secs(10),
            bootstrap_timeout: Duration::from_secs(15),
            search_depth: 1000,
            timing: BootstrapTiming::default(),
        }
    }
}

fn secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Serde adapter for durations written as (fractional) seconds.
pub(crate) mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.serial.read_timeout, Duration::from_millis(100));
        assert_eq!(config.serial.write_timeout, Duration::from_secs(1));
        assert_eq!(config.credentials.username, "root");
        assert_eq!(config.credentials.password.expose_secret(), "");
        assert_eq!(config.command_timeout, Duration::from_secs(10));
        assert_eq!(config.bootstrap_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_from_json_partial() {
        let config = ShellConfig::from_json_str(
            r#"{
                "serial": { "port": "/dev/ttyUSB0", "baud_rate": 921600 },
                "credentials": { "username": "admin", "password": "s3cret" },
                "command_timeout": 2.5
            }"#,
        )
        .unwrap();

        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 921_600);
        assert_eq!(config.serial.read_timeout, Duration::from_millis(100));
        assert_eq!(config.credentials.username, "admin");
        assert_eq!(config.credentials.password.expose_secret(), "s3cret");
        assert_eq!(config.command_timeout, Duration::from_millis(2500));
        assert_eq!(config.bootstrap_timeout, Duration::from_secs(15));
        assert_eq!(config.timing.wake_nudges, 2);
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let config =
            ShellConfig::from_json_str(r#"{"credentials": {"password": "hunter2"}}"#).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_invalid_json_and_durations() {
        assert!(matches!(
            ShellConfig::from_json_str("{ not json"),
            Err(crate::Error::Config(ConfigError::Parse(_)))
        ));
        assert!(ShellConfig::from_json_str(r#"{"command_timeout": -1}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.json");
        std::fs::write(&path, r#"{"serial": {"port": "COM7"}, "bootstrap_timeout": 25}"#).unwrap();

        let config = ShellConfig::load(&path).unwrap();
        assert_eq!(config.serial.port, "COM7");
        assert_eq!(config.bootstrap_timeout, Duration::from_secs(25));

        assert!(matches!(
            ShellConfig::load(dir.path().join("missing.json")),
            Err(crate::Error::Config(ConfigError::Io(_)))
        ));
    }
}
