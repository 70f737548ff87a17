//! Response types for command execution and session bootstrap.

use std::time::Duration;

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed (trimmed).
    pub command: String,

    /// The command output (normalized - echo, escapes and trailing prompt removed).
    pub result: String,

    /// The raw output before normalization.
    pub raw_result: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Whether the prompt never came back within the timeout.
    ///
    /// A timed-out command that printed something is still a success: the
    /// serial line carries no exit status, so "still running" and "finished
    /// without a prompt match" cannot be told apart.
    pub timed_out: bool,

    /// Failure message if the command failed.
    pub failure_message: Option<String>,
}

impl Response {
    /// Create a new successful response.
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            elapsed,
            timed_out: false,
            failure_message: None,
        }
    }

    /// Create a failed response.
    pub fn failed(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        elapsed: Duration,
        failure_message: impl Into<String>,
    ) -> Self {
        Self {
            failure_message: Some(failure_message.into()),
            ..Self::new(command, result, raw_result, elapsed)
        }
    }

    /// The response to an empty command: success, no output, no I/O.
    pub fn empty() -> Self {
        Self::new("", "", "", Duration::ZERO)
    }

    /// Mark the response as having hit its timeout.
    pub fn with_timed_out(mut self, timed_out: bool) -> Self {
        self.timed_out = timed_out;
        self
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Split into the `(ok, text)` pair GUI callers consume.
    pub fn into_parts(self) -> (bool, String) {
        (self.is_success(), self.result)
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}

/// Outcome of [`ShellExecutor::ensure_shell`](super::ShellExecutor::ensure_shell).
#[derive(Debug, Clone)]
pub struct BootstrapResult {
    /// Whether a shell prompt was observed.
    pub ok: bool,

    /// Human readable outcome.
    pub message: String,

    /// Time from the first wake nudge to the outcome.
    pub elapsed: Duration,
}

impl BootstrapResult {
    pub(crate) fn ready(elapsed: Duration) -> Self {
        Self {
            ok: true,
            message: "Shell prompt detected.".to_string(),
            elapsed,
        }
    }

    pub(crate) fn timed_out(elapsed: Duration) -> Self {
        Self {
            ok: false,
            message: "Prompt not detected within timeout. Check port, baud rate and UART wiring."
                .to_string(),
            elapsed,
        }
    }

    /// Split into the `(ok, message)` pair GUI callers consume.
    pub fn into_parts(self) -> (bool, String) {
        (self.ok, self.message)
    }
}
