//! Pattern matching utilities for prompt and login detection.

use regex::Regex;

use crate::error::{ChannelError, Result};

/// A shell prompt: any line ending in `#` or `$` plus trailing whitespace.
pub const PROMPT_PATTERN: &str = r"(?m)^[^\n\r]*[#$]\s*$";

/// A line that is just `login:` or `username:`.
pub const LOGIN_PATTERN: &str = r"(?im)^\s*(login|username)\s*:\s*$";

/// A line that is just `password:`.
pub const PASSWORD_PATTERN: &str = r"(?im)^\s*password\s*:\s*$";

/// getty-style "Please press Enter to activate this console." banner.
pub const ACTIVATE_PATTERN: &str = r"(?i)activate this console";

/// Output phrases that mark a command as failed even though the shell
/// returned to its prompt.
pub const DEFAULT_FAILURE_PHRASES: &[&str] = &["Operation not permitted", "Permission denied"];

/// The matchers used to drive a serial console session.
///
/// The defaults target an interactive POSIX shell on an embedded Linux
/// image. They are fixed for the lifetime of a shell once it is built.
#[derive(Debug, Clone)]
pub struct PatternSet {
    /// Termination signal for bootstrap and command execution.
    pub prompt: Regex,

    /// Username prompt.
    pub login: Regex,

    /// Password prompt.
    pub password: Regex,

    /// Console activation banner.
    pub activate: Regex,

    /// Substrings that turn a command result into a failure.
    pub failed_when_contains: Vec<String>,
}

impl PatternSet {
    /// Build a pattern set from custom expressions.
    ///
    /// Fails with `ChannelError::InvalidPattern` if any expression does not
    /// compile.
    pub fn new(prompt: &str, login: &str, password: &str) -> Result<Self> {
        let compile = |pattern: &str| Regex::new(pattern).map_err(ChannelError::InvalidPattern);
        Ok(Self {
            prompt: compile(prompt)?,
            login: compile(login)?,
            password: compile(password)?,
            activate: compile(ACTIVATE_PATTERN)?,
            failed_when_contains: DEFAULT_FAILURE_PHRASES.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Add a failure phrase.
    pub fn with_failure_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.failed_when_contains.push(phrase.into());
        self
    }

    /// Check whether a single line (no newline) is a shell prompt.
    pub fn is_prompt_line(&self, line: &str) -> bool {
        self.prompt.is_match(line)
    }

    /// First failure phrase contained in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|phrase| output.contains(phrase.as_str()))
            .map(String::as_str)
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        // The built-in expressions are constants known to compile.
        Self::new(PROMPT_PATTERN, LOGIN_PATTERN, PASSWORD_PATTERN)
            .expect("built-in patterns are valid")
    }
}
