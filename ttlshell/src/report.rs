//! Board check results and the JSON report they are saved in.

use std::path::Path;

use chrono::Local;
use log::info;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ReportError, Result};

/// Timestamp layout used for `generated_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of one board check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    /// Short check name, e.g. `Memory`.
    pub name: String,

    /// Whether the check passed.
    pub ok: bool,

    /// One line for a results table.
    pub summary: String,

    /// Raw command output backing the verdict.
    pub details: String,

    /// Parsed values.
    pub data: Value,
}

impl TestResult {
    pub fn new(
        name: impl Into<String>,
        ok: bool,
        summary: impl Into<String>,
        details: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            name: name.into(),
            ok,
            summary: summary.into(),
            details: details.into(),
            data,
        }
    }
}

/// A saved run of board checks.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    /// Local time the report was created.
    pub generated_at: String,

    /// Serial device the board was reached through.
    pub port: Option<String>,

    /// Baud rate used.
    pub baud: Option<u32>,

    pub results: Vec<TestResult>,
}

impl TestReport {
    /// Stamp `results` with the current local time.
    pub fn new(port: Option<String>, baud: Option<u32>, results: Vec<TestResult>) -> Self {
        Self {
            generated_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            port,
            baud,
            results,
        }
    }

    /// Number of checks that passed.
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.ok).count()
    }

    /// Check if every result passed.
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|r| r.ok)
    }

    /// Encode as indented JSON. Non-ASCII text is kept as is.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReportError::Serialize(e).into())
    }

    /// Write the report to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(ReportError::Io)?;
        info!("saved report ({} results) to {}", self.results.len(), path.display());
        Ok(())
    }
}
