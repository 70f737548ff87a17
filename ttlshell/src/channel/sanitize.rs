//! Turning a raw console transcript into clean command output.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// ANSI CSI sequences: `ESC [`, parameter bytes, intermediates, final byte.
static ANSI_CSI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1B\[[0-?]*[ -/]*[@-~]").expect("valid CSI regex"));

/// Remove ANSI CSI escape sequences.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_CSI.replace_all(text, "")
}

/// Strip escapes and carriage returns, drop the echoed command and any
/// trailing prompt lines, and trim what is left.
///
/// `is_prompt` decides whether a single line is a shell prompt.
pub fn normalize_output(raw: &str, command: &str, is_prompt: impl Fn(&str) -> bool) -> String {
    let text = strip_ansi(raw).replace('\r', "");
    let mut lines: Vec<&str> = text.split('\n').collect();

    if lines.first().is_some_and(|first| first.trim() == command.trim()) {
        lines.remove(0);
    }

    while let Some(last) = lines.last() {
        if last.trim().is_empty() || is_prompt(last) {
            lines.pop();
        } else {
            break;
        }
    }

    lines.join("\n").trim().to_string()
}
