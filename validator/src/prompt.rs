//! Interactive-session transcripts (`>>> ` / `... ` prompts).
//!
//! Stripping keeps one output line per input line so parse errors still
//! point at the right source line.

use std::borrow::Cow;

const PRIMARY: &str = ">>>";
const CONTINUATION: &str = "...";

/// True when the first non-blank line starts with a `>>>` prompt. Code that
/// merely contains prompts further down (doctests in docstrings) is not a
/// transcript.
pub fn is_transcript(source: &str) -> bool {
    source
        .split('\n')
        .map(str::trim_start)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with(PRIMARY))
}

/// Remove prompts and blank out interpreter output. Anything that is not a
/// transcript is returned unchanged.
pub fn strip_prompts(source: &str) -> Cow<'_, str> {
    if !is_transcript(source) {
        return Cow::Borrowed(source);
    }
    let lines: Vec<&str> = source.split('\n').map(strip_line).collect();
    Cow::Owned(lines.join("\n"))
}

fn strip_line(line: &str) -> &str {
    let trimmed = line.trim_start();
    for prompt in [PRIMARY, CONTINUATION] {
        if let Some(rest) = trimmed.strip_prefix(prompt) {
            return rest.strip_prefix(' ').unwrap_or(rest);
        }
    }
    // Anything else in a transcript is output.
    ""
}
