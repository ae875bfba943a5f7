use std::fmt::Write as _;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

/// Result of checking one code segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    Invalid {
        /// Absolute 1-based line in the checked document.
        line: usize,
        column: usize,
        message: String,
    },
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Position of the segment in the stream that was validated.
    pub index: usize,
    /// The segment's first line (the opening fence for Markdown blocks).
    pub start_line: usize,
    pub language: String,
    pub outcome: Outcome,
    /// Byte span of the offending line, when the segment came straight from
    /// source text.
    pub span: Option<Range<usize>>,
}

impl ReportEntry {
    /// Render a failure as a codespan-reporting Diagnostic. Valid entries and
    /// entries without a source span have none.
    pub fn to_diagnostic(&self, file_id: usize) -> Option<Diagnostic<usize>> {
        let Outcome::Invalid { message, .. } = &self.outcome else {
            return None;
        };
        let span = self.span.clone()?;
        Some(
            Diagnostic::error()
                .with_message(format!("invalid {} syntax", self.language))
                .with_labels(vec![
                    Label::primary(file_id, span).with_message(message.clone()),
                ])
                .with_notes(vec![format!(
                    "in the code block opened on line {}",
                    self.start_line
                )]),
        )
    }
}

/// Every checked segment in source order. Produced once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    entries: Vec<ReportEntry>,
}

impl ValidationReport {
    pub fn new(entries: Vec<ReportEntry>) -> Self {
        ValidationReport { entries }
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| !e.outcome.is_valid())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True when every checked segment parsed. An empty report passes.
    pub fn passed(&self) -> bool {
        self.entries.iter().all(|e| e.outcome.is_valid())
    }

    /// One `FILE:LINE:COLUMN: MESSAGE` line per failure, then a summary.
    pub fn display(&self, file: &str) -> String {
        let mut out = String::new();
        for entry in self.failures() {
            if let Outcome::Invalid {
                line,
                column,
                message,
            } = &entry.outcome
            {
                let _ = writeln!(out, "{}:{}:{}: {}", file, line, column, message);
            }
        }
        let failed = self.failure_count();
        if failed == 0 {
            let _ = write!(out, "{} code blocks checked, all valid", self.entries.len());
        } else {
            let _ = write!(
                out,
                "{} code blocks checked, {} with syntax errors",
                self.entries.len(),
                failed
            );
        }
        out
    }
}
