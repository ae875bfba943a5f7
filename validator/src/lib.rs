//! Parse-only syntax checking of fenced code blocks.
//!
//! [`validate`] walks a segment stream, hands every code segment whose
//! language is selected to a [`SyntaxChecker`] and collects one
//! [`ReportEntry`] per checked segment. A syntax error in one block never
//! stops the others from being checked.

pub mod checker;
pub mod error;
pub mod interpreter;
pub mod options;
pub mod prompt;
pub mod report;
pub mod tree_sitter_checker;

use std::borrow::Cow;
use std::ops::Range;

use mdnb::{Cell, CellType, Notebook, Segment, SegmentKind};

pub use checker::{SyntaxChecker, SyntaxIssue};
pub use error::CheckerError;
pub use interpreter::InterpreterChecker;
pub use options::{CheckOptions, CheckerKind};
pub use report::{Outcome, ReportEntry, ValidationReport};
pub use tree_sitter_checker::TreeSitterChecker;

/// Check every selected code segment. Errors are only returned when the
/// checker itself fails.
pub fn validate(
    segments: &[Segment],
    options: &CheckOptions,
    checker: &dyn SyntaxChecker,
) -> Result<ValidationReport, CheckerError> {
    let mut entries = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        if !segment.is_code() || !options.is_checked(&segment.language) {
            continue;
        }
        let (outcome, span) = check_segment(segment, options, checker)?;
        if let Outcome::Invalid { line, message, .. } = &outcome {
            log::debug!("segment {} invalid at line {}: {}", index, line, message);
        }
        entries.push(ReportEntry {
            index,
            start_line: segment.start_line,
            language: segment.language.clone(),
            outcome,
            span,
        });
    }

    let report = ValidationReport::new(entries);
    log::info!(
        "checked {} code blocks with {}, {} failed",
        report.entries().len(),
        checker.name(),
        report.failure_count()
    );
    Ok(report)
}

fn check_segment(
    segment: &Segment,
    options: &CheckOptions,
    checker: &dyn SyntaxChecker,
) -> Result<(Outcome, Option<Range<usize>>), CheckerError> {
    let source = if options.strip_prompts {
        prompt::strip_prompts(&segment.content)
    } else {
        Cow::Borrowed(segment.content.as_str())
    };
    if source.trim().is_empty() {
        return Ok((Outcome::Valid, None));
    }

    let Some(issue) = checker.check(&source)? else {
        return Ok((Outcome::Valid, None));
    };
    // Errors reported past the last line (unexpected end of input) belong to
    // the last line of the block.
    let in_segment = issue.line.clamp(1, segment.line_count().max(1));
    let outcome = Outcome::Invalid {
        line: segment.start_line + in_segment,
        column: issue.column,
        message: issue.message,
    };
    Ok((outcome, line_span(segment, in_segment)))
}

/// Byte span of content line `line` (1-based) for segments that carry their
/// original fences.
fn line_span(segment: &Segment, line: usize) -> Option<Range<usize>> {
    let fences = segment.fences.as_ref()?;
    let mut offset = segment.span.start + fences.open.len();
    for (number, text) in segment.content.split('\n').enumerate() {
        if number + 1 == line {
            return Some(offset..offset + text.len());
        }
        offset += text.len() + 1;
    }
    None
}

/// Turn notebook cells back into segments, one per cell, so a notebook can be
/// validated like a document.
///
/// Code cells take the kernel language, shell cells the name of their marker
/// (`%%bash` gives `bash`). A cell with `source_line` metadata keeps that line
/// as its start line; other cells start at 0, so their error lines are
/// relative to the cell.
pub fn notebook_segments(notebook: &Notebook) -> Vec<Segment> {
    let kernel = notebook.kernel_language().unwrap_or("python");
    notebook
        .cells()
        .iter()
        .map(|cell| cell_segment(cell, kernel))
        .collect()
}

fn cell_segment(cell: &Cell, kernel: &str) -> Segment {
    let start_line = cell.origin().map_or(0, |origin| origin.line);
    let mut lines = cell.source();
    if let Some(first) = lines.first() {
        if first.starts_with("# [source:") || first.starts_with("<!-- source:") {
            lines = &lines[1..];
        }
    }
    let content = lines.join("\n");

    match cell.cell_type() {
        CellType::Code => {
            let language = match cell.execution_marker() {
                Some(marker) => marker.trim_start_matches('%'),
                None => kernel,
            };
            let mut segment = Segment::code(language, content, start_line);
            segment.end_line = start_line + lines.len() + 1;
            segment
        }
        CellType::Markdown => Segment {
            kind: SegmentKind::Prose,
            language: String::new(),
            content,
            start_line,
            end_line: start_line + lines.len().saturating_sub(1),
            span: 0..0,
            fences: None,
        },
    }
}

/// Validate the code cells of a notebook.
pub fn validate_notebook(
    notebook: &Notebook,
    options: &CheckOptions,
    checker: &dyn SyntaxChecker,
) -> Result<ValidationReport, CheckerError> {
    validate(&notebook_segments(notebook), options, checker)
}
