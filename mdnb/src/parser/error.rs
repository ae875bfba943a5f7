use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

/// Extraction failures. Any of these aborts the run: nothing downstream has a
/// meaningful segment stream to work with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("unterminated code fence opened on line {line}")]
    UnterminatedFence {
        /// 1-based line of the opening fence.
        line: usize,
        language: String,
        /// Byte span of the opening fence line.
        span: Range<usize>,
        file_id: usize,
    },
}

impl ExtractError {
    pub fn unterminated(line: usize, language: String, span: Range<usize>, file_id: usize) -> Self {
        ExtractError::UnterminatedFence {
            line,
            language,
            span,
            file_id,
        }
    }

    /// The 1-based source line the error points at.
    pub fn line(&self) -> usize {
        match self {
            ExtractError::UnterminatedFence { line, .. } => *line,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        match self {
            ExtractError::UnterminatedFence {
                language,
                span,
                file_id,
                ..
            } => {
                let label = if language.is_empty() {
                    "code fence opened here".to_string()
                } else {
                    format!("`{}` code fence opened here", language)
                };
                Diagnostic::error()
                    .with_message(self.to_string())
                    .with_labels(vec![Label::primary(*file_id, span.clone()).with_message(label)])
                    .with_notes(vec![
                        "the document ends before a closing ``` line".to_string(),
                    ])
            }
        }
    }
}
