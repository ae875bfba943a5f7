use crate::error::CheckerError;

/// A syntax error inside one snippet. `line` is 1-based relative to the
/// snippet; `column` is 1-based, 0 when the checker does not know it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Parse-only syntax checking for one language. Implementations must never
/// execute the code they are given.
pub trait SyntaxChecker {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// `Ok(None)` when the snippet parses, `Ok(Some(issue))` for the first
    /// syntax error. `Err` only when the checker itself failed.
    fn check(&self, source: &str) -> Result<Option<SyntaxIssue>, CheckerError>;
}
