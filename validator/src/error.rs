use std::io;

/// The checker itself could not run. Unlike a syntax error in a snippet this
/// aborts the whole validation run.
#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    #[error("cannot load the {language} grammar: {source}")]
    Grammar {
        language: &'static str,
        source: tree_sitter::LanguageError,
    },

    #[error("the {language} parser returned no tree")]
    ParseCancelled { language: &'static str },

    #[error("cannot start '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    #[error("I/O error talking to '{program}': {source}")]
    Io { program: String, source: io::Error },

    #[error("'{program}' exited with {status} and unexpected output: {stderr}")]
    UnexpectedOutput {
        program: String,
        status: String,
        stderr: String,
    },
}
