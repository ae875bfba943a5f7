//! Markdown to Jupyter notebook conversion.
//!
//! The pipeline is one sequential pass: [`Parser`] splits a document into
//! prose and code [`Segment`]s, and [`Synthesizer`] maps them onto notebook
//! [`Cell`]s. Segments are never mutated after extraction, so other consumers
//! (the syntax validator) can share the same stream.

pub mod cell;
pub mod config;
pub mod document;
pub mod error;
pub mod notebook;
pub mod parser;
pub mod segment;
pub mod synth;
pub mod toc;

use std::path::Path;

pub use cell::{Cell, CellRole, CellType, SourceRef};
pub use config::{ConvertOptions, KernelSpec, MarkerStyle};
pub use document::Document;
pub use error::{Error, Result};
pub use notebook::{Notebook, NotebookStats};
pub use parser::{ExtractError, Parser};
pub use segment::{Segment, SegmentKind};
pub use synth::{Synthesizer, synthesize};

/// Read a Markdown file. Invalid UTF-8 is replaced rather than rejected so
/// stray bytes inside code blocks cannot abort a run.
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            log::warn!(
                "{} is not valid UTF-8 (byte {}), replacing invalid sequences",
                path.display(),
                err.utf8_error().valid_up_to()
            );
            Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
        }
    }
}

/// Convert `input` to a notebook at `output`. Extraction errors abort before
/// anything is written.
pub fn convert_file(input: &Path, output: &Path, options: &ConvertOptions) -> Result<Notebook> {
    let source = read_source(input)?;
    let document = Parser::new(source, 0).parse()?;
    let notebook = Synthesizer::new(options)
        .with_source_file(input.display().to_string())
        .synthesize(&document.segments);
    notebook.write_atomic(output)?;
    Ok(notebook)
}
