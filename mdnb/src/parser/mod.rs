pub mod error;
pub mod fence;
mod structural;

pub use error::ExtractError;
pub use fence::{CodeFence, FenceLine};

use crate::document::Document;
use crate::segment::Segment;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Split the source Markdown into an ordered segment stream.
    pub fn parse(&self) -> Result<Document, ExtractError> {
        let segments = structural::extract_segments(&self.source, self.file_id)?;
        Ok(Document {
            segments,
            source_id: self.file_id,
        })
    }
}

/// Extract segments from a source string with no diagnostics file attached.
pub fn extract(source: &str) -> Result<Vec<Segment>, ExtractError> {
    structural::extract_segments(source, 0)
}
