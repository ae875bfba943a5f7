use std::fmt;

use crate::segment::{Segment, SegmentKind};

/// A parsed Markdown document: the ordered segment stream plus the source ID
/// used for error reporting with codespan-reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub segments: Vec<Segment>,
    pub source_id: usize,
}

/// Writes the document back out. For extracted documents this reproduces the
/// source byte-for-byte; code segments built without fences get plain ```
/// markers.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SegmentKind::Prose => write!(f, "{}", self.content),
            SegmentKind::Code => {
                match &self.fences {
                    Some(fences) => write!(f, "{}", fences.open)?,
                    None => writeln!(f, "```{}", self.language)?,
                }
                if self.line_count() > 0 {
                    writeln!(f, "{}", self.content)?;
                }
                match &self.fences {
                    Some(fences) => write!(f, "{}", fences.close),
                    None => writeln!(f, "```"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn round_trip(source: &str) -> String {
        Parser::new(source.to_string(), 0)
            .parse()
            .unwrap()
            .to_string()
    }

    #[test]
    fn reproduces_mixed_document() {
        let source = "# T\n\n```Python  \nx = 1   \n\n```\r\ntext\n```\n```";
        assert_eq!(round_trip(source), source);
    }

    #[test]
    fn reproduces_document_without_trailing_newline() {
        let source = "para\n```bash\necho hi\n```";
        assert_eq!(round_trip(source), source);
    }

    #[test]
    fn synthetic_segment_gets_plain_fences() {
        let doc = Document {
            segments: vec![Segment::code("py", "x = 1", 1)],
            source_id: 0,
        };
        assert_eq!(doc.to_string(), "```py\nx = 1\n```\n");
    }
}
