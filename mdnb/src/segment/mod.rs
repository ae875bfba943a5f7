use std::ops::Range;

/// Whether a segment is documentation text or the body of a fenced block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Prose,
    Code,
}

impl SegmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SegmentKind::Prose => "prose",
            SegmentKind::Code => "code",
        }
    }
}

/// The raw fence lines around a code segment, terminators included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fences {
    pub open: String,
    pub close: String,
}

/// A contiguous classified region of the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Lowercased fence tag; empty for untagged fences and for prose.
    pub language: String,
    /// Prose: the verbatim source text. Code: the lines strictly between the
    /// fences joined with `\n`.
    pub content: String,
    /// 1-based first line. For code this is the opening fence line.
    pub start_line: usize,
    /// 1-based last line, inclusive. For code this is the closing fence line.
    pub end_line: usize,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
    /// Present on code segments extracted from a document.
    pub fences: Option<Fences>,
}

impl Segment {
    /// A code segment that did not come from a fenced document region, e.g. a
    /// notebook cell. `start_line` plays the role of the opening fence line.
    pub fn code(language: impl Into<String>, content: impl Into<String>, start_line: usize) -> Self {
        let content = content.into();
        let line_count = if content.is_empty() {
            0
        } else {
            content.split('\n').count()
        };
        Segment {
            kind: SegmentKind::Code,
            language: language.into().to_lowercase(),
            content,
            start_line,
            end_line: start_line + line_count + 1,
            span: 0..0,
            fences: None,
        }
    }

    pub fn is_code(&self) -> bool {
        self.kind == SegmentKind::Code
    }

    pub fn is_prose(&self) -> bool {
        self.kind == SegmentKind::Prose
    }

    /// Source line holding the first content line.
    pub fn content_start_line(&self) -> usize {
        match self.kind {
            SegmentKind::Prose => self.start_line,
            SegmentKind::Code => self.start_line + 1,
        }
    }

    /// Number of source lines between the fences (code) or covered (prose).
    pub fn line_count(&self) -> usize {
        match self.kind {
            SegmentKind::Prose => self.end_line + 1 - self.start_line,
            SegmentKind::Code => self.end_line.saturating_sub(self.start_line + 1),
        }
    }

    /// Content split into lines, terminators removed.
    pub fn lines(&self) -> Vec<&str> {
        match self.kind {
            SegmentKind::Prose => split_lines(&self.content),
            SegmentKind::Code if self.line_count() == 0 => Vec::new(),
            SegmentKind::Code => self.content.split('\n').collect(),
        }
    }

    /// Case-insensitive membership test against a set of language tags.
    pub fn language_in<'a, I>(&self, languages: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        languages
            .into_iter()
            .any(|lang| lang.eq_ignore_ascii_case(&self.language))
    }
}

/// Split on `\n` only, keeping `\r` and other trailing whitespace intact.
/// A trailing terminator does not produce an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n')
        .map(|line| line.strip_suffix('\n').unwrap_or(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_keeps_trailing_whitespace() {
        assert_eq!(split_lines("a  \nb\r\n\n"), vec!["a  ", "b\r", ""]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn synthetic_code_segment_counts_lines() {
        let seg = Segment::code("Python", "x = 1\ny = 2", 10);
        assert_eq!(seg.language, "python");
        assert_eq!(seg.content_start_line(), 11);
        assert_eq!(seg.line_count(), 2);
        assert_eq!(seg.lines(), vec!["x = 1", "y = 2"]);
    }

    #[test]
    fn empty_code_segment_has_no_lines() {
        let seg = Segment::code("bash", "", 3);
        assert_eq!(seg.line_count(), 0);
        assert!(seg.lines().is_empty());
    }
}
