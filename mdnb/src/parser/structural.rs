use crate::parser::error::ExtractError;
use crate::parser::fence::CodeFence;
use crate::segment::{Fences, Segment, SegmentKind};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Scan source text line by line into prose and code segments.
pub fn extract_segments(source: &str, file_id: usize) -> Result<Vec<Segment>, ExtractError> {
    let mut state = ExtractState::new(source, file_id);
    for line in source_lines(source) {
        state.push_line(line);
    }
    state.finalize()
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct SourceLine<'a> {
    /// 1-based line number.
    number: usize,
    /// Byte offset of the first character.
    start: usize,
    /// Line text without its `\n`.
    text: &'a str,
    /// Line text including its `\n`, if any.
    raw: &'a str,
}

impl SourceLine<'_> {
    fn end(&self) -> usize {
        self.start + self.raw.len()
    }
}

fn source_lines(source: &str) -> impl Iterator<Item = SourceLine<'_>> {
    let mut offset = 0;
    source
        .split_inclusive('\n')
        .enumerate()
        .map(move |(index, raw)| {
            let line = SourceLine {
                number: index + 1,
                start: offset,
                text: raw.strip_suffix('\n').unwrap_or(raw),
                raw,
            };
            offset += raw.len();
            line
        })
}

// ---------------------------------------------------------------------------
// Extract state
// ---------------------------------------------------------------------------

struct ExtractState<'a> {
    source: &'a str,
    file_id: usize,
    /// The prose run being accumulated, if any.
    prose: Option<ProseRun>,
    /// The code block being accumulated, if a fence is open.
    open: Option<OpenFence<'a>>,
    segments: Vec<Segment>,
}

struct ProseRun {
    start_line: usize,
    end_line: usize,
    start: usize,
    end: usize,
}

struct OpenFence<'a> {
    line: SourceLine<'a>,
    language: String,
    body: Vec<&'a str>,
}

impl<'a> OpenFence<'a> {
    fn close(self, close: SourceLine<'a>) -> Segment {
        Segment {
            kind: SegmentKind::Code,
            language: self.language,
            content: self.body.join("\n"),
            start_line: self.line.number,
            end_line: close.number,
            span: self.line.start..close.end(),
            fences: Some(Fences {
                open: self.line.raw.to_string(),
                close: close.raw.to_string(),
            }),
        }
    }
}

impl<'a> ExtractState<'a> {
    fn new(source: &'a str, file_id: usize) -> Self {
        ExtractState {
            source,
            file_id,
            prose: None,
            open: None,
            segments: Vec::new(),
        }
    }

    fn push_line(&mut self, line: SourceLine<'a>) {
        let fence = CodeFence::parse(line.text);

        match (self.open.take(), fence) {
            // Opening fence: whatever prose came before is complete.
            (None, Some(fence)) => {
                self.flush_prose();
                self.open = Some(OpenFence {
                    line,
                    language: fence.language,
                    body: Vec::new(),
                });
            }
            (None, None) => self.extend_prose(line),
            // The first fence after an open closes it, whatever its tag.
            (Some(open), Some(_)) => {
                let segment = open.close(line);
                log::debug!(
                    "code segment lines {}-{} language {:?}",
                    segment.start_line,
                    segment.end_line,
                    segment.language
                );
                self.segments.push(segment);
            }
            (Some(mut open), None) => {
                open.body.push(line.text);
                self.open = Some(open);
            }
        }
    }

    fn extend_prose(&mut self, line: SourceLine<'_>) {
        match &mut self.prose {
            Some(run) => {
                run.end_line = line.number;
                run.end = line.end();
            }
            None => {
                self.prose = Some(ProseRun {
                    start_line: line.number,
                    end_line: line.number,
                    start: line.start,
                    end: line.end(),
                });
            }
        }
    }

    fn flush_prose(&mut self) {
        let Some(run) = self.prose.take() else {
            return;
        };
        log::debug!("prose segment lines {}-{}", run.start_line, run.end_line);
        self.segments.push(Segment {
            kind: SegmentKind::Prose,
            language: String::new(),
            content: self.source[run.start..run.end].to_string(),
            start_line: run.start_line,
            end_line: run.end_line,
            span: run.start..run.end,
            fences: None,
        });
    }

    fn finalize(mut self) -> Result<Vec<Segment>, ExtractError> {
        if let Some(open) = self.open.take() {
            return Err(ExtractError::unterminated(
                open.line.number,
                open.language,
                open.line.start..open.line.start + open.line.text.len(),
                self.file_id,
            ));
        }
        self.flush_prose();
        Ok(self.segments)
    }
}
