//! Segment stream → notebook.
//!
//! Every segment maps to exactly one cell, in order. The only cells without a
//! segment behind them are the optional setup cell (always first) and the
//! optional table of contents (directly after it).

use crate::cell::{Cell, CellRole, CellType, SourceRef};
use crate::config::ConvertOptions;
use crate::notebook::Notebook;
use crate::segment::{Segment, SegmentKind};
use crate::toc;

pub struct Synthesizer<'a> {
    options: &'a ConvertOptions,
    source_file: Option<String>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(options: &'a ConvertOptions) -> Self {
        Synthesizer {
            options,
            source_file: None,
        }
    }

    /// Name recorded in cell metadata and anchors.
    pub fn with_source_file(mut self, name: impl Into<String>) -> Self {
        self.source_file = Some(name.into());
        self
    }

    pub fn synthesize(&self, segments: &[Segment]) -> Notebook {
        let mut cells = Vec::with_capacity(segments.len() + 2);

        if self.options.include_setup_cell {
            cells.push(Cell::synthetic(
                CellType::Code,
                CellRole::Setup,
                self.options.setup_source.clone(),
            ));
        }
        if self.options.include_toc {
            if let Some(cell) = self.toc_cell(segments) {
                cells.push(cell);
            }
        }

        cells.extend(segments.iter().map(|segment| self.segment_cell(segment)));

        log::info!(
            "synthesized {} cells from {} segments",
            cells.len(),
            segments.len()
        );
        Notebook::new(
            cells,
            self.options.kernel.to_metadata(),
            self.options.marker_style,
        )
    }

    fn toc_cell(&self, segments: &[Segment]) -> Option<Cell> {
        let headings = toc::collect_headings(segments);
        let source = toc::render(&headings, &self.options.toc_title, self.options.toc_depth);
        if source.is_empty() {
            log::debug!("no headings within depth {}, skipping TOC", self.options.toc_depth);
            return None;
        }
        Some(Cell::synthetic(
            CellType::Markdown,
            CellRole::TableOfContents,
            source,
        ))
    }

    fn segment_cell(&self, segment: &Segment) -> Cell {
        let origin = SourceRef {
            file: self.source_file.clone(),
            line: segment.start_line,
        };

        let mut source = Vec::with_capacity(segment.line_count() + 1);
        if self.options.source_anchors {
            source.push(match segment.kind {
                SegmentKind::Prose => format!("<!-- source:{} -->", origin.anchor()),
                SegmentKind::Code => format!("# [source:{}]", origin.anchor()),
            });
        }
        source.extend(segment.lines().into_iter().map(str::to_owned));

        match segment.kind {
            SegmentKind::Prose => {
                log::debug!("line {}: markdown cell", segment.start_line);
                Cell::markdown(source, Some(origin))
            }
            SegmentKind::Code if self.options.is_shell(&segment.language) => {
                log::debug!(
                    "line {}: shell cell ({})",
                    segment.start_line,
                    segment.language
                );
                Cell::code(source, Some(origin)).with_execution_marker(&self.options.shell_marker)
            }
            // Target, untagged and unknown languages alike stay code cells.
            SegmentKind::Code => {
                if self.options.is_target(&segment.language) {
                    log::debug!("line {}: code cell", segment.start_line);
                } else {
                    log::debug!(
                        "line {}: code cell in non-target language {:?}",
                        segment.start_line,
                        segment.language
                    );
                }
                Cell::code(source, Some(origin))
            }
        }
    }
}

/// Synthesize a notebook with no source file name attached.
pub fn synthesize(segments: &[Segment], options: &ConvertOptions) -> Notebook {
    Synthesizer::new(options).synthesize(segments)
}
