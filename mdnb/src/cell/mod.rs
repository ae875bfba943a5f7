use serde::{Deserialize, Serialize};

/// Notebook cell types this tool emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Markdown,
    Code,
}

/// Where a cell came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRole {
    /// Built from exactly one document segment.
    Document,
    /// The synthetic imports/configuration cell.
    Setup,
    /// The synthetic table-of-contents cell.
    TableOfContents,
}

impl CellRole {
    pub fn as_str(self) -> &'static str {
        match self {
            CellRole::Document => "document",
            CellRole::Setup => "setup",
            CellRole::TableOfContents => "toc",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "document" => Some(CellRole::Document),
            "setup" => Some(CellRole::Setup),
            "toc" => Some(CellRole::TableOfContents),
            _ => None,
        }
    }
}

/// Location of a cell's segment in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub file: Option<String>,
    /// 1-based first line of the segment (the opening fence for code).
    pub line: usize,
}

impl SourceRef {
    /// `FILE:LINE`, the form used in anchors and comments.
    pub fn anchor(&self) -> String {
        format!("{}:{}", self.file.as_deref().unwrap_or("document"), self.line)
    }
}

/// A single notebook cell. Cells are immutable once built; the notebook that
/// holds them owns them until serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    cell_type: CellType,
    source: Vec<String>,
    execution_marker: Option<String>,
    origin: Option<SourceRef>,
    role: CellRole,
}

impl Cell {
    pub fn markdown(source: Vec<String>, origin: Option<SourceRef>) -> Self {
        Cell {
            cell_type: CellType::Markdown,
            source,
            execution_marker: None,
            origin,
            role: CellRole::Document,
        }
    }

    pub fn code(source: Vec<String>, origin: Option<SourceRef>) -> Self {
        Cell {
            cell_type: CellType::Code,
            source,
            execution_marker: None,
            origin,
            role: CellRole::Document,
        }
    }

    /// A cell the synthesizer adds on its own, not tied to any segment.
    pub fn synthetic(cell_type: CellType, role: CellRole, source: Vec<String>) -> Self {
        Cell {
            cell_type,
            source,
            execution_marker: None,
            origin: None,
            role,
        }
    }

    /// Mark the cell to be run by a shell interpreter.
    pub fn with_execution_marker(mut self, marker: impl Into<String>) -> Self {
        self.execution_marker = Some(marker.into());
        self
    }

    pub(crate) fn with_role(mut self, role: CellRole) -> Self {
        self.role = role;
        self
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Source lines without terminators and without the execution marker.
    pub fn source(&self) -> &[String] {
        &self.source
    }

    pub fn execution_marker(&self) -> Option<&str> {
        self.execution_marker.as_deref()
    }

    pub fn origin(&self) -> Option<&SourceRef> {
        self.origin.as_ref()
    }

    pub fn role(&self) -> CellRole {
        self.role
    }

    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }

    pub fn is_shell(&self) -> bool {
        self.execution_marker.is_some()
    }

    /// The source joined with `\n`.
    pub fn text(&self) -> String {
        self.source.join("\n")
    }
}
