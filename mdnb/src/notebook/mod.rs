pub mod ipynb;

use std::fmt;
use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};
use tempfile::{Builder, NamedTempFile};

use crate::cell::{Cell, CellType};
use crate::config::MarkerStyle;
use crate::error::{Error, Result};
use ipynb::{NBFORMAT, NBFORMAT_MINOR, RawNotebook};

/// An ordered sequence of cells plus top-level metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    cells: Vec<Cell>,
    metadata: Map<String, Value>,
    marker_style: MarkerStyle,
}

/// Cell counts, as printed after a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotebookStats {
    pub total: usize,
    pub code: usize,
    pub shell: usize,
    pub markdown: usize,
}

impl Notebook {
    pub fn new(cells: Vec<Cell>, metadata: Map<String, Value>, marker_style: MarkerStyle) -> Self {
        Notebook {
            cells,
            metadata,
            marker_style,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn marker_style(&self) -> MarkerStyle {
        self.marker_style
    }

    /// The kernel language recorded in the metadata, if any.
    pub fn kernel_language(&self) -> Option<&str> {
        self.metadata
            .get("kernelspec")
            .and_then(|k| k.get("language"))
            .and_then(Value::as_str)
    }

    pub fn stats(&self) -> NotebookStats {
        let mut stats = NotebookStats {
            total: self.cells.len(),
            ..NotebookStats::default()
        };
        for cell in &self.cells {
            match cell.cell_type() {
                CellType::Code => {
                    stats.code += 1;
                    if cell.is_shell() {
                        stats.shell += 1;
                    }
                }
                CellType::Markdown => stats.markdown += 1,
            }
        }
        stats
    }

    /// Serialize as nbformat 4 JSON: two-space indentation, non-ASCII kept
    /// verbatim, trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let raw = RawNotebook {
            cells: self
                .cells
                .iter()
                .map(|cell| ipynb::encode_cell(cell, self.marker_style))
                .collect(),
            metadata: self.metadata.clone(),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
        };
        let mut json = serde_json::to_string_pretty(&raw)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawNotebook = serde_json::from_str(text)?;
        let cells: Vec<Cell> = raw.cells.into_iter().filter_map(ipynb::decode_cell).collect();
        Ok(Notebook {
            cells,
            metadata: raw.metadata,
            marker_style: MarkerStyle::CellMagic,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Write to a temporary file next to `path`, then rename over it, so a
    /// failed run never leaves a half-written notebook behind.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_err = |source| Error::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut tmp = temp_file_in(dir).map_err(write_err)?;
        if let Ok(existing) = std::fs::metadata(path) {
            tmp.as_file()
                .set_permissions(existing.permissions())
                .map_err(write_err)?;
        }
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        log::info!("wrote {} cells to {}", self.cells.len(), path.display());
        Ok(())
    }
}

/// A temporary file that gets the same mode a plain `fs::write` would give a
/// new file (0o666 minus the umask), not tempfile's private 0o600.
#[cfg(unix)]
fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    Builder::new()
        .permissions(std::fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    Builder::new().tempfile_in(dir)
}

impl fmt::Display for NotebookStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   - Total cells: {}", self.total)?;
        writeln!(f, "   - Code cells: {} ({} shell)", self.code, self.shell)?;
        write!(f, "   - Markdown cells: {}", self.markdown)
    }
}
