//! nbformat 4 wire format.
//!
//! Cell sources are stored as a list of strings where every line but the last
//! keeps its `\n`. Readers must also accept a single string.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cell::{Cell, CellRole, CellType, SourceRef};
use crate::config::MarkerStyle;

pub const NBFORMAT: u32 = 4;
pub const NBFORMAT_MINOR: u32 = 4;

/// Key under which tool-specific cell metadata is namespaced.
pub const METADATA_KEY: &str = "mdnb";

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RawNotebook {
    pub cells: Vec<RawCell>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub(crate) enum RawCell {
    Markdown {
        #[serde(default)]
        metadata: Map<String, Value>,
        source: RawSource,
    },
    Code {
        #[serde(default)]
        execution_count: Option<u32>,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(default)]
        outputs: Vec<Value>,
        source: RawSource,
    },
    Raw {
        #[serde(default)]
        metadata: Map<String, Value>,
        source: RawSource,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawSource {
    Lines(Vec<String>),
    Text(String),
}

impl RawSource {
    fn from_lines(lines: &[String]) -> Self {
        // A lone empty line and no lines read back the same; write both as [].
        if matches!(lines, [only] if only.is_empty()) {
            return RawSource::Lines(Vec::new());
        }
        let last = lines.len().saturating_sub(1);
        RawSource::Lines(
            lines
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    if i < last {
                        format!("{}\n", line)
                    } else {
                        line.clone()
                    }
                })
                .collect(),
        )
    }

    fn into_lines(self) -> Vec<String> {
        let text = match self {
            RawSource::Lines(parts) => parts.concat(),
            RawSource::Text(text) => text,
        };
        if text.is_empty() {
            return Vec::new();
        }
        text.split('\n').map(str::to_owned).collect()
    }
}

pub(crate) fn encode_cell(cell: &Cell, style: MarkerStyle) -> RawCell {
    let mut metadata = Map::new();
    if let Some(origin) = cell.origin() {
        if let Some(file) = &origin.file {
            metadata.insert("source_file".to_string(), Value::from(file.clone()));
        }
        metadata.insert("source_line".to_string(), Value::from(origin.line));
        metadata.insert("source_anchor".to_string(), Value::from(origin.anchor()));
    }

    let mut tool = Map::new();
    if cell.role() != CellRole::Document {
        tool.insert("role".to_string(), Value::from(cell.role().as_str()));
    }
    if let Some(marker) = cell.execution_marker() {
        tool.insert("execution_marker".to_string(), Value::from(marker));
    }
    if !tool.is_empty() {
        metadata.insert(METADATA_KEY.to_string(), Value::Object(tool));
    }

    match cell.cell_type() {
        CellType::Markdown => RawCell::Markdown {
            metadata,
            source: RawSource::from_lines(cell.source()),
        },
        CellType::Code => {
            let source = match (cell.execution_marker(), style) {
                (Some(marker), MarkerStyle::CellMagic) => {
                    let mut lines = Vec::with_capacity(cell.source().len() + 1);
                    lines.push(marker.to_string());
                    lines.extend_from_slice(cell.source());
                    lines
                }
                _ => cell.source().to_vec(),
            };
            RawCell::Code {
                execution_count: None,
                metadata,
                outputs: Vec::new(),
                source: RawSource::from_lines(&source),
            }
        }
    }
}

/// Rebuild a cell from its wire form. Raw cells have no counterpart and are
/// dropped.
pub(crate) fn decode_cell(raw: RawCell) -> Option<Cell> {
    let (cell_type, metadata, source) = match raw {
        RawCell::Markdown { metadata, source } => (CellType::Markdown, metadata, source),
        RawCell::Code {
            metadata, source, ..
        } => (CellType::Code, metadata, source),
        RawCell::Raw { .. } => return None,
    };

    let mut lines = source.into_lines();
    let tool = metadata.get(METADATA_KEY).and_then(Value::as_object);
    let role = tool
        .and_then(|t| t.get("role"))
        .and_then(Value::as_str)
        .and_then(CellRole::from_name)
        .unwrap_or(CellRole::Document);

    let mut marker = tool
        .and_then(|t| t.get("execution_marker"))
        .and_then(Value::as_str)
        .map(str::to_owned);
    if cell_type == CellType::Code {
        let leading_magic = lines.first().filter(|first| first.starts_with("%%")).cloned();
        if let Some(first) = leading_magic {
            if marker.as_deref().is_none_or(|m| m == first) {
                lines.remove(0);
                marker = Some(first);
            }
        }
    }

    let origin = metadata
        .get("source_line")
        .and_then(Value::as_u64)
        .map(|line| SourceRef {
            file: metadata
                .get("source_file")
                .and_then(Value::as_str)
                .map(str::to_owned),
            line: line as usize,
        });

    let cell = match cell_type {
        CellType::Markdown => Cell::markdown(lines, origin),
        CellType::Code => Cell::code(lines, origin),
    };
    let cell = cell.with_role(role);
    Some(match marker {
        Some(marker) if cell_type == CellType::Code => cell.with_execution_marker(marker),
        _ => cell,
    })
}
