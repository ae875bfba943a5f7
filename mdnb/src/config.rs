//! Conversion options.
//!
//! Options are plain values handed to the synthesizer, so conversions with
//! different settings never share state. Every field has a default; a TOML
//! table may set any subset of them:
//!
//! ```toml
//! include_toc = false
//! shell_languages = ["bash", "zsh"]
//! marker_style = "metadata"
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::Result;

/// How a shell cell's execution marker reaches the notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerStyle {
    /// First source line, the way Jupyter cell magics work.
    #[default]
    CellMagic,
    /// Only in the cell metadata; the source is left untouched.
    Metadata,
}

/// Kernel description written into the notebook metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelSpec {
    pub name: String,
    pub display_name: String,
    pub language: String,
    pub version: String,
    pub file_extension: String,
    pub mimetype: String,
    pub codemirror_mode: String,
    pub pygments_lexer: String,
}

impl Default for KernelSpec {
    fn default() -> Self {
        KernelSpec {
            name: "python3".to_string(),
            display_name: "Python 3".to_string(),
            language: "python".to_string(),
            version: "3.12.0".to_string(),
            file_extension: ".py".to_string(),
            mimetype: "text/x-python".to_string(),
            codemirror_mode: "ipython".to_string(),
            pygments_lexer: "ipython3".to_string(),
        }
    }
}

impl KernelSpec {
    /// The `kernelspec` and `language_info` notebook metadata.
    pub fn to_metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert(
            "kernelspec".to_string(),
            json!({
                "display_name": self.display_name,
                "language": self.language,
                "name": self.name,
            }),
        );
        metadata.insert(
            "language_info".to_string(),
            json!({
                "codemirror_mode": { "name": self.codemirror_mode, "version": 3 },
                "file_extension": self.file_extension,
                "mimetype": self.mimetype,
                "name": self.language,
                "nbconvert_exporter": self.language,
                "pygments_lexer": self.pygments_lexer,
                "version": self.version,
            }),
        );
        metadata
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertOptions {
    /// Prepend the synthetic setup cell.
    pub include_setup_cell: bool,
    /// Insert a generated table of contents after the setup cell.
    pub include_toc: bool,
    /// Deepest heading level listed in the table of contents.
    pub toc_depth: u8,
    pub toc_title: String,
    /// Fence tags whose blocks run through the shell.
    pub shell_languages: BTreeSet<String>,
    /// Fence tags of the kernel language.
    pub target_languages: BTreeSet<String>,
    pub shell_marker: String,
    pub marker_style: MarkerStyle,
    /// Prefix each document cell with a comment naming its source line.
    pub source_anchors: bool,
    pub setup_source: Vec<String>,
    pub kernel: KernelSpec,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            include_setup_cell: true,
            include_toc: true,
            toc_depth: 3,
            toc_title: "Table of Contents".to_string(),
            shell_languages: language_set(&["bash", "shell", "sh"]),
            target_languages: language_set(&["python", "py"]),
            shell_marker: "%%bash".to_string(),
            marker_style: MarkerStyle::CellMagic,
            source_anchors: false,
            setup_source: default_setup_source(),
            kernel: KernelSpec::default(),
        }
    }
}

impl ConvertOptions {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn is_shell(&self, language: &str) -> bool {
        contains_ignore_case(&self.shell_languages, language)
    }

    pub fn is_target(&self, language: &str) -> bool {
        contains_ignore_case(&self.target_languages, language)
    }
}

/// Build a lowercased language set.
pub fn language_set(languages: &[&str]) -> BTreeSet<String> {
    languages.iter().map(|l| l.to_lowercase()).collect()
}

fn contains_ignore_case(set: &BTreeSet<String>, language: &str) -> bool {
    set.iter().any(|l| l.eq_ignore_ascii_case(language))
}

fn default_setup_source() -> Vec<String> {
    [
        "# Setup and imports",
        "import sys",
        "import os",
        "from pathlib import Path",
        "",
        "# Shell cells use the built-in %%bash cell magic",
        "from IPython.display import display, HTML",
        "",
        "import warnings",
        "warnings.filterwarnings('ignore')",
        "",
        "print(\"Notebook setup complete\")",
    ]
    .iter()
    .map(|line| line.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_table_keeps_defaults() {
        let options = ConvertOptions::from_toml_str(
            "include_toc = false\nshell_languages = [\"zsh\"]\nmarker_style = \"metadata\"\n",
        )
        .unwrap();
        assert!(!options.include_toc);
        assert!(options.include_setup_cell);
        assert!(options.is_shell("ZSH"));
        assert!(!options.is_shell("bash"));
        assert_eq!(options.marker_style, MarkerStyle::Metadata);
        assert_eq!(options.kernel, KernelSpec::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConvertOptions::from_toml_str("include_tco = false").is_err());
    }

    #[test]
    fn default_languages() {
        let options = ConvertOptions::default();
        assert!(options.is_shell("sh"));
        assert!(options.is_target("Python"));
        assert!(!options.is_target("rust"));
    }
}
