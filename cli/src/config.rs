use std::path::{Path, PathBuf};

use mdnb::ConvertOptions;
use serde::Deserialize;
use validator::CheckOptions;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "mdnb.toml";

/// Contents of `mdnb.toml`. Both tables are optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub convert: ConvertOptions,
    pub check: CheckOptions,
}

impl Config {
    /// Parse `mdnb.toml`. Unless `[check]` lists its own `languages`, the
    /// checked languages are the conversion's `target_languages`.
    pub fn from_toml_str(text: &str) -> mdnb::Result<Self> {
        let table: toml::Table = toml::from_str(text)?;
        let mut config: Config = toml::Value::Table(table.clone()).try_into()?;
        inherit_target_languages(&table, &config.convert, &mut config.check);
        Ok(config)
    }

    /// Load `path`, or `./mdnb.toml` if it exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> mdnb::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG);
                if !default.is_file() {
                    return Ok(Config::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| mdnb::Error::Read {
            path: path.clone(),
            source,
        })?;
        log::info!("loaded configuration from {}", path.display());
        Self::from_toml_str(&text)
    }
}

/// Copy `convert.target_languages` into `check.languages` when the `[check]`
/// table of `table` does not set `languages` itself.
pub fn inherit_target_languages(
    table: &toml::Table,
    convert: &ConvertOptions,
    check: &mut CheckOptions,
) {
    let explicit = table
        .get("check")
        .and_then(|check| check.get("languages"))
        .is_some();
    if !explicit {
        check.languages = convert.target_languages.clone();
    }
}
