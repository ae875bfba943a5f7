use std::io;
use std::path::PathBuf;

use crate::parser::ExtractError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("cannot read '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid notebook JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
