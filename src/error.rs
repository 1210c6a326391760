use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::record::FieldPath;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("field path not found: {0}")]
    PathNotFound(FieldPath),
    #[error("no file path specified")]
    NoBackingFile,
    #[error("document is read-only")]
    ReadOnly,
}

impl GridError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GridError::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
