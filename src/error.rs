use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KeplerError {
    #[error("failed to build HTTP client: {0}")]
    Http(String),

    #[error("could not save file at {path}: {message}")]
    Persistence { path: PathBuf, message: String },

    #[error("failed to resolve install directory: {0}")]
    Filesystem(String),

    #[error("invalid setting value: {0}")]
    InvalidSetting(String),
}

impl KeplerError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Self::Persistence {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
