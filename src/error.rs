// src/error.rs

use crate::model::Sequence;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatchError>;

#[derive(Debug, Error)]
pub enum MatchError {
    /// Bad upstream location, snapshot directory, parameters or empty history
    #[error("invalid input: {0}")]
    Input(String),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checkout of commit {commit} (sequence {sequence}) failed: {source}")]
    Checkout {
        sequence: Sequence,
        commit: String,
        #[source]
        source: Box<MatchError>,
    },

    #[error("comparison for commit {commit} (sequence {sequence}) failed: {source}")]
    Compare {
        sequence: Sequence,
        commit: String,
        #[source]
        source: Box<MatchError>,
    },

    #[error(transparent)]
    Git(#[from] git2::Error),

    #[error("cannot serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

impl MatchError {
    pub fn input(message: impl Into<String>) -> Self {
        MatchError::Input(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MatchError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Attach the offending path to an `io::Result`
pub trait IoContext<T> {
    fn at_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| MatchError::io(path, source))
    }
}
