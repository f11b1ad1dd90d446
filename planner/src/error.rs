//! Error types for the planner.

use std::path::PathBuf;

use portfolio_prep::PrepError;
use portfolio_prep_feed::FeedError;

/// All errors that can occur during a planner run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Prep(#[from] PrepError),

    #[error("market data unavailable: {0}")]
    DataUnavailable(#[from] FeedError),

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("malformed file {path}: {reason}")]
    MalformedFile { path: PathBuf, reason: String },

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Error::MalformedFile {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
