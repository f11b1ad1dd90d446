//! Feed error types.

/// Errors that can occur while fetching prices or instrument data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("rate limit exceeded")]
    RateLimit,

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("no data: {0}")]
    NoData(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl FeedError {
    /// Failures that concern one symbol only; the rest of a batch can proceed.
    pub fn is_per_symbol(&self) -> bool {
        matches!(self, FeedError::InvalidSymbol(_) | FeedError::NoData(_))
    }
}
