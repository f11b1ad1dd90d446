//! Validation errors raised by the estimation and table-building stages.

/// Errors returned by the core pipeline.
///
/// Both variants are raised at the point of violation, before any partial
/// result is produced.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrepError {
    /// A parameter is outside its valid domain (decay factor, bounds, dates).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two inputs that must align on an axis do not.
    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
}

impl PrepError {
    pub(crate) fn shape(what: impl Into<String>, expected: usize, found: usize) -> Self {
        PrepError::ShapeMismatch {
            what: what.into(),
            expected,
            found,
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
