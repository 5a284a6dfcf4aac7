//! Error types for flatmap decoding and encoding

use crate::path::PathError;

/// Errors raised while reading or writing a flatmap
///
/// None of these are retryable: they mean the stored data and the
/// descriptor disagree, and guessing which one is right is unsafe.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// A stored or supplied value does not have the declared type
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// Counts, element keys or cardinality limits are inconsistent
    #[error("malformed structure at '{path}': {reason}")]
    MalformedStructure { path: String, reason: String },

    /// Path or record field not present in the descriptor
    #[error("unknown field '{path}'")]
    UnknownField { path: String },

    /// Path could not be parsed
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),
}

impl CodecError {
    /// Create a type mismatch error
    pub fn type_mismatch(
        path: impl ToString,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            path: path.to_string(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a malformed structure error
    pub fn malformed(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::MalformedStructure {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(path: impl ToString) -> Self {
        Self::UnknownField {
            path: path.to_string(),
        }
    }

    /// Check if the stored data itself is inconsistent
    #[inline]
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. } | Self::MalformedStructure { .. })
    }
}

/// Result alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
