//! Error types for state migration
//!
//! Provides error handling for:
//! - Dispatch failures (unknown or future schema versions)
//! - Structural decode/encode failures from the flatmap codec
//! - Refused re-application of an already completed step

use flatmig_flatmap::CodecError;

/// Main migration error type
///
/// Nothing here is retried internally; a failed structural transform needs
/// an operator to look at the stored state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MigrationError {
    /// No step is registered for the stored version
    #[error("unexpected schema version: {version}")]
    UnsupportedVersion { version: u32 },

    /// Stored state was written by a newer schema than this build knows
    #[error("stored schema version {stored} is newer than current version {current}")]
    VersionAhead { stored: u32, current: u32 },

    /// The step's input already has the shape the step produces
    #[error("'{field}' is already list-encoded; refusing to re-apply the v{version} migration")]
    AlreadyMigrated { field: String, version: u32 },

    /// Decoded field has a shape the step does not handle
    #[error("unexpected value for '{field}': expected {expected}, found {found}")]
    UnexpectedValue {
        field: String,
        expected: String,
        found: String,
    },

    /// Upgrade chain did not converge within the configured hop limit
    #[error("upgrade did not reach version {target} within {max_hops} steps")]
    TooManyHops { target: u32, max_hops: u32 },

    /// Decode or encode failure, propagated unchanged
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl MigrationError {
    /// Check if the error points at inconsistent stored data
    #[inline]
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        match self {
            Self::Codec(err) => err.is_data_error(),
            Self::AlreadyMigrated { .. } | Self::UnexpectedValue { .. } => true,
            _ => false,
        }
    }

    /// Check if the error is about version bookkeeping rather than content
    #[inline]
    #[must_use]
    pub fn is_version_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedVersion { .. } | Self::VersionAhead { .. } | Self::TooManyHops { .. }
        )
    }
}

/// Result alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;
