//! Migration configuration

use serde::{Deserialize, Serialize};

/// Migration behaviour switches
///
/// Every field has a default, so a partial TOML document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Fail when a step finds its output shape already in place; when off,
    /// such input is returned unchanged
    pub reject_reapplication: bool,
    /// Log full attribute maps before and after each step at debug level
    pub trace_attributes: bool,
    /// Upper bound on steps applied by a single upgrade
    pub max_hops: u32,
}

impl MigrationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_reject_reapplication(mut self, reject: bool) -> Self {
        self.reject_reapplication = reject;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_trace_attributes(mut self, trace: bool) -> Self {
        self.trace_attributes = trace;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_max_hops(mut self, max_hops: u32) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if `max_hops` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hops == 0 {
            return Err(ConfigError::Invalid("max_hops must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            reject_reapplication: true,
            trace_attributes: false,
            max_hops: 16,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed values are out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
