//! Persisted resource state and its version marker

use flatmig_flatmap::AttributeMap;
use serde::{Deserialize, Serialize};

/// One resource instance as stored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    /// Provider-assigned identifier
    pub id: String,
    /// Flattened attributes
    pub attributes: AttributeMap,
    /// Schema version that produced `attributes`; zero when never migrated
    #[serde(default)]
    pub schema_version: u32,
}

impl InstanceState {
    /// Create state at schema version zero
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, attributes: AttributeMap) -> Self {
        Self {
            id: id.into(),
            attributes,
            schema_version: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    /// No prior state to migrate
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_version_deserialises_as_zero() {
        let state: InstanceState =
            serde_json::from_str(r#"{"id":"E123","attributes":{"comment":"x"}}"#).unwrap();
        assert_eq!(state.schema_version, 0);
        assert_eq!(state.attributes.get("comment"), Some("x"));
        assert!(!state.is_empty());
    }

    #[test]
    fn empty_state() {
        assert!(InstanceState::new("E123", AttributeMap::new()).is_empty());
    }
}
