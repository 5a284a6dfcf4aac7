//! Version dispatch
//!
//! A [`MigrationRegistry`] holds one [`MigrationStep`] per source version
//! and routes stored state to the step matching its version marker.

use std::collections::BTreeMap;
use std::fmt;

use flatmig_flatmap::{AttributeMap, Block};

use crate::config::MigrationConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::state::InstanceState;

/// Transform applied by a step
///
/// Receives the schema the input was written with, the schema the output
/// must be written with, the input attributes and the active configuration.
/// Returns a fresh map; the input is never modified.
pub type StepFn =
    fn(&Block, &Block, &AttributeMap, &MigrationConfig) -> MigrationResult<AttributeMap>;

/// One version bump, `from_version` to `from_version + 1`
#[derive(Clone)]
pub struct MigrationStep {
    from_version: u32,
    name: &'static str,
    prior_schema: Block,
    apply: StepFn,
}

impl MigrationStep {
    #[must_use]
    pub fn new(from_version: u32, name: &'static str, prior_schema: Block, apply: StepFn) -> Self {
        Self {
            from_version,
            name,
            prior_schema,
            apply,
        }
    }

    #[inline]
    #[must_use]
    pub fn from_version(&self) -> u32 {
        self.from_version
    }

    /// Version the step produces; `None` when there is no version after
    /// `from_version`
    #[inline]
    #[must_use]
    pub fn to_version(&self) -> Option<u32> {
        self.from_version.checked_add(1)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Schema the step's input was written with
    #[inline]
    #[must_use]
    pub fn prior_schema(&self) -> &Block {
        &self.prior_schema
    }

    /// Run the step, writing output for `target_schema`
    ///
    /// # Errors
    /// Whatever the step's transform returns.
    pub fn run(
        &self,
        target_schema: &Block,
        attributes: &AttributeMap,
        config: &MigrationConfig,
    ) -> MigrationResult<AttributeMap> {
        (self.apply)(&self.prior_schema, target_schema, attributes, config)
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStep")
            .field("from_version", &self.from_version)
            .field("name", &self.name)
            .field("prior_schema", &self.prior_schema)
            .finish_non_exhaustive()
    }
}

/// Registry of migration steps for one resource type
#[derive(Debug, Clone)]
pub struct MigrationRegistry {
    resource: &'static str,
    current_version: u32,
    current_schema: Block,
    steps: BTreeMap<u32, MigrationStep>,
    config: MigrationConfig,
}

impl MigrationRegistry {
    /// Create empty registry for a resource currently at `current_version`
    #[must_use]
    pub fn new(resource: &'static str, current_version: u32, current_schema: Block) -> Self {
        Self {
            resource,
            current_version,
            current_schema,
            steps: BTreeMap::new(),
            config: MigrationConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: MigrationConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: MigrationStep) -> Self {
        self.register(step);
        self
    }

    /// Register a step, replacing any step for the same source version
    pub fn register(&mut self, step: MigrationStep) -> Option<MigrationStep> {
        tracing::debug!(
            resource = self.resource,
            from = step.from_version(),
            step = step.name(),
            "registering migration step"
        );
        self.steps.insert(step.from_version(), step)
    }

    /// Check if a step exists for `version`
    #[inline]
    #[must_use]
    pub fn contains(&self, version: u32) -> bool {
        self.steps.contains_key(&version)
    }

    /// Source versions with a registered step, ascending
    pub fn versions(&self) -> impl Iterator<Item = u32> + '_ {
        self.steps.keys().copied()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, version: u32) -> Option<&MigrationStep> {
        self.steps.get(&version)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn resource(&self) -> &'static str {
        self.resource
    }

    #[inline]
    #[must_use]
    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    #[inline]
    #[must_use]
    pub fn current_schema(&self) -> &Block {
        &self.current_schema
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Apply the single step registered for `version`
    ///
    /// Empty input is returned as-is without consulting the registry.
    ///
    /// # Errors
    /// - [`MigrationError::UnsupportedVersion`] if no step handles `version`
    ///   or `version` has no successor
    /// - anything the step itself returns
    pub fn migrate(&self, version: u32, attributes: &AttributeMap) -> MigrationResult<AttributeMap> {
        if attributes.is_empty() {
            tracing::debug!(resource = self.resource, "empty state; nothing to migrate");
            return Ok(attributes.clone());
        }

        let step = self
            .steps
            .get(&version)
            .ok_or(MigrationError::UnsupportedVersion { version })?;
        let to_version = step
            .to_version()
            .ok_or(MigrationError::UnsupportedVersion { version })?;

        tracing::info!(
            resource = self.resource,
            step = step.name(),
            "found state v{}; migrating to v{}",
            step.from_version(),
            to_version
        );
        if self.config.trace_attributes {
            tracing::debug!(attributes = ?attributes, "attributes before migration");
        }

        let migrated = step.run(self.target_schema(to_version), attributes, &self.config)?;

        if self.config.trace_attributes {
            tracing::debug!(attributes = ?migrated, "attributes after migration");
        }
        Ok(migrated)
    }

    /// Bring `state` up to the current version, one step at a time
    ///
    /// The returned state carries the new attributes and version marker;
    /// `state` itself is left untouched, so a failure part-way leaves the
    /// caller with the last fully written state.
    ///
    /// # Errors
    /// - [`MigrationError::VersionAhead`] if `state` is newer than this registry
    /// - [`MigrationError::TooManyHops`] if the chain exceeds `max_hops`
    /// - anything [`migrate`](Self::migrate) returns
    pub fn upgrade(&self, state: &InstanceState) -> MigrationResult<InstanceState> {
        if state.schema_version > self.current_version {
            return Err(MigrationError::VersionAhead {
                stored: state.schema_version,
                current: self.current_version,
            });
        }

        let mut next = state.clone();
        let mut hops = 0;
        while next.schema_version < self.current_version {
            if hops >= self.config.max_hops {
                return Err(MigrationError::TooManyHops {
                    target: self.current_version,
                    max_hops: self.config.max_hops,
                });
            }
            next.attributes = self.migrate(next.schema_version, &next.attributes)?;
            next.schema_version += 1;
            hops += 1;
        }

        if hops > 0 {
            tracing::info!(
                resource = self.resource,
                id = %next.id,
                from = state.schema_version,
                to = next.schema_version,
                "state upgraded"
            );
        }
        Ok(next)
    }

    /// Schema a step writes: the next step's input schema, or the current one
    fn target_schema(&self, to_version: u32) -> &Block {
        self.steps
            .get(&to_version)
            .map_or(&self.current_schema, MigrationStep::prior_schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatmig_flatmap::{Attribute, Descriptor};

    fn schema(field: &str) -> Block {
        Block::new().attribute(field, Attribute::optional(Descriptor::string()))
    }

    fn rename(
        prior: &Block,
        target: &Block,
        attributes: &AttributeMap,
        _: &MigrationConfig,
    ) -> MigrationResult<AttributeMap> {
        let (from, _) = prior.iter().next().unwrap();
        let (to, _) = target.iter().next().unwrap();
        let mut out = attributes.clone();
        if let Some(value) = out.remove(from) {
            out.insert(to, value);
        }
        Ok(out)
    }

    fn registry() -> MigrationRegistry {
        MigrationRegistry::new("widget", 2, schema("c"))
            .with_step(MigrationStep::new(0, "a_to_b", schema("a"), rename))
            .with_step(MigrationStep::new(1, "b_to_c", schema("b"), rename))
    }

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn registry_lists_versions() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(0));
        assert!(!registry.contains(2));
        assert_eq!(registry.versions().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn step_writes_next_steps_schema() {
        let out = registry().migrate(0, &attrs(&[("a", "x")])).unwrap();
        assert_eq!(out, attrs(&[("b", "x")]));
    }

    #[test]
    fn last_step_writes_current_schema() {
        let out = registry().migrate(1, &attrs(&[("b", "x")])).unwrap();
        assert_eq!(out, attrs(&[("c", "x")]));
    }

    #[test]
    fn unknown_version_rejected() {
        let err = registry().migrate(5, &attrs(&[("a", "x")])).unwrap_err();
        assert_eq!(err, MigrationError::UnsupportedVersion { version: 5 });
    }

    #[test]
    fn step_at_last_version_has_no_successor() {
        let step = MigrationStep::new(u32::MAX, "terminal", schema("a"), rename);
        assert_eq!(step.to_version(), None);

        let registry = registry().with_step(step);
        let err = registry.migrate(u32::MAX, &attrs(&[("a", "x")])).unwrap_err();
        assert_eq!(err, MigrationError::UnsupportedVersion { version: u32::MAX });
    }

    #[test]
    fn empty_input_skips_dispatch() {
        let out = registry().migrate(5, &AttributeMap::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn upgrade_chains_steps() {
        let state = InstanceState::new("w-1", attrs(&[("a", "x")]));
        let upgraded = registry().upgrade(&state).unwrap();
        assert_eq!(upgraded.schema_version, 2);
        assert_eq!(upgraded.attributes, attrs(&[("c", "x")]));
        assert_eq!(state.schema_version, 0);
    }

    #[test]
    fn upgrade_respects_hop_limit() {
        let registry = registry().with_config(MigrationConfig::new().with_max_hops(1));
        let state = InstanceState::new("w-1", attrs(&[("a", "x")]));
        let err = registry.upgrade(&state).unwrap_err();
        assert_eq!(err, MigrationError::TooManyHops { target: 2, max_hops: 1 });
    }

    #[test]
    fn upgrade_rejects_future_state() {
        let state = InstanceState::new("w-1", attrs(&[("c", "x")])).with_schema_version(3);
        let err = registry().upgrade(&state).unwrap_err();
        assert_eq!(err, MigrationError::VersionAhead { stored: 3, current: 2 });
    }

    #[test]
    fn upgrade_of_current_state_is_identity() {
        let state = InstanceState::new("w-1", attrs(&[("c", "x")])).with_schema_version(2);
        assert_eq!(registry().upgrade(&state).unwrap(), state);
    }
}
