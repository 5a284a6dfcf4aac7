//! Set to list conversion
//!
//! Re-encodes one top-level field from a hash-keyed set into an
//! index-keyed list. Records keep their content; only their addresses
//! change. Elements come out in set enumeration order, which is what the
//! new list order is pinned to.

use flatmig_flatmap::{
    AttributeMap, Block, FieldPath, FlatmapReader, FlatmapWriter, SetValue, Value,
};

use crate::config::MigrationConfig;
use crate::error::{MigrationError, MigrationResult};

/// Convert `field` from a set in `prior` to a list in `target`
///
/// Every key under `field.` is replaced; all other keys pass through
/// untouched. The input map is not modified.
///
/// Input already in the shape `target` writes is treated as converted: its
/// element addresses are exactly `0..N`, none is a code the set hasher
/// produces, and decoding then re-encoding it under `target` reproduces
/// every stored key under `field.`. Index-addressed sets whose nested
/// content is not in that shape are still converted. With
/// `reject_reapplication` set this fails with
/// [`MigrationError::AlreadyMigrated`]; otherwise the input is returned
/// unchanged.
///
/// # Errors
/// - [`MigrationError::Codec`] if the field cannot be decoded or encoded
/// - [`MigrationError::UnexpectedValue`] if `prior` does not declare
///   `field` as a set
/// - [`MigrationError::AlreadyMigrated`] as described above
pub fn convert_set_to_list(
    field: &str,
    from_version: u32,
    prior: &Block,
    target: &Block,
    attributes: &AttributeMap,
    config: &MigrationConfig,
) -> MigrationResult<AttributeMap> {
    let path = FieldPath::single(field);
    let set = match FlatmapReader::new(prior, attributes).read_field_or_zero(&path)? {
        Value::Set(set) => set,
        other => {
            return Err(MigrationError::UnexpectedValue {
                field: field.to_string(),
                expected: "set".to_string(),
                found: other.type_name().to_string(),
            })
        }
    };

    if is_list_encoded(attributes, &path, &set, target) {
        if config.reject_reapplication {
            return Err(MigrationError::AlreadyMigrated {
                field: field.to_string(),
                version: from_version,
            });
        }
        tracing::warn!(field, "field is already list-encoded; leaving state unchanged");
        return Ok(attributes.clone());
    }

    let records = set.into_list();
    let count = records.len();

    let mut migrated = attributes.clone();
    let removed = migrated.remove_prefix(&path.prefix());

    let mut writer = FlatmapWriter::new(target);
    writer.write_field(&path, &Value::List(records))?;
    let written = writer.into_map();
    let written_len = written.len();
    let overwritten = migrated.merge(written);
    debug_assert_eq!(overwritten, 0, "writer output must only land under '{field}.'");

    tracing::debug!(
        field,
        elements = count,
        removed,
        written = written_len,
        "converted set to list"
    );
    Ok(migrated)
}

/// Stored addresses are list indices, none is a recomputed code, and the
/// stored keys are exactly what `target` would write for their content
fn is_list_encoded(
    attributes: &AttributeMap,
    path: &FieldPath,
    set: &SetValue,
    target: &Block,
) -> bool {
    let stored = attributes.element_addresses(path);
    if stored.is_empty() {
        return false;
    }

    let sequential = (0..stored.len()).all(|i| stored.contains(i.to_string().as_str()));
    if !sequential || set.codes().any(|code| stored.contains(code)) {
        return false;
    }

    let Ok(Some(list)) = FlatmapReader::new(target, attributes).read_field(path) else {
        return false;
    };
    let mut writer = FlatmapWriter::new(target);
    if writer.write_field(path, &list).is_err() {
        return false;
    }
    let reencoded = writer.into_map();
    attributes
        .keys_with_prefix(&path.prefix())
        .all(|key| reencoded.get(key) == attributes.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatmig_flatmap::{Attribute, Descriptor};
    use pretty_assertions::assert_eq;

    fn record() -> Block {
        Block::new()
            .attribute("name", Attribute::required(Descriptor::string()))
            .attribute("port", Attribute::optional(Descriptor::int()))
    }

    fn prior() -> Block {
        Block::new()
            .attribute("rules", Attribute::optional(Descriptor::set(Descriptor::block(record()))))
    }

    fn target() -> Block {
        Block::new()
            .attribute("rules", Attribute::optional(Descriptor::list(Descriptor::block(record()))))
    }

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs.iter().copied().collect()
    }

    fn convert(input: &AttributeMap, config: &MigrationConfig) -> MigrationResult<AttributeMap> {
        convert_set_to_list("rules", 0, &prior(), &target(), input, config)
    }

    #[test]
    fn converts_and_keeps_unrelated_keys() {
        let input = attrs(&[
            ("comment", "edge"),
            ("rules.#", "1"),
            ("rules.99.name", "web"),
            ("rules.99.port", "80"),
            ("rulesets", "kept"),
        ]);
        let out = convert(&input, &MigrationConfig::new()).unwrap();
        assert_eq!(
            out,
            attrs(&[
                ("comment", "edge"),
                ("rules.#", "1"),
                ("rules.0.name", "web"),
                ("rules.0.port", "80"),
                ("rulesets", "kept"),
            ])
        );
    }

    #[test]
    fn absent_field_becomes_empty_list() {
        let input = attrs(&[("comment", "edge")]);
        let out = convert(&input, &MigrationConfig::new()).unwrap();
        assert_eq!(out, attrs(&[("comment", "edge"), ("rules.#", "0")]));
    }

    #[test]
    fn list_encoded_input_is_rejected() {
        let input = attrs(&[("rules.#", "1"), ("rules.0.name", "web"), ("rules.0.port", "80")]);
        let err = convert(&input, &MigrationConfig::new()).unwrap_err();
        assert_eq!(
            err,
            MigrationError::AlreadyMigrated {
                field: "rules".to_string(),
                version: 0
            }
        );
    }

    #[test]
    fn list_encoded_input_passes_through_when_allowed() {
        let input = attrs(&[("rules.#", "1"), ("rules.0.name", "web"), ("rules.0.port", "80")]);
        let config = MigrationConfig::new().with_reject_reapplication(false);
        assert_eq!(convert(&input, &config).unwrap(), input);
    }

    #[test]
    fn index_addressed_set_with_unhashed_nested_set_is_converted() {
        let record = record().attribute(
            "methods",
            Attribute::required(Descriptor::set(Descriptor::string())),
        );
        let prior = Block::new()
            .attribute("rules", Attribute::optional(Descriptor::set(Descriptor::block(record.clone()))));
        let target = Block::new()
            .attribute("rules", Attribute::optional(Descriptor::list(Descriptor::block(record))));
        let input = attrs(&[
            ("rules.#", "1"),
            ("rules.0.methods.#", "1"),
            ("rules.0.methods.0", "GET"),
            ("rules.0.name", "web"),
        ]);

        let out = convert_set_to_list("rules", 0, &prior, &target, &input, &MigrationConfig::new())
            .unwrap();

        assert_eq!(
            out,
            attrs(&[
                ("rules.#", "1"),
                ("rules.0.methods.#", "1"),
                ("rules.0.methods.1040875975", "GET"),
                ("rules.0.name", "web"),
                ("rules.0.port", "0"),
            ])
        );
    }

    #[test]
    fn non_set_field_is_unexpected() {
        let input = attrs(&[("rules.#", "0")]);
        let err = convert_set_to_list("rules", 0, &target(), &target(), &input, &MigrationConfig::new())
            .unwrap_err();
        assert!(matches!(err, MigrationError::UnexpectedValue { .. }));
    }

    #[test]
    fn malformed_required_set_propagates_codec_error() {
        let required = Block::new().attribute(
            "rules",
            Attribute::required(Descriptor::set(Descriptor::block(record()))),
        );
        let input = attrs(&[("rules.#", "2"), ("rules.99.name", "web")]);
        let err = convert_set_to_list("rules", 0, &required, &target(), &input, &MigrationConfig::new())
            .unwrap_err();
        assert!(matches!(err, MigrationError::Codec(_)));
    }
}
