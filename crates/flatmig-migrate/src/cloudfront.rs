//! CloudFront distribution state
//!
//! Version 0 stored `cache_behavior` as a set keyed by content hash.
//! Version 1 stores it as an ordered list. The record layout is unchanged.

use std::fmt::Write as _;

use flatmig_flatmap::{hash_string, Attribute, AttributeMap, Block, Descriptor, HashCode, Value};
use once_cell::sync::Lazy;

use crate::config::MigrationConfig;
use crate::convert::convert_set_to_list;
use crate::error::MigrationResult;
use crate::registry::{MigrationRegistry, MigrationStep};

/// Resource type name used in logs
pub const RESOURCE: &str = "aws_cloudfront_distribution";

/// Field re-encoded by the v0 to v1 step
pub const CACHE_BEHAVIOR: &str = "cache_behavior";

/// Schema version written by this build
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

static CACHE_BEHAVIOR_RECORD: Lazy<Block> = Lazy::new(build_cache_behavior_record);

static SCHEMA_V0: Lazy<Block> = Lazy::new(|| {
    Block::new().attribute(
        CACHE_BEHAVIOR,
        Attribute::optional(Descriptor::set(Descriptor::block(cache_behavior_record().clone()))),
    )
});

static SCHEMA_V1: Lazy<Block> = Lazy::new(|| {
    Block::new().attribute(
        CACHE_BEHAVIOR,
        Attribute::optional(Descriptor::list(Descriptor::block(cache_behavior_record().clone()))),
    )
});

/// Fields of one cache behavior; identical in both versions
#[must_use]
pub fn cache_behavior_record() -> &'static Block {
    &CACHE_BEHAVIOR_RECORD
}

/// Distribution schema as written by version 0
#[must_use]
pub fn distribution_schema_v0() -> &'static Block {
    &SCHEMA_V0
}

/// Distribution schema as written by the current version
#[must_use]
pub fn distribution_schema() -> &'static Block {
    &SCHEMA_V1
}

fn build_cache_behavior_record() -> Block {
    let strings = || Descriptor::list(Descriptor::string());

    let cookies = Block::new()
        .attribute("forward", Attribute::required(Descriptor::string()))
        .attribute("whitelisted_names", Attribute::optional(strings()));

    let forwarded_values = Block::new()
        .attribute(
            "cookies",
            Attribute::required(Descriptor::set_with(
                Descriptor::block(cookies),
                "cookie_preference",
                cookie_preference_hash,
            ))
            .with_max_items(1),
        )
        .attribute("headers", Attribute::optional(strings()))
        .attribute("query_string", Attribute::required(Descriptor::bool()))
        .attribute("query_string_cache_keys", Attribute::optional(strings()));

    let lambda_function_association = Block::new()
        .attribute("event_type", Attribute::required(Descriptor::string()))
        .attribute("lambda_arn", Attribute::required(Descriptor::string()));

    Block::new()
        .attribute("allowed_methods", Attribute::required(Descriptor::set(Descriptor::string())))
        .attribute("cached_methods", Attribute::required(Descriptor::set(Descriptor::string())))
        .attribute("compress", Attribute::optional(Descriptor::bool()))
        .attribute("default_ttl", Attribute::required(Descriptor::int()))
        .attribute(
            "forwarded_values",
            Attribute::required(Descriptor::set_with(
                Descriptor::block(forwarded_values),
                "forwarded_values",
                forwarded_values_hash,
            ))
            .with_max_items(1),
        )
        .attribute(
            "lambda_function_association",
            Attribute::optional(Descriptor::set_with(
                Descriptor::block(lambda_function_association),
                "lambda_function_association",
                lambda_function_association_hash,
            ))
            .with_max_items(4),
        )
        .attribute("max_ttl", Attribute::required(Descriptor::int()))
        .attribute("min_ttl", Attribute::required(Descriptor::int()))
        .attribute("path_pattern", Attribute::required(Descriptor::string()))
        .attribute("smooth_streaming", Attribute::optional(Descriptor::bool()))
        .attribute("target_origin_id", Attribute::required(Descriptor::string()))
        .attribute("trusted_signers", Attribute::optional(strings()))
        .attribute("viewer_protocol_policy", Attribute::required(Descriptor::string()))
}

/// `"<forward>-"` followed by each sorted whitelisted name and `-`
#[must_use]
pub fn cookie_preference_hash(value: &Value) -> HashCode {
    let mut buf = String::new();
    let forward = value.field("forward").and_then(Value::as_str).unwrap_or_default();
    let _ = write!(buf, "{forward}-");
    for name in sorted_strings(value.field("whitelisted_names")) {
        let _ = write!(buf, "{name}-");
    }
    hash_string(&buf)
}

/// Query string flag, the cookie preference code when present, then the
/// sorted headers and cache keys, each followed by `-`
#[must_use]
pub fn forwarded_values_hash(value: &Value) -> HashCode {
    let mut buf = String::new();
    let query_string = value.field("query_string").and_then(Value::as_bool).unwrap_or(false);
    let _ = write!(buf, "{query_string}-");

    let cookie = value
        .field("cookies")
        .and_then(Value::elements)
        .and_then(|elements| elements.first().copied());
    if let Some(cookie) = cookie {
        let _ = write!(buf, "{}-", cookie_preference_hash(cookie));
    }

    for header in sorted_strings(value.field("headers")) {
        let _ = write!(buf, "{header}-");
    }
    for key in sorted_strings(value.field("query_string_cache_keys")) {
        let _ = write!(buf, "{key}-");
    }
    hash_string(&buf)
}

/// `"<event_type>-<lambda_arn>"`
#[must_use]
pub fn lambda_function_association_hash(value: &Value) -> HashCode {
    let event_type = value.field("event_type").and_then(Value::as_str).unwrap_or_default();
    let lambda_arn = value.field("lambda_arn").and_then(Value::as_str).unwrap_or_default();
    hash_string(&format!("{event_type}-{lambda_arn}"))
}

fn sorted_strings(value: Option<&Value>) -> Vec<&str> {
    let mut strings: Vec<&str> = value
        .and_then(Value::elements)
        .unwrap_or_default()
        .into_iter()
        .filter_map(Value::as_str)
        .collect();
    strings.sort_unstable();
    strings
}

fn migrate_v0_to_v1(
    prior: &Block,
    target: &Block,
    attributes: &AttributeMap,
    config: &MigrationConfig,
) -> MigrationResult<AttributeMap> {
    convert_set_to_list(CACHE_BEHAVIOR, 0, prior, target, attributes, config)
}

/// Registry of every distribution migration step
#[must_use]
pub fn distribution_migrations() -> MigrationRegistry {
    MigrationRegistry::new(RESOURCE, CURRENT_SCHEMA_VERSION, distribution_schema().clone()).with_step(
        MigrationStep::new(
            0,
            "cache_behavior_set_to_list",
            distribution_schema_v0().clone(),
            migrate_v0_to_v1,
        ),
    )
}

/// Migrate distribution attributes stored at `version` by one step
///
/// # Errors
/// See [`MigrationRegistry::migrate`].
pub fn migrate_distribution_state(
    version: u32,
    attributes: &AttributeMap,
) -> MigrationResult<AttributeMap> {
    distribution_migrations().migrate(version, attributes)
}
