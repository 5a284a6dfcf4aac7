//! Testing utilities for flatmig workspace
//!
//! Shared fixtures, attribute-map builders and tracing setup.

#![allow(missing_docs)]

use flatmig_flatmap::AttributeMap;
use tracing_subscriber::EnvFilter;

/// Build an attribute map from literal pairs
pub fn attribute_map(pairs: &[(&str, &str)]) -> AttributeMap {
    pairs.iter().copied().collect()
}

/// Install a test subscriber honouring `RUST_LOG`, defaulting to `warn`
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Two cache behaviors as stored by distribution schema v0
///
/// Outer set codes are whatever the old provider wrote; nested method sets
/// still carry index-style addresses.
pub fn cloudfront_v0_attributes() -> AttributeMap {
    attribute_map(&[
        ("cache_behavior.#", "2"),
        ("cache_behavior.1328956990.allowed_methods.#", "2"),
        ("cache_behavior.1328956990.allowed_methods.0", "HEAD"),
        ("cache_behavior.1328956990.allowed_methods.1", "GET"),
        ("cache_behavior.1328956990.cached_methods.#", "2"),
        ("cache_behavior.1328956990.cached_methods.0", "HEAD"),
        ("cache_behavior.1328956990.cached_methods.1", "GET"),
        ("cache_behavior.1328956990.compress", "false"),
        ("cache_behavior.1328956990.default_ttl", "86400"),
        ("cache_behavior.1328956990.forwarded_values.#", "1"),
        ("cache_behavior.1328956990.forwarded_values.2759845635.cookies.#", "1"),
        ("cache_behavior.1328956990.forwarded_values.2759845635.cookies.2625240281.forward", "none"),
        ("cache_behavior.1328956990.forwarded_values.2759845635.cookies.2625240281.whitelisted_names.#", "0"),
        ("cache_behavior.1328956990.forwarded_values.2759845635.headers.#", "0"),
        ("cache_behavior.1328956990.forwarded_values.2759845635.query_string", "false"),
        ("cache_behavior.1328956990.forwarded_values.2759845635.query_string_cache_keys.#", "0"),
        ("cache_behavior.1328956990.lambda_function_association.#", "0"),
        ("cache_behavior.1328956990.max_ttl", "31536000"),
        ("cache_behavior.1328956990.min_ttl", "0"),
        ("cache_behavior.1328956990.path_pattern", "/robots.txt"),
        ("cache_behavior.1328956990.smooth_streaming", "false"),
        ("cache_behavior.1328956990.target_origin_id", "foo"),
        ("cache_behavior.1328956990.trusted_signers.#", "0"),
        ("cache_behavior.1328956990.viewer_protocol_policy", "allow-all"),
        ("cache_behavior.3468461710.allowed_methods.#", "2"),
        ("cache_behavior.3468461710.allowed_methods.0", "HEAD"),
        ("cache_behavior.3468461710.allowed_methods.1", "GET"),
        ("cache_behavior.3468461710.cached_methods.#", "2"),
        ("cache_behavior.3468461710.cached_methods.0", "HEAD"),
        ("cache_behavior.3468461710.cached_methods.1", "GET"),
        ("cache_behavior.3468461710.compress", "false"),
        ("cache_behavior.3468461710.default_ttl", "86400"),
        ("cache_behavior.3468461710.forwarded_values.#", "1"),
        ("cache_behavior.3468461710.forwarded_values.2759845635.cookies.#", "1"),
        ("cache_behavior.3468461710.forwarded_values.2759845635.cookies.2625240281.forward", "none"),
        ("cache_behavior.3468461710.forwarded_values.2759845635.cookies.2625240281.whitelisted_names.#", "0"),
        ("cache_behavior.3468461710.forwarded_values.2759845635.headers.#", "0"),
        ("cache_behavior.3468461710.forwarded_values.2759845635.query_string", "false"),
        ("cache_behavior.3468461710.forwarded_values.2759845635.query_string_cache_keys.#", "0"),
        ("cache_behavior.3468461710.lambda_function_association.#", "0"),
        ("cache_behavior.3468461710.max_ttl", "31536000"),
        ("cache_behavior.3468461710.min_ttl", "0"),
        ("cache_behavior.3468461710.path_pattern", "/favicon.ico"),
        ("cache_behavior.3468461710.smooth_streaming", "false"),
        ("cache_behavior.3468461710.target_origin_id", "foo"),
        ("cache_behavior.3468461710.trusted_signers.#", "0"),
        ("cache_behavior.3468461710.viewer_protocol_policy", "allow-all"),
    ])
}

/// [`cloudfront_v0_attributes`] after the v0 to v1 migration
pub fn cloudfront_v1_expected() -> AttributeMap {
    attribute_map(&[
        ("cache_behavior.#", "2"),
        ("cache_behavior.0.allowed_methods.#", "2"),
        ("cache_behavior.0.allowed_methods.1445840968", "HEAD"),
        ("cache_behavior.0.allowed_methods.1040875975", "GET"),
        ("cache_behavior.0.cached_methods.#", "2"),
        ("cache_behavior.0.cached_methods.1445840968", "HEAD"),
        ("cache_behavior.0.cached_methods.1040875975", "GET"),
        ("cache_behavior.0.compress", "false"),
        ("cache_behavior.0.default_ttl", "86400"),
        ("cache_behavior.0.forwarded_values.#", "1"),
        ("cache_behavior.0.forwarded_values.2759845635.cookies.#", "1"),
        ("cache_behavior.0.forwarded_values.2759845635.cookies.2625240281.forward", "none"),
        ("cache_behavior.0.forwarded_values.2759845635.cookies.2625240281.whitelisted_names.#", "0"),
        ("cache_behavior.0.forwarded_values.2759845635.headers.#", "0"),
        ("cache_behavior.0.forwarded_values.2759845635.query_string", "false"),
        ("cache_behavior.0.forwarded_values.2759845635.query_string_cache_keys.#", "0"),
        ("cache_behavior.0.lambda_function_association.#", "0"),
        ("cache_behavior.0.max_ttl", "31536000"),
        ("cache_behavior.0.min_ttl", "0"),
        ("cache_behavior.0.path_pattern", "/favicon.ico"),
        ("cache_behavior.0.smooth_streaming", "false"),
        ("cache_behavior.0.target_origin_id", "foo"),
        ("cache_behavior.0.trusted_signers.#", "0"),
        ("cache_behavior.0.viewer_protocol_policy", "allow-all"),
        ("cache_behavior.1.allowed_methods.#", "2"),
        ("cache_behavior.1.allowed_methods.1445840968", "HEAD"),
        ("cache_behavior.1.allowed_methods.1040875975", "GET"),
        ("cache_behavior.1.cached_methods.#", "2"),
        ("cache_behavior.1.cached_methods.1445840968", "HEAD"),
        ("cache_behavior.1.cached_methods.1040875975", "GET"),
        ("cache_behavior.1.compress", "false"),
        ("cache_behavior.1.default_ttl", "86400"),
        ("cache_behavior.1.forwarded_values.#", "1"),
        ("cache_behavior.1.forwarded_values.2759845635.cookies.#", "1"),
        ("cache_behavior.1.forwarded_values.2759845635.cookies.2625240281.forward", "none"),
        ("cache_behavior.1.forwarded_values.2759845635.cookies.2625240281.whitelisted_names.#", "0"),
        ("cache_behavior.1.forwarded_values.2759845635.headers.#", "0"),
        ("cache_behavior.1.forwarded_values.2759845635.query_string", "false"),
        ("cache_behavior.1.forwarded_values.2759845635.query_string_cache_keys.#", "0"),
        ("cache_behavior.1.lambda_function_association.#", "0"),
        ("cache_behavior.1.max_ttl", "31536000"),
        ("cache_behavior.1.min_ttl", "0"),
        ("cache_behavior.1.path_pattern", "/robots.txt"),
        ("cache_behavior.1.smooth_streaming", "false"),
        ("cache_behavior.1.target_origin_id", "foo"),
        ("cache_behavior.1.trusted_signers.#", "0"),
        ("cache_behavior.1.viewer_protocol_policy", "allow-all"),
    ])
}

/// Keys of one v0 cache behavior stored under `code`
///
/// Uses the same defaults as [`cloudfront_v0_attributes`] with a custom
/// path pattern.
pub fn cloudfront_v0_behavior(code: &str, path_pattern: &str) -> Vec<(String, String)> {
    let fields = [
        ("allowed_methods.#", "2"),
        ("allowed_methods.0", "HEAD"),
        ("allowed_methods.1", "GET"),
        ("cached_methods.#", "2"),
        ("cached_methods.0", "HEAD"),
        ("cached_methods.1", "GET"),
        ("compress", "false"),
        ("default_ttl", "86400"),
        ("forwarded_values.#", "1"),
        ("forwarded_values.2759845635.cookies.#", "1"),
        ("forwarded_values.2759845635.cookies.2625240281.forward", "none"),
        ("forwarded_values.2759845635.cookies.2625240281.whitelisted_names.#", "0"),
        ("forwarded_values.2759845635.headers.#", "0"),
        ("forwarded_values.2759845635.query_string", "false"),
        ("forwarded_values.2759845635.query_string_cache_keys.#", "0"),
        ("lambda_function_association.#", "0"),
        ("max_ttl", "31536000"),
        ("min_ttl", "0"),
        ("path_pattern", path_pattern),
        ("smooth_streaming", "false"),
        ("target_origin_id", "foo"),
        ("trusted_signers.#", "0"),
        ("viewer_protocol_policy", "allow-all"),
    ];
    fields
        .iter()
        .map(|(field, value)| (format!("cache_behavior.{code}.{field}"), (*value).to_string()))
        .collect()
}

/// v0 distribution attributes holding one behavior per `(code, path_pattern)`
pub fn cloudfront_v0_with(behaviors: &[(&str, &str)]) -> AttributeMap {
    let mut map: AttributeMap = behaviors
        .iter()
        .flat_map(|(code, pattern)| cloudfront_v0_behavior(code, pattern))
        .collect();
    map.insert("cache_behavior.#", behaviors.len().to_string());
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_reproduces_fixture() {
        let built = cloudfront_v0_with(&[("1328956990", "/robots.txt"), ("3468461710", "/favicon.ico")]);
        assert_eq!(built, cloudfront_v0_attributes());
    }

    #[test]
    fn fixtures_have_same_key_count() {
        assert_eq!(cloudfront_v0_attributes().len(), cloudfront_v1_expected().len());
    }
}
