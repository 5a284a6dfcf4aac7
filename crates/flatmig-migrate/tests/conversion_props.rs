//! Property tests for set to list conversion

use std::collections::BTreeSet;

use flatmig_flatmap::{hash_record, AttributeMap, FieldPath, Value};
use flatmig_migrate::cloudfront;
use flatmig_test_utils::cloudfront_v0_with;
use proptest::prelude::*;

fn behaviors() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_set("/[a-z]{1,12}", 1..6).prop_map(|patterns| {
        patterns
            .into_iter()
            .enumerate()
            .map(|(i, pattern)| ((1_000_003 + i * 7_919).to_string(), pattern))
            .collect()
    })
}

fn stored_input(behaviors: &[(String, String)]) -> AttributeMap {
    let pairs: Vec<(&str, &str)> = behaviors
        .iter()
        .map(|(code, pattern)| (code.as_str(), pattern.as_str()))
        .collect();
    cloudfront_v0_with(&pairs)
}

fn element_addresses(map: &AttributeMap) -> BTreeSet<String> {
    map.element_addresses(&FieldPath::single(cloudfront::CACHE_BEHAVIOR))
        .into_iter()
        .map(str::to_string)
        .collect()
}

proptest! {
    #[test]
    fn prop_count_matches_elements(behaviors in behaviors()) {
        let migrated = cloudfront::migrate_distribution_state(0, &stored_input(&behaviors)).unwrap();
        let n = behaviors.len();
        let count = n.to_string();
        prop_assert_eq!(migrated.get("cache_behavior.#"), Some(count.as_str()));

        let expected: BTreeSet<String> = (0..n).map(|i| i.to_string()).collect();
        prop_assert_eq!(element_addresses(&migrated), expected);
    }

    #[test]
    fn prop_every_behavior_survives_once(behaviors in behaviors()) {
        let migrated = cloudfront::migrate_distribution_state(0, &stored_input(&behaviors)).unwrap();
        let patterns: BTreeSet<&str> = (0..behaviors.len())
            .filter_map(|i| migrated.get(&format!("cache_behavior.{i}.path_pattern")))
            .collect();
        let expected: BTreeSet<&str> = behaviors.iter().map(|(_, p)| p.as_str()).collect();
        prop_assert_eq!(patterns, expected);
    }

    #[test]
    fn prop_order_follows_recomputed_codes(behaviors in behaviors()) {
        let input = stored_input(&behaviors);
        let migrated = cloudfront::migrate_distribution_state(0, &input).unwrap();

        let record = cloudfront::cache_behavior_record();
        let mut by_code: Vec<(String, String)> = behaviors
            .iter()
            .map(|(_, pattern)| {
                let value = Value::record([
                    ("allowed_methods", Value::List(vec![Value::from("HEAD"), Value::from("GET")])),
                    ("cached_methods", Value::List(vec![Value::from("HEAD"), Value::from("GET")])),
                    ("compress", Value::Bool(false)),
                    ("default_ttl", Value::Int(86_400)),
                    ("max_ttl", Value::Int(31_536_000)),
                    ("min_ttl", Value::Int(0)),
                    ("path_pattern", Value::from(pattern.as_str())),
                    ("smooth_streaming", Value::Bool(false)),
                    ("target_origin_id", Value::from("foo")),
                    ("trusted_signers", Value::List(Vec::new())),
                    ("viewer_protocol_policy", Value::from("allow-all")),
                    ("lambda_function_association", Value::List(Vec::new())),
                    (
                        "forwarded_values",
                        Value::List(vec![Value::record([
                            (
                                "cookies",
                                Value::List(vec![Value::record([
                                    ("forward", Value::from("none")),
                                    ("whitelisted_names", Value::List(Vec::new())),
                                ])]),
                            ),
                            ("headers", Value::List(Vec::new())),
                            ("query_string", Value::Bool(false)),
                            ("query_string_cache_keys", Value::List(Vec::new())),
                        ])]),
                    ),
                ]);
                (hash_record(record, &value).unwrap().to_string(), pattern.clone())
            })
            .collect();
        by_code.sort();

        for (i, (_, pattern)) in by_code.iter().enumerate() {
            let key = format!("cache_behavior.{i}.path_pattern");
            prop_assert_eq!(migrated.get(&key), Some(pattern.as_str()));
        }
    }

    #[test]
    fn prop_input_never_mutated(behaviors in behaviors()) {
        let input = stored_input(&behaviors);
        let snapshot = input.clone();
        let _ = cloudfront::migrate_distribution_state(0, &input);
        prop_assert_eq!(input, snapshot);
    }
}
