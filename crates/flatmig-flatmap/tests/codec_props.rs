use flatmig_flatmap::{
    Attribute, AttributeMap, Block, Descriptor, FieldPath, FlatmapReader, FlatmapWriter, Value,
};
use proptest::prelude::*;

fn schema() -> Block {
    let target = Block::new()
        .attribute("host", Attribute::required(Descriptor::string()))
        .attribute("port", Attribute::optional(Descriptor::int()))
        .attribute("tls", Attribute::optional(Descriptor::bool()));
    Block::new()
        .attribute("targets", Attribute::optional(Descriptor::list(Descriptor::block(target))))
        .attribute("tags", Attribute::optional(Descriptor::set(Descriptor::string())))
}

fn targets() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(("[a-z]{1,10}", 0i64..65_536, any::<bool>()), 0..8).prop_map(|rows| {
        rows.into_iter()
            .map(|(host, port, tls)| {
                Value::record([
                    ("host", Value::from(host)),
                    ("port", Value::Int(port)),
                    ("tls", Value::Bool(tls)),
                ])
            })
            .collect()
    })
}

fn write(path: &str, value: &Value) -> AttributeMap {
    let schema = schema();
    let mut writer = FlatmapWriter::new(&schema);
    writer.write_field(&FieldPath::single(path), value).unwrap();
    writer.into_map()
}

proptest! {
    #[test]
    fn prop_list_preserves_order(items in targets()) {
        let map = write("targets", &Value::List(items.clone()));
        let schema = schema();
        let back = FlatmapReader::new(&schema, &map)
            .read_field(&FieldPath::single("targets"))
            .unwrap()
            .unwrap();
        prop_assert_eq!(back, Value::List(items));
    }

    #[test]
    fn prop_list_count_matches_indices(items in targets()) {
        let n = items.len();
        let map = write("targets", &Value::List(items));
        let count = n.to_string();
        prop_assert_eq!(map.get("targets.#"), Some(count.as_str()));
        for i in 0..n {
            let key = format!("targets.{i}.host");
            prop_assert!(map.contains_key(&key));
        }
    }

    #[test]
    fn prop_set_keys_ignore_input_order(tags in prop::collection::btree_set("[a-z]{1,6}", 0..10)) {
        let forward: Vec<Value> = tags.iter().map(|t| Value::from(t.as_str())).collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = write("tags", &Value::List(forward));
        let b = write("tags", &Value::List(reversed));
        prop_assert_eq!(&a, &b);

        let count = tags.len().to_string();
        prop_assert_eq!(a.get("tags.#"), Some(count.as_str()));
    }
}
