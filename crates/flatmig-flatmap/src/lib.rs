//! Flatmap codec
//!
//! Encodes nested resource state to and from flat, dotted-key attribute
//! maps, driven by declarative schema descriptors.
//!
//! # Core Concepts
//!
//! - [`AttributeMap`]: persisted `key → value` form of a resource
//! - [`FieldPath`]: dotted address of a field, element or count marker
//! - [`Block`] / [`Attribute`] / [`Descriptor`]: field shapes
//! - [`Value`] / [`SetValue`]: decoded, in-memory form of a field
//! - [`HashCode`]: content fingerprint keying set elements
//! - [`FlatmapReader`] / [`FlatmapWriter`]: decode and encode
//!
//! # Example
//!
//! ```rust
//! use flatmig_flatmap::{AttributeMap, Attribute, Block, Descriptor, FieldPath, FlatmapReader, FlatmapWriter, Value};
//!
//! let schema = Block::new()
//!     .attribute("methods", Attribute::required(Descriptor::set(Descriptor::string())));
//! let stored: AttributeMap = [("methods.#", "1"), ("methods.7", "GET")].into_iter().collect();
//!
//! let methods = FlatmapReader::new(&schema, &stored)
//!     .read_field(&FieldPath::single("methods"))?
//!     .expect("methods are stored");
//!
//! let mut writer = FlatmapWriter::new(&schema);
//! writer.write_field(&FieldPath::single("methods"), &methods)?;
//! assert_eq!(writer.map().get("methods.1040875975"), Some("GET"));
//! # Ok::<(), flatmig_flatmap::CodecError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod attributes;
mod error;
mod hash;
mod path;
mod reader;
mod schema;
mod value;
mod writer;

pub use attributes::AttributeMap;
pub use error::{CodecError, CodecResult};
pub use hash::{hash_record, hash_string, hash_value, keyed_elements, HashCode};
pub use path::{FieldPath, PathError, COUNT_SEGMENT};
pub use reader::{decode, FlatmapReader};
pub use schema::{Attribute, Block, Descriptor, HashFn, Presence, ScalarKind, SetHasher};
pub use value::{SetValue, Value};
pub use writer::{encode, FlatmapWriter};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn schema() -> Block {
        let cookies = Block::new()
            .attribute("forward", Attribute::required(Descriptor::string()))
            .attribute(
                "whitelisted_names",
                Attribute::optional(Descriptor::list(Descriptor::string())),
            );
        Block::new().attribute(
            "cookies",
            Attribute::required(Descriptor::set(Descriptor::block(cookies))).with_max_items(1),
        )
    }

    #[test]
    fn decode_then_encode_normalises_set_keys() {
        let schema = schema();
        let stored: AttributeMap = [
            ("cookies.#", "1"),
            ("cookies.12.forward", "none"),
            ("cookies.12.whitelisted_names.#", "0"),
        ]
        .into_iter()
        .collect();

        let path = FieldPath::single("cookies");
        let value = FlatmapReader::new(&schema, &stored)
            .read_field(&path)
            .unwrap()
            .unwrap();
        let mut writer = FlatmapWriter::new(&schema);
        writer.write_field(&path, &value).unwrap();
        let written = writer.into_map();

        let expected_code = hash_string("forward:none;whitelisted_names:();").to_string();
        assert_eq!(written.get("cookies.#"), Some("1"));
        assert_eq!(
            written.get(&format!("cookies.{expected_code}.forward")),
            Some("none")
        );
        assert_eq!(
            written.get(&format!("cookies.{expected_code}.whitelisted_names.#")),
            Some("0")
        );
    }

    #[test]
    fn free_functions_match_reader_and_writer() {
        let attribute = Attribute::optional(Descriptor::list(Descriptor::int()));
        let path = FieldPath::single("ports");
        let value = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let encoded = encode(&attribute, &path, &value).unwrap();
        assert_eq!(decode(&attribute, &encoded, &path).unwrap(), value);
    }
}
