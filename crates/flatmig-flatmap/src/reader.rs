//! Flatmap decoding
//!
//! [`FlatmapReader`] rebuilds [`Value`]s from an [`AttributeMap`] following
//! a schema [`Block`]. The source map is only ever borrowed.

use crate::attributes::AttributeMap;
use crate::error::{CodecError, CodecResult};
use crate::path::FieldPath;
use crate::schema::{Attribute, Block, Descriptor, ScalarKind};
use crate::value::{SetValue, Value};

/// Constraints that apply to the field being read
#[derive(Debug, Clone, Copy, Default)]
struct FieldRules {
    required: bool,
    max_items: Option<usize>,
}

impl FieldRules {
    /// Collection elements carry no constraints of their own
    const ELEMENT: Self = Self {
        required: false,
        max_items: None,
    };
}

impl From<&Attribute> for FieldRules {
    fn from(attribute: &Attribute) -> Self {
        Self {
            required: attribute.is_required(),
            max_items: attribute.max_items(),
        }
    }
}

/// Reads fields out of a flattened attribute map
#[derive(Debug, Clone, Copy)]
pub struct FlatmapReader<'a> {
    schema: &'a Block,
    attributes: &'a AttributeMap,
}

impl<'a> FlatmapReader<'a> {
    /// Create reader over `attributes`, interpreted through `schema`
    #[inline]
    #[must_use]
    pub fn new(schema: &'a Block, attributes: &'a AttributeMap) -> Self {
        Self { schema, attributes }
    }

    /// Read the field at `path`
    ///
    /// Returns `Ok(None)` when nothing is stored for the field. Collections
    /// with no `.#` key are absent, not malformed.
    ///
    /// # Errors
    /// - [`CodecError::UnknownField`] if the schema has no such field
    /// - [`CodecError::TypeMismatch`] if a scalar does not parse as its kind
    /// - [`CodecError::MalformedStructure`] if counts and element keys
    ///   disagree on a required field or exceed its limit
    pub fn read_field(&self, path: &FieldPath) -> CodecResult<Option<Value>> {
        let (attribute, descriptor) = self.schema.resolve(path)?;
        let rules = if std::ptr::eq(descriptor, attribute.descriptor()) {
            FieldRules::from(attribute)
        } else {
            FieldRules::ELEMENT
        };
        self.read(descriptor, path, rules)
    }

    /// Read `attribute` stored at an explicit `path`
    ///
    /// Skips schema resolution, so `path` may sit anywhere in the map.
    ///
    /// # Errors
    /// Same as [`read_field`](Self::read_field), minus unknown fields.
    pub fn read_attribute(&self, attribute: &Attribute, path: &FieldPath) -> CodecResult<Option<Value>> {
        self.read(attribute.descriptor(), path, FieldRules::from(attribute))
    }

    /// Read the field at `path`, substituting its zero value when absent
    ///
    /// # Errors
    /// Same as [`read_field`](Self::read_field).
    pub fn read_field_or_zero(&self, path: &FieldPath) -> CodecResult<Value> {
        match self.read_field(path)? {
            Some(value) => Ok(value),
            None => Ok(self.schema.resolve(path)?.1.zero_value()),
        }
    }

    fn read(
        &self,
        descriptor: &Descriptor,
        path: &FieldPath,
        rules: FieldRules,
    ) -> CodecResult<Option<Value>> {
        match descriptor {
            Descriptor::Scalar(kind) => self
                .attributes
                .get(&path.to_string())
                .map(|raw| parse_scalar(*kind, raw, path))
                .transpose(),
            Descriptor::List(elem) => self.read_list(elem, path, rules),
            Descriptor::Set(elem, hasher) => {
                let Some(stored) = self.read_set_elements(elem, path, rules)? else {
                    return Ok(None);
                };
                let mut set = SetValue::new();
                for (stored_code, value) in stored {
                    let code = hasher.code(elem, &value)?;
                    if set.insert(code, value).is_some() {
                        tracing::warn!(
                            path = %path,
                            stored_code = %stored_code,
                            code = %code,
                            "set elements collide; keeping the later one"
                        );
                    }
                }
                Ok(Some(Value::Set(set)))
            }
            Descriptor::Block(block) => self.read_record(block, path),
        }
    }

    fn read_count(&self, path: &FieldPath, rules: FieldRules) -> CodecResult<Option<usize>> {
        let Some(raw) = self.attributes.count(path) else {
            return Ok(None);
        };
        let count: usize = raw.parse().map_err(|_| {
            CodecError::malformed(path, format!("count '{raw}' is not a non-negative integer"))
        })?;
        if let Some(max) = rules.max_items {
            if count > max {
                return Err(CodecError::malformed(
                    path,
                    format!("{count} elements exceed the limit of {max}"),
                ));
            }
        }
        Ok(Some(count))
    }

    fn read_list(
        &self,
        elem: &Descriptor,
        path: &FieldPath,
        rules: FieldRules,
    ) -> CodecResult<Option<Value>> {
        let Some(count) = self.read_count(path, rules)? else {
            return Ok(None);
        };

        let stored = self.attributes.keys_with_prefix(&path.prefix()).count();
        if count > stored {
            return Err(CodecError::malformed(
                path,
                format!("count is {count} but only {stored} keys are stored beneath it"),
            ));
        }

        let mut items = Vec::with_capacity(count);
        for i in 0..count {
            match self.read(elem, &path.index(i), FieldRules::ELEMENT)? {
                Some(value) => items.push(value),
                None if rules.required => {
                    return Err(CodecError::malformed(
                        path,
                        format!("count is {count} but element {i} is missing"),
                    ))
                }
                None => items.push(elem.zero_value()),
            }
        }
        Ok(Some(Value::List(items)))
    }

    /// Element addresses found under a set, with their decoded values
    ///
    /// Addresses are opaque: whatever follows `<path>.` up to the next dot.
    fn read_set_elements(
        &self,
        elem: &Descriptor,
        path: &FieldPath,
        rules: FieldRules,
    ) -> CodecResult<Option<Vec<(String, Value)>>> {
        let count = self.read_count(path, rules)?;
        let codes = self.attributes.element_addresses(path);

        if count.is_none() && codes.is_empty() {
            return Ok(None);
        }

        let expected = count.unwrap_or(0);
        if expected != codes.len() {
            if rules.required {
                return Err(CodecError::malformed(
                    path,
                    format!("count is {expected} but {} elements are stored", codes.len()),
                ));
            }
            tracing::warn!(
                path = %path,
                count = expected,
                found = codes.len(),
                "set count disagrees with stored elements; using stored elements"
            );
        }

        let mut elements = Vec::with_capacity(codes.len());
        for code in codes {
            let value = self
                .read(elem, &path.child(code), FieldRules::ELEMENT)?
                .ok_or_else(|| {
                    CodecError::malformed(path, format!("element '{code}' has no readable content"))
                })?;
            elements.push((code.to_string(), value));
        }
        Ok(Some(elements))
    }

    /// A record exists if any of its fields is stored; absent fields are
    /// zero-filled.
    fn read_record(&self, block: &Block, path: &FieldPath) -> CodecResult<Option<Value>> {
        let mut exists = false;
        let mut fields = std::collections::BTreeMap::new();
        for (name, attribute) in block.iter() {
            let descriptor = attribute.descriptor();
            let value = match self.read(descriptor, &path.child(name), FieldRules::from(attribute))? {
                Some(value) => {
                    exists = true;
                    value
                }
                None => descriptor.zero_value(),
            };
            fields.insert(name.to_string(), value);
        }
        Ok(exists.then_some(Value::Record(fields)))
    }
}

/// Parse one stored scalar
///
/// Empty strings read as the zero value of non-string kinds.
fn parse_scalar(kind: ScalarKind, raw: &str, path: &FieldPath) -> CodecResult<Value> {
    let mismatch = || CodecError::type_mismatch(path, kind.name(), format!("'{raw}'"));
    match kind {
        ScalarKind::String => Ok(Value::String(raw.to_string())),
        ScalarKind::Bool => match raw {
            "" => Ok(Value::Bool(false)),
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(Value::Bool(true)),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(Value::Bool(false)),
            _ => Err(mismatch()),
        },
        ScalarKind::Int if raw.is_empty() => Ok(Value::Int(0)),
        ScalarKind::Int => parse_int(raw).map(Value::Int).ok_or_else(mismatch),
        ScalarKind::Float if raw.is_empty() => Ok(Value::Float(0.0)),
        ScalarKind::Float => raw.parse().map(Value::Float).map_err(|_| mismatch()),
    }
}

/// Integer literal with optional sign and base prefix
///
/// `0x`, `0o` and `0b` select hex, octal and binary; a bare leading `0`
/// selects octal. Underscores may separate digits.
fn parse_int(raw: &str) -> Option<i64> {
    let (negative, body) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let (radix, digits, prefixed) = match body.get(..2) {
        Some("0x" | "0X") => (16, &body[2..], true),
        Some("0o" | "0O") => (8, &body[2..], true),
        Some("0b" | "0B") => (2, &body[2..], true),
        _ if body.len() > 1 && body.starts_with('0') => (8, &body[1..], true),
        _ => (10, body, false),
    };
    if digits.is_empty()
        || digits.ends_with('_')
        || digits.contains("__")
        || (!prefixed && digits.starts_with('_'))
    {
        return None;
    }

    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if digits.is_empty() || digits.starts_with('+') {
        return None;
    }
    let magnitude = u64::from_str_radix(&digits, radix).ok()?;
    if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// Decode one attribute stored at `path`
///
/// Absent fields decode to the descriptor's zero value, so a missing
/// collection is an empty one.
///
/// # Errors
/// Same as [`FlatmapReader::read_field`].
pub fn decode(attribute: &Attribute, attributes: &AttributeMap, path: &FieldPath) -> CodecResult<Value> {
    let unscoped = Block::new();
    let value = FlatmapReader::new(&unscoped, attributes).read_attribute(attribute, path)?;
    Ok(value.unwrap_or_else(|| attribute.descriptor().zero_value()))
}
