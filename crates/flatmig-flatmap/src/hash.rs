//! Content hashing for set elements
//!
//! Provides [`HashCode`], the non-negative fingerprint under which a set
//! element is stored, and the canonical serialisation it is computed from.
//! Codes are persisted inside attribute keys, so the algorithm must never
//! change: CRC-32 (IEEE) over a fixed textual rendering of the element.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter, Write as _};
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};
use crate::path::FieldPath;
use crate::schema::{Block, Descriptor, ScalarKind, SetHasher};
use crate::value::Value;

/// Set element fingerprint
///
/// Rendered in decimal wherever it appears in a key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct HashCode(u32);

impl HashCode {
    #[inline]
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Display for HashCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HashCode {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Hash an arbitrary string
#[inline]
#[must_use]
pub fn hash_string(s: &str) -> HashCode {
    HashCode(crc32fast::hash(s.as_bytes()))
}

/// Content hash of a value under its descriptor
///
/// # Errors
/// Returns [`CodecError::TypeMismatch`] if the value does not fit the
/// descriptor.
pub fn hash_value(descriptor: &Descriptor, value: &Value) -> CodecResult<HashCode> {
    let mut buf = String::new();
    write_member(&mut buf, descriptor, value, &FieldPath::root())?;
    Ok(hash_string(&buf))
}

/// Content hash of a record under its block
///
/// # Errors
/// Returns [`CodecError::TypeMismatch`] if a field does not fit its
/// attribute.
pub fn hash_record(block: &Block, value: &Value) -> CodecResult<HashCode> {
    let mut buf = String::new();
    serialize_record(&mut buf, block, value, &FieldPath::root())?;
    Ok(hash_string(&buf))
}

impl SetHasher {
    /// Code for one element of a set
    ///
    /// # Errors
    /// Returns [`CodecError::TypeMismatch`] if the element does not fit the
    /// element descriptor (content hashing only; custom functions accept
    /// anything).
    pub fn code(&self, elem: &Descriptor, value: &Value) -> CodecResult<HashCode> {
        match self {
            Self::Content => match elem {
                Descriptor::Block(block) => hash_record(block, value),
                _ => hash_value(elem, value),
            },
            Self::Custom { func, .. } => Ok(func(value)),
        }
    }
}

/// Key every element of a list or set by its code
///
/// Codes are rendered in decimal and the map iterates them in string order.
/// When two elements share a code the later one replaces the earlier; the
/// second value of the tuple counts how many were replaced.
///
/// # Errors
/// Returns [`CodecError::TypeMismatch`] if `value` is not a collection or an
/// element cannot be hashed.
pub fn keyed_elements<'v>(
    elem: &Descriptor,
    hasher: SetHasher,
    value: &'v Value,
    path: &FieldPath,
) -> CodecResult<(BTreeMap<String, &'v Value>, usize)> {
    let items = value
        .elements()
        .ok_or_else(|| CodecError::type_mismatch(path, "set", value.type_name()))?;
    let mut keyed = BTreeMap::new();
    let mut replaced = 0;
    for item in items {
        let code = hasher.code(elem, item)?;
        if keyed.insert(code.to_string(), item).is_some() {
            replaced += 1;
        }
    }
    Ok((keyed, replaced))
}

fn serialize_value(
    buf: &mut String,
    descriptor: &Descriptor,
    value: &Value,
    path: &FieldPath,
) -> CodecResult<()> {
    match (descriptor, value) {
        (Descriptor::Scalar(ScalarKind::Bool), Value::Bool(b)) => buf.push(if *b { '1' } else { '0' }),
        (Descriptor::Scalar(ScalarKind::Int), Value::Int(i)) => {
            let _ = write!(buf, "{i}");
        }
        (Descriptor::Scalar(ScalarKind::Float), Value::Float(x)) => {
            let _ = write!(buf, "{x}");
        }
        (Descriptor::Scalar(ScalarKind::String), Value::String(s)) => buf.push_str(s),
        (Descriptor::List(elem), Value::List(items)) => {
            buf.push('(');
            for (i, item) in items.iter().enumerate() {
                write_member(buf, elem, item, &path.index(i))?;
            }
            buf.push(')');
        }
        (Descriptor::Set(elem, hasher), Value::List(_) | Value::Set(_)) => {
            buf.push('{');
            let (keyed, _) = keyed_elements(elem, *hasher, value, path)?;
            for (code, item) in keyed {
                write_member(buf, elem, item, &path.child(code))?;
            }
            buf.push('}');
        }
        (Descriptor::Block(block), Value::Record(_)) => {
            buf.push('<');
            serialize_record(buf, block, value, path)?;
            buf.push('>');
        }
        _ => {
            return Err(CodecError::type_mismatch(
                path,
                descriptor.type_name(),
                value.type_name(),
            ))
        }
    }
    buf.push(';');
    Ok(())
}

/// Collection members that are records are wrapped in `<…>;`
fn write_member(
    buf: &mut String,
    elem: &Descriptor,
    value: &Value,
    path: &FieldPath,
) -> CodecResult<()> {
    match elem {
        Descriptor::Block(block) => {
            buf.push('<');
            serialize_record(buf, block, value, path)?;
            buf.push_str(">;");
            Ok(())
        }
        _ => serialize_value(buf, elem, value, path),
    }
}

/// `name:value;` for every user-supplied attribute, in name order
fn serialize_record(
    buf: &mut String,
    block: &Block,
    value: &Value,
    path: &FieldPath,
) -> CodecResult<()> {
    let fields = value
        .as_record()
        .ok_or_else(|| CodecError::type_mismatch(path, "record", value.type_name()))?;
    for (name, attribute) in block.iter() {
        if !attribute.is_user_supplied() {
            continue;
        }
        buf.push_str(name);
        buf.push(':');
        match fields.get(name) {
            Some(inner) => serialize_value(buf, attribute.descriptor(), inner, &path.child(name))?,
            None => buf.push(';'),
        }
    }
    Ok(())
}
