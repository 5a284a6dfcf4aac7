//! Schema descriptors
//!
//! A [`Block`] names its attributes; each [`Attribute`] wraps a
//! [`Descriptor`] that fixes the field's shape once, at construction time.
//! Readers and writers never inspect values to decide how to treat a field.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CodecError, CodecResult};
use crate::hash::HashCode;
use crate::path::FieldPath;
use crate::value::{SetValue, Value};

/// Primitive value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Bool,
    Int,
    Float,
}

impl ScalarKind {
    /// Name used in error messages
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Function that assigns a set element its hash code
pub type HashFn = fn(&Value) -> HashCode;

/// How set elements are keyed
#[derive(Clone, Copy)]
pub enum SetHasher {
    /// Hash of the element's canonical serialisation
    Content,
    /// Resource-specific hash function
    Custom { name: &'static str, func: HashFn },
}

impl fmt::Debug for SetHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => f.write_str("Content"),
            Self::Custom { name, .. } => f.debug_tuple("Custom").field(name).finish(),
        }
    }
}

impl PartialEq for SetHasher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Content, Self::Content) => true,
            (Self::Custom { name: a, .. }, Self::Custom { name: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// Shape of a field or of a collection element
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Scalar(ScalarKind),
    List(Box<Descriptor>),
    Set(Box<Descriptor>, SetHasher),
    Block(Block),
}

impl Descriptor {
    #[must_use]
    pub fn string() -> Self {
        Self::Scalar(ScalarKind::String)
    }

    #[must_use]
    pub fn bool() -> Self {
        Self::Scalar(ScalarKind::Bool)
    }

    #[must_use]
    pub fn int() -> Self {
        Self::Scalar(ScalarKind::Int)
    }

    #[must_use]
    pub fn float() -> Self {
        Self::Scalar(ScalarKind::Float)
    }

    /// Ordered, index-addressed collection
    #[must_use]
    pub fn list(elem: Descriptor) -> Self {
        Self::List(Box::new(elem))
    }

    /// Unordered collection keyed by content hash
    #[must_use]
    pub fn set(elem: Descriptor) -> Self {
        Self::Set(Box::new(elem), SetHasher::Content)
    }

    /// Unordered collection keyed by a custom hash function
    #[must_use]
    pub fn set_with(elem: Descriptor, name: &'static str, func: HashFn) -> Self {
        Self::Set(Box::new(elem), SetHasher::Custom { name, func })
    }

    /// Nested block of named attributes
    #[must_use]
    pub fn block(block: Block) -> Self {
        Self::Block(block)
    }

    /// Element descriptor of a list or set
    #[must_use]
    pub fn element(&self) -> Option<&Descriptor> {
        match self {
            Self::List(elem) | Self::Set(elem, _) => Some(elem),
            Self::Scalar(_) | Self::Block(_) => None,
        }
    }

    /// Short name used in error messages
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(kind) => kind.name(),
            Self::List(_) => "list",
            Self::Set(..) => "set",
            Self::Block(_) => "block",
        }
    }

    /// Value a reader substitutes when nothing is stored
    #[must_use]
    pub fn zero_value(&self) -> Value {
        match self {
            Self::Scalar(ScalarKind::String) => Value::String(String::new()),
            Self::Scalar(ScalarKind::Bool) => Value::Bool(false),
            Self::Scalar(ScalarKind::Int) => Value::Int(0),
            Self::Scalar(ScalarKind::Float) => Value::Float(0.0),
            Self::List(_) => Value::List(Vec::new()),
            Self::Set(..) => Value::Set(SetValue::new()),
            Self::Block(block) => Value::Record(
                block
                    .iter()
                    .map(|(name, attr)| (name.to_string(), attr.descriptor().zero_value()))
                    .collect(),
            ),
        }
    }
}

/// Whether a field must be present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// Always set by the user
    Required,
    /// May be absent
    Optional,
    /// Filled in by the provider; excluded from content hashes
    Computed,
}

/// Named field definition
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    descriptor: Descriptor,
    presence: Presence,
    max_items: Option<usize>,
}

impl Attribute {
    #[must_use]
    pub fn new(descriptor: Descriptor, presence: Presence) -> Self {
        Self {
            descriptor,
            presence,
            max_items: None,
        }
    }

    #[must_use]
    pub fn required(descriptor: Descriptor) -> Self {
        Self::new(descriptor, Presence::Required)
    }

    #[must_use]
    pub fn optional(descriptor: Descriptor) -> Self {
        Self::new(descriptor, Presence::Optional)
    }

    #[must_use]
    pub fn computed(descriptor: Descriptor) -> Self {
        Self::new(descriptor, Presence::Computed)
    }

    /// Limit the element count of a collection attribute
    #[inline]
    #[must_use]
    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    #[inline]
    #[must_use]
    pub fn presence(&self) -> Presence {
        self.presence
    }

    #[inline]
    #[must_use]
    pub fn max_items(&self) -> Option<usize> {
        self.max_items
    }

    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    /// Whether the attribute takes part in content hashing
    #[inline]
    #[must_use]
    pub fn is_user_supplied(&self) -> bool {
        matches!(self.presence, Presence::Required | Presence::Optional)
    }
}

/// Named attributes, kept in ascending name order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    attributes: BTreeMap<String, Attribute>,
}

impl Block {
    /// Create new empty block
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute, builder style
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Find the attribute that owns `path`
    ///
    /// Walks field names through nested blocks and skips the element
    /// address (index or hash code) that follows a list or set. Returns the
    /// owning attribute and the descriptor of the addressed value, which is
    /// the element descriptor when the path ends on an element.
    ///
    /// # Errors
    /// Returns [`CodecError::UnknownField`] if a name is not declared or the
    /// path descends into a scalar.
    pub fn resolve(&self, path: &FieldPath) -> CodecResult<(&Attribute, &Descriptor)> {
        let mut segments = path.iter();
        let first = segments.next().ok_or_else(|| CodecError::unknown_field(path))?;
        let mut attribute = self.get(first).ok_or_else(|| CodecError::unknown_field(path))?;
        let mut current = attribute.descriptor();

        for segment in segments {
            match current {
                // segment is the element address
                Descriptor::List(elem) | Descriptor::Set(elem, _) => current = elem,
                Descriptor::Block(block) => {
                    attribute = block
                        .get(segment)
                        .ok_or_else(|| CodecError::unknown_field(path))?;
                    current = attribute.descriptor();
                }
                Descriptor::Scalar(_) => return Err(CodecError::unknown_field(path)),
            }
        }

        Ok((attribute, current))
    }
}
