//! Decoded values
//!
//! [`Value`] is the in-memory form of one field between a read and a write.

use std::collections::BTreeMap;

use crate::hash::HashCode;

/// Decoded field content
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<Value>),
    Set(SetValue),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Short name used in error messages
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Record(_) => "record",
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_set(&self) -> Option<&SetValue> {
        match self {
            Self::Set(set) => Some(set),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_record(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Field of a record, if this is a record and the field is set
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_record().and_then(|fields| fields.get(name))
    }

    /// Elements of a list or set, in enumeration order
    #[must_use]
    pub fn elements(&self) -> Option<Vec<&Value>> {
        match self {
            Self::List(items) => Some(items.iter().collect()),
            Self::Set(set) => Some(set.values().collect()),
            _ => None,
        }
    }

    /// Convenience constructor for a record
    #[must_use]
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// Unordered collection keyed by element hash code
///
/// Elements are enumerated in ascending order of their decimal code
/// strings, so `"2322037396"` comes before `"246297593"`. That is the order
/// a stored set has always been listed in, and migrations that turn a set
/// into a list rely on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetValue {
    elements: BTreeMap<String, Value>,
}

impl SetValue {
    /// Create new empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element under its code
    ///
    /// An element already stored under the same code is replaced and
    /// returned (last write wins).
    pub fn insert(&mut self, code: HashCode, value: Value) -> Option<Value> {
        self.elements.insert(code.to_string(), value)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Check whether an element is stored under `code`
    #[inline]
    #[must_use]
    pub fn contains_code(&self, code: HashCode) -> bool {
        self.elements.contains_key(&code.to_string())
    }

    /// `(code, element)` pairs in enumeration order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.elements.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Codes in enumeration order
    #[inline]
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// Elements in enumeration order
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.elements.values()
    }

    /// First element in enumeration order
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&Value> {
        self.elements.values().next()
    }

    /// Convert into an ordered sequence, keeping enumeration order
    #[must_use]
    pub fn into_list(self) -> Vec<Value> {
        self.elements.into_values().collect()
    }
}
