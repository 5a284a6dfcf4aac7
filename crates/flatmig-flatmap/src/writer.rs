//! Flatmap encoding
//!
//! [`FlatmapWriter`] flattens [`Value`]s into a fresh [`AttributeMap`]
//! following a schema [`Block`]. Callers decide how the produced keys are
//! merged into persisted state.

use crate::attributes::AttributeMap;
use crate::error::{CodecError, CodecResult};
use crate::hash::keyed_elements;
use crate::path::FieldPath;
use crate::schema::{Attribute, Block, Descriptor, ScalarKind};
use crate::value::Value;

/// Writes fields into an owned attribute map
#[derive(Debug, Clone)]
pub struct FlatmapWriter<'a> {
    schema: &'a Block,
    map: AttributeMap,
}

impl<'a> FlatmapWriter<'a> {
    /// Create writer producing keys for `schema`
    #[inline]
    #[must_use]
    pub fn new(schema: &'a Block) -> Self {
        Self {
            schema,
            map: AttributeMap::new(),
        }
    }

    /// Write `value` as the field at `path`
    ///
    /// Anything previously written at or under `path` is cleared first.
    ///
    /// Lists are emitted as `path.#` plus `path.<i>` in sequence order.
    /// Sets are emitted as `path.#` plus `path.<code>`; when two elements
    /// share a code the later one wins and `path.#` counts what was
    /// actually written.
    ///
    /// # Errors
    /// - [`CodecError::UnknownField`] if the path or a record field is not
    ///   in the schema
    /// - [`CodecError::TypeMismatch`] if `value` does not fit the
    ///   descriptor
    pub fn write_field(&mut self, path: &FieldPath, value: &Value) -> CodecResult<()> {
        let schema = self.schema;
        let (_, descriptor) = schema.resolve(path)?;
        self.clear(path);
        self.write(descriptor, path, value)
    }

    /// Write `attribute` at an explicit `path`, skipping schema resolution
    ///
    /// # Errors
    /// Same as [`write_field`](Self::write_field).
    pub fn write_attribute(
        &mut self,
        attribute: &Attribute,
        path: &FieldPath,
        value: &Value,
    ) -> CodecResult<()> {
        self.clear(path);
        self.write(attribute.descriptor(), path, value)
    }

    /// Keys written so far
    #[inline]
    #[must_use]
    pub fn map(&self) -> &AttributeMap {
        &self.map
    }

    /// Consume the writer, returning the keys written
    #[inline]
    #[must_use]
    pub fn into_map(self) -> AttributeMap {
        self.map
    }

    fn clear(&mut self, path: &FieldPath) {
        self.map.remove(&path.to_string());
        self.map.remove_prefix(&path.prefix());
    }

    fn write(&mut self, descriptor: &Descriptor, path: &FieldPath, value: &Value) -> CodecResult<()> {
        match descriptor {
            Descriptor::Scalar(kind) => {
                let rendered = render_scalar(*kind, value, path)?;
                self.map.insert(path.to_string(), rendered);
            }
            Descriptor::List(elem) => {
                let items = value
                    .as_list()
                    .ok_or_else(|| CodecError::type_mismatch(path, "list", value.type_name()))?;
                self.map.insert(path.count_key(), items.len().to_string());
                for (i, item) in items.iter().enumerate() {
                    self.write(elem, &path.index(i), item)?;
                }
            }
            Descriptor::Set(elem, hasher) => {
                let (keyed, replaced) = keyed_elements(elem, *hasher, value, path)?;
                if replaced > 0 {
                    tracing::warn!(
                        path = %path,
                        replaced,
                        "set elements share a hash code; later elements overwrite earlier ones"
                    );
                }
                self.map.insert(path.count_key(), keyed.len().to_string());
                for (code, item) in keyed {
                    self.write(elem, &path.child(code), item)?;
                }
            }
            Descriptor::Block(block) => {
                let fields = value
                    .as_record()
                    .ok_or_else(|| CodecError::type_mismatch(path, "record", value.type_name()))?;
                for (name, field) in fields {
                    let child = path.child(name);
                    let attribute = block
                        .get(name)
                        .ok_or_else(|| CodecError::unknown_field(&child))?;
                    self.write(attribute.descriptor(), &child, field)?;
                }
            }
        }
        Ok(())
    }
}

fn render_scalar(kind: ScalarKind, value: &Value, path: &FieldPath) -> CodecResult<String> {
    match (kind, value) {
        (ScalarKind::String, Value::String(s)) => Ok(s.clone()),
        (ScalarKind::Bool, Value::Bool(b)) => Ok(b.to_string()),
        (ScalarKind::Int, Value::Int(i)) => Ok(i.to_string()),
        (ScalarKind::Float, Value::Float(x)) => Ok(x.to_string()),
        _ => Err(CodecError::type_mismatch(path, kind.name(), value.type_name())),
    }
}

/// Encode one attribute at `path` into a fresh partial map
///
/// # Errors
/// Same as [`FlatmapWriter::write_field`].
pub fn encode(attribute: &Attribute, path: &FieldPath, value: &Value) -> CodecResult<AttributeMap> {
    let unscoped = Block::new();
    let mut writer = FlatmapWriter::new(&unscoped);
    writer.write_attribute(attribute, path, value)?;
    Ok(writer.into_map())
}
