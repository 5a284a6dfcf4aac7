//! Field paths for addressing values inside a flatmap
//!
//! Provides [`FieldPath`], the dotted address of a field, a collection
//! element, or a collection's count marker.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Segment that holds the element count of a list or set
pub const COUNT_SEGMENT: &str = "#";

/// Path within a flattened attribute map
///
/// Field names, list indices and set hash codes are all plain segments;
/// the rendered form joins them with `.`.
///
/// # Examples
/// - `["cache_behavior"]` → `cache_behavior`
/// - `["cache_behavior", "0", "path_pattern"]` → `cache_behavior.0.path_pattern`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Create path from a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Append a list index segment
    #[inline]
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.child(index.to_string())
    }

    /// Key holding the element count of the collection at this path
    #[inline]
    #[must_use]
    pub fn count_key(&self) -> String {
        self.child(COUNT_SEGMENT).to_string()
    }

    /// Key prefix shared by everything stored beneath this path
    ///
    /// The trailing dot keeps `cache_behavior` from matching
    /// `cache_behavior_extra`.
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("{self}.")
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

/// Errors related to field paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),
}
