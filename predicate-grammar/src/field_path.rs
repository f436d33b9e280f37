use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Violation;

/// Dot-delimited path naming an attribute on a target entity.
///
/// The grammar treats the path as an opaque key: `metadata.tags.0` is just a
/// string here, and segment interpretation belongs to whoever evaluates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(String);

impl FieldPath {
    /// Accepts any non-empty string that does not start with the reserved `$`.
    pub fn parse(path: impl Into<String>) -> Result<Self, Violation> {
        let path = path.into();
        if path.is_empty() {
            return Err(Violation::EmptyFieldPath);
        }
        if path.starts_with('$') {
            return Err(Violation::UnknownKey(path));
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|segment| !segment.is_empty())
    }

    /// Walks the segments through `root`, indexing arrays by numeric segments.
    pub fn locate<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        locate_segments(root, self.segments())
    }
}

pub(crate) fn locate_segments<'a, 's>(
    root: &'a Value,
    segments: impl IntoIterator<Item = &'s str>,
) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(value) => current = value,
                None => return None,
            },
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                current = items.get(index)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FieldPath {
    type Error = Violation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FieldPath::parse(value)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = Violation;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        FieldPath::parse(value)
    }
}

impl From<FieldPath> for String {
    fn from(value: FieldPath) -> Self {
        value.0
    }
}
