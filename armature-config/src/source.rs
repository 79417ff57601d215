// Section-path lookups over a JSON configuration tree

use crate::{ConfigError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Read-only access to configuration sections by path.
///
/// Paths are segments joined by `.` or `:` (`"opensearch.uris"` and
/// `"OpenSearch:Uris"` address the same section). Numeric segments index
/// into arrays.
pub trait ConfigurationSource: Send + Sync {
    /// The value at `path`.
    ///
    /// Fails with [`ConfigError::KeyNotFound`] if the section is absent.
    fn get_value(&self, path: &str) -> Result<Value>;

    /// The ordered children of the section at `path`.
    ///
    /// Arrays yield their elements. Objects yield their values, in numeric
    /// key order when every key is an index and key order otherwise.
    /// Scalars have no children.
    fn get_children(&self, path: &str) -> Result<Vec<Value>> {
        Ok(children_of(self.get_value(path)?))
    }
}

impl dyn ConfigurationSource {
    /// Deserialize the section at `path` into `T`.
    ///
    /// Object keys are lowercased first, so sections bind to lowercase field
    /// names whatever case the source used.
    pub fn bind<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = normalize_keys(self.get_value(path)?);
        serde_json::from_value(value).map_err(|e| ConfigError::DeserializationError {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Deserialize every child of the section at `path` into `T`.
    pub fn bind_children<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        self.get_children(path)?
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(normalize_keys(value)).map_err(|e| ConfigError::DeserializationError {
                    path: format!("{}.{}", path, index),
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

/// Split a section path into its segments.
pub(crate) fn segments(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split(['.', ':']).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

/// The key of `map` that `segment` addresses.
///
/// Keys match exactly first, then ignoring ASCII case.
pub(crate) fn matching_key(map: &Map<String, Value>, segment: &str) -> Option<String> {
    if map.contains_key(segment) {
        return Some(segment.to_string());
    }
    map.keys().find(|key| key.eq_ignore_ascii_case(segment)).cloned()
}

/// Find the child of `node` named `segment`.
pub(crate) fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => matching_key(map, segment).and_then(|key| map.get(&key)),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Find or create the child of `node` named `segment`.
///
/// Numeric segments index into arrays, growing them with nulls as needed.
/// Any other non-object node is replaced by an empty section.
pub(crate) fn child_mut<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    match (node, segment.parse::<usize>().ok()) {
        (Value::Array(items), Some(index)) => {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        (Value::Object(map), _) => {
            let key = matching_key(map, segment).unwrap_or_else(|| segment.to_string());
            map.entry(key).or_insert(Value::Null)
        }
        (other, _) => {
            *other = Value::Object(Map::new());
            child_mut(other, segment)
        }
    }
}

/// Lowercase every object key in `value`.
pub(crate) fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key.to_ascii_lowercase(), normalize_keys(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Walk `root` along `path`.
pub(crate) fn lookup<'a>(root: &'a Value, path: &str) -> Result<&'a Value> {
    segments(path)?
        .into_iter()
        .try_fold(root, |node, segment| child(node, segment))
        .ok_or_else(|| ConfigError::KeyNotFound(path.to_string()))
}

pub(crate) fn children_of(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            if entries.iter().all(|(key, _)| key.parse::<usize>().is_ok()) {
                entries.sort_by_key(|(key, _)| key.parse::<usize>().unwrap_or(usize::MAX));
            }
            entries.into_iter().map(|(_, value)| value).collect()
        }
        _ => Vec::new(),
    }
}
