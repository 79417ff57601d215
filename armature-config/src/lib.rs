// Configuration management for Armature framework

pub mod env;
pub mod error;
pub mod loader;
pub mod source;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use source::ConfigurationSource;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// Main configuration manager
///
/// Holds a nested JSON tree that sections are read from by path. Values
/// loaded later override earlier ones key by key; objects are merged
/// recursively, everything else is replaced.
#[derive(Clone)]
pub struct ConfigManager {
    root: Arc<RwLock<Value>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(Value::Object(Map::new()))),
            env_prefix: None,
        }
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: Some(prefix.into()),
            ..Self::new()
        }
    }

    /// Create from an existing JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(ConfigError::ParseError(
                "Configuration root must be an object".to_string(),
            ));
        }
        let manager = Self::new();
        *manager.root.write() = value;
        Ok(manager)
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        for (path, value) in loader.load() {
            self.set(&path, value)?;
        }
        Ok(())
    }

    /// Load configuration from .env file
    pub fn load_dotenv(&self, path: Option<&str>) -> Result<()> {
        if let Some(path) = path {
            dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        } else {
            dotenvy::dotenv().ok(); // Ignore if .env doesn't exist
        }
        self.load_env()
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let data = ConfigLoader::new(format).load_file(path)?;
        merge_into(&mut self.root.write(), data);
        Ok(())
    }

    /// Set a configuration value, creating intermediate sections
    ///
    /// Existing sections are reused when their key differs only in case, and
    /// numeric segments address array elements.
    pub fn set<T: serde::Serialize>(&self, path: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;
        let segments = source::segments(path)?;

        let mut root = self.root.write();
        let mut node = &mut *root;
        for segment in segments {
            node = source::child_mut(node, segment);
        }
        *node = json_value;

        Ok(())
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let root = self.root.read();
        let value = source::normalize_keys(source::lookup(&root, path)?.clone());

        T::deserialize(value).map_err(|e| ConfigError::DeserializationError {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Get a configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        self.get(path).unwrap_or(default)
    }

    /// Get a string value
    pub fn get_string(&self, path: &str) -> Result<String> {
        self.get(path)
    }

    /// Check if a section exists
    pub fn has(&self, path: &str) -> bool {
        let root = self.root.read();
        source::lookup(&root, path).is_ok()
    }

    /// Get the top-level section names
    pub fn keys(&self) -> Vec<String> {
        match &*self.root.read() {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Merge configuration from another manager
    pub fn merge(&self, other: &ConfigManager) {
        if Arc::ptr_eq(&self.root, &other.root) {
            return;
        }
        let incoming = other.root.read().clone();
        merge_into(&mut self.root.write(), incoming);
    }

    /// Copy of the whole configuration tree
    pub fn snapshot(&self) -> Value {
        self.root.read().clone()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("sections", &self.keys())
            .field("env_prefix", &self.env_prefix)
            .finish()
    }
}

impl ConfigurationSource for ConfigManager {
    fn get_value(&self, path: &str) -> Result<Value> {
        let root = self.root.read();
        source::lookup(&root, path).cloned()
    }
}

fn merge_into(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                let key = source::matching_key(existing, &key).unwrap_or(key);
                match existing.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let manager = ConfigManager::new();
        manager.set("search.username", "admin").unwrap();

        let value: String = manager.get("search.username").unwrap();
        assert_eq!(value, "admin");
        assert_eq!(manager.get_string("search:username").unwrap(), "admin");
    }

    #[test]
    fn test_set_overwrites_scalar_with_section() {
        let manager = ConfigManager::new();
        manager.set("search", "flat").unwrap();
        manager.set("search.username", "admin").unwrap();

        assert_eq!(manager.get_string("search.username").unwrap(), "admin");
    }

    #[test]
    fn test_get_or_default() {
        let manager = ConfigManager::new();

        let value: String = manager.get_or("missing_key", "default_value".to_string());
        assert_eq!(value, "default_value");
    }

    #[test]
    fn test_has_key() {
        let manager = ConfigManager::new();
        manager.set("existing.key", "value").unwrap();

        assert!(manager.has("existing"));
        assert!(manager.has("existing.key"));
        assert!(!manager.has("missing_key"));
    }

    #[test]
    fn test_from_value_requires_object() {
        assert!(ConfigManager::from_value(json!(["a"])).is_err());
        let manager = ConfigManager::from_value(json!({ "a": 1 })).unwrap();
        assert_eq!(manager.keys(), vec!["a".to_string()]);
    }

    #[test]
    fn test_merge_is_deep() {
        let base = ConfigManager::from_value(json!({
            "search": { "username": "admin", "password": "old" }
        }))
        .unwrap();
        let overlay = ConfigManager::from_value(json!({
            "search": { "password": "new" }
        }))
        .unwrap();

        base.merge(&overlay);

        assert_eq!(base.get_string("search.username").unwrap(), "admin");
        assert_eq!(base.get_string("search.password").unwrap(), "new");
    }

    #[test]
    fn test_merge_matches_keys_in_any_case() {
        let base = ConfigManager::from_value(json!({
            "OpenSearch": { "Uri": "http://file:9200", "Timeout": 30 }
        }))
        .unwrap();
        let overlay = ConfigManager::from_value(json!({
            "opensearch": { "uri": "http://override:9200" }
        }))
        .unwrap();

        base.merge(&overlay);

        assert_eq!(base.keys(), vec!["OpenSearch".to_string()]);
        assert_eq!(base.get_string("opensearch.uri").unwrap(), "http://override:9200");
        assert_eq!(base.get::<u64>("OpenSearch:Timeout").unwrap(), 30);
    }

    #[test]
    fn test_set_into_array_element() {
        let manager = ConfigManager::new();
        manager.set("uris", vec!["http://a:9200", "http://b:9200"]).unwrap();
        manager.set("uris.1", "http://c:9200").unwrap();

        assert_eq!(
            manager.get::<Vec<String>>("uris").unwrap(),
            vec!["http://a:9200", "http://c:9200"]
        );
    }

    #[test]
    fn test_get_children() {
        let manager = ConfigManager::from_value(json!({
            "uris": ["http://a:9200", "http://b:9200"]
        }))
        .unwrap();

        let children = manager.get_children("uris").unwrap();
        assert_eq!(children.len(), 2);
        assert!(matches!(
            manager.get_children("missing"),
            Err(ConfigError::KeyNotFound(_))
        ));
    }
}
