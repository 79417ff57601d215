// Environment variable loading

use crate::{ConfigError, Result};
use std::env;

/// Separator between nested section names in variable names.
pub const SECTION_SEPARATOR: &str = "__";

/// Environment variable loader
///
/// Variables map onto section paths by splitting on `__`:
/// `APP__OPENSEARCH__URIS__0` with prefix `APP` becomes `opensearch.uris.0`.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching environment variables as `(path, value)` pairs
    pub fn load(&self) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = env::vars()
            .filter_map(|(key, value)| self.section_path(&key).map(|path| (path, value)))
            .collect();
        vars.sort();
        vars
    }

    /// Section path for a variable name, if it belongs to this loader
    pub fn section_path(&self, key: &str) -> Option<String> {
        let rest = match &self.prefix {
            Some(prefix) => {
                let rest = key.strip_prefix(prefix.as_str())?;
                if !rest.starts_with('_') {
                    return None;
                }
                rest.trim_start_matches('_')
            }
            None => key,
        };

        let segments: Vec<String> = rest
            .split(SECTION_SEPARATOR)
            .map(|s| s.to_lowercase())
            .collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(segments.join("."))
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = if let Some(ref prefix) = self.prefix {
            format!("{}_{}", prefix, key.to_uppercase())
        } else {
            key.to_uppercase()
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_path_with_prefix() {
        let loader = EnvLoader::new(Some("APP".to_string()));

        assert_eq!(
            loader.section_path("APP__OPENSEARCH__URIS__0").as_deref(),
            Some("opensearch.uris.0")
        );
        assert_eq!(
            loader.section_path("APP_SEARCH__USERNAME").as_deref(),
            Some("search.username")
        );
        assert_eq!(loader.section_path("OTHER__KEY"), None);
        assert_eq!(loader.section_path("APPLE__KEY"), None);
    }

    #[test]
    fn test_section_path_rejects_empty_segments() {
        let loader = EnvLoader::new(None);
        assert_eq!(loader.section_path("A____B"), None);
        assert_eq!(loader.section_path("A__"), None);
    }

    #[test]
    fn test_env_loader_with_default() {
        let loader = EnvLoader::new(None);
        let value = loader.load_var_or("NONEXISTENT_VAR_12345", "default");

        assert_eq!(value, "default");
    }

    #[test]
    fn test_env_loader_missing_var() {
        let loader = EnvLoader::new(Some("ARMATURE_TEST".to_string()));
        let result = loader.load_var("MISSING_VAR_67890");

        assert!(result.is_err());
    }
}
