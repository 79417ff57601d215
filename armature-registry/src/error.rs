//! Error types for registry operations.

use crate::kind::{CapabilityKind, RegistryKey};
use thiserror::Error;

/// Boxed error returned by build functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Registry error type.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Nothing is registered under the requested key.
    #[error("No {kind} registered under name '{name}'")]
    NotRegistered {
        /// Requested kind.
        kind: CapabilityKind,
        /// Requested name.
        name: String,
    },

    /// The build function for the key failed.
    #[error("Failed to construct {kind} '{name}': {source}")]
    ConstructionFailed {
        /// Kind of the component being built.
        kind: CapabilityKind,
        /// Name of the component being built.
        name: String,
        /// Error raised by the build function.
        #[source]
        source: BoxError,
    },

    /// Registration was attempted with an empty name.
    #[error("Invalid {0} name: names must not be empty")]
    InvalidName(CapabilityKind),

    /// The stored instance is not of the requested component type.
    #[error("{kind} '{name}' is not a {expected}")]
    TypeMismatch {
        /// Requested kind.
        kind: CapabilityKind,
        /// Requested name.
        name: String,
        /// Requested Rust type.
        expected: &'static str,
    },
}

impl RegistryError {
    /// Convert a build function failure into a registry error.
    ///
    /// A registry error raised while resolving a dependency is passed through
    /// untouched so callers see the key that actually failed.
    pub(crate) fn from_build(key: &RegistryKey, source: BoxError) -> Self {
        match source.downcast::<RegistryError>() {
            Ok(err) => *err,
            Err(source) => RegistryError::ConstructionFailed {
                kind: key.kind(),
                name: key.name().to_string(),
                source,
            },
        }
    }

    /// Whether this is a [`RegistryError::NotRegistered`].
    pub fn is_not_registered(&self) -> bool {
        matches!(self, RegistryError::NotRegistered { .. })
    }

    /// Whether this is a [`RegistryError::ConstructionFailed`].
    pub fn is_construction_failed(&self) -> bool {
        matches!(self, RegistryError::ConstructionFailed { .. })
    }

    /// The `(kind, name)` the error refers to, when it names one.
    pub fn key(&self) -> Option<(CapabilityKind, &str)> {
        match self {
            RegistryError::NotRegistered { kind, name }
            | RegistryError::ConstructionFailed { kind, name, .. }
            | RegistryError::TypeMismatch { kind, name, .. } => Some((*kind, name.as_str())),
            RegistryError::InvalidName(_) => None,
        }
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
