//! Error types for OpenSearch client composition.

use armature_config::ConfigError;
use armature_registry::RegistryError;
use thiserror::Error;

/// OpenSearch error type.
#[derive(Error, Debug)]
pub enum OpenSearchError {
    /// Invalid literal options (URLs, cloud ids, credentials).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Reading an external configuration section failed.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Building the transport failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Registering or resolving a named component failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The named client exists but is the other flavor.
    #[error("Client '{name}' is a {actual} client, not a {expected} client")]
    ClientFlavor {
        /// Client name.
        name: String,
        /// Requested flavor.
        expected: crate::client::ClientFlavor,
        /// Registered flavor.
        actual: crate::client::ClientFlavor,
    },

    /// The cluster answered with an error.
    #[error("OpenSearch error: {0}")]
    Internal(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client error from opensearch crate.
    #[error("Client error: {0}")]
    Client(#[from] opensearch::Error),
}

/// Result type alias for OpenSearch operations.
pub type Result<T> = std::result::Result<T, OpenSearchError>;
