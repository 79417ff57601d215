//! Named OpenSearch client pipelines for the Armature framework.
//!
//! This crate registers OpenSearch components in an
//! [`armature_registry::NamedRegistry`] under string names:
//! - Authentication credentials (basic or API key)
//! - Connection pools (single node, static, sniffing, sticky, sticky sniffing, cloud)
//! - Connection settings over a pool
//! - High-level and low-level clients over settings
//!
//! Each stage may reference a component of an earlier stage by name.
//! Components are built on first resolution and shared afterwards.
//!
//! # Example
//!
//! ```rust,no_run
//! use armature_config::{ConfigManager, ConfigurationSource};
//! use armature_opensearch::{OpenSearchComposer, OpenSearchResolver};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigManager::new();
//!     config.set("opensearch.auth.username", "admin")?;
//!     config.set("opensearch.auth.password", "admin")?;
//!     config.set("opensearch.nodes", vec!["http://localhost:9200"])?;
//!
//!     let source: Arc<dyn ConfigurationSource> = Arc::new(config);
//!     let registry = OpenSearchComposer::new()
//!         .with_configuration(source)
//!         .add_basic_authentication_from_config("admin", "opensearch.auth")?
//!         .add_static_connection_pool_from_config("cluster", "opensearch.nodes")?
//!         .add_connection_settings_from_pool("search", "cluster")?
//!         .add_client_from_settings("search", "search")?
//!         .build();
//!
//!     let client = registry.resolve_high_level_client("search")?;
//!     let info = client.info().await?;
//!     println!("{}", info);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod auth;
mod client;
mod composer;
mod connection;
mod error;
mod pool;
mod resolver;

pub use auth::{ApiKeyAuthenticationOptions, AuthenticationCredential, BasicAuthenticationOptions};
pub use client::{Client, ClientFlavor, LowLevelClient, OpenSearchClient};
pub use composer::{ConnectionPoolOptions, OpenSearchComposer};
pub use connection::{ConnectionSettings, ConnectionSettingsOptions};
pub use error::{OpenSearchError, Result};
pub use pool::{ConnectionPool, NodeScorer, PoolTopology};
pub use resolver::OpenSearchResolver;

pub use opensearch::http::{Method, Url};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        Client, ConnectionPoolOptions, OpenSearchClient, OpenSearchComposer, OpenSearchError,
        OpenSearchResolver, Url,
    };
    pub use armature_registry::{CapabilityKind, NamedRegistry, RegistryError};
}
