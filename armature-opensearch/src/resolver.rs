//! Per-kind resolution of named components.

use crate::{
    auth::AuthenticationCredential,
    client::{Client, ClientFlavor, LowLevelClient, OpenSearchClient},
    connection::ConnectionSettings,
    error::{OpenSearchError, Result},
    pool::ConnectionPool,
};
use armature_registry::NamedRegistry;
use std::sync::Arc;

/// Typed lookups of named OpenSearch components.
///
/// The per-kind methods are thin wrappers over
/// [`NamedRegistry::resolve`] and return registry errors unchanged, so they
/// can be used with `?` inside build functions.
pub trait OpenSearchResolver {
    /// Resolve a named authentication credential.
    fn resolve_authentication_credential(&self, name: &str) -> armature_registry::Result<Arc<AuthenticationCredential>>;

    /// Resolve a named connection pool.
    fn resolve_connection_pool(&self, name: &str) -> armature_registry::Result<Arc<ConnectionPool>>;

    /// Resolve named connection settings.
    fn resolve_connection_settings(&self, name: &str) -> armature_registry::Result<Arc<ConnectionSettings>>;

    /// Resolve a named client of either flavor.
    fn resolve_client(&self, name: &str) -> armature_registry::Result<Arc<Client>>;

    /// Resolve a named high-level client.
    fn resolve_high_level_client(&self, name: &str) -> Result<OpenSearchClient> {
        match &*self.resolve_client(name)? {
            Client::HighLevel(client) => Ok(client.clone()),
            other => Err(flavor_error(name, ClientFlavor::HighLevel, other)),
        }
    }

    /// Resolve a named low-level client.
    fn resolve_low_level_client(&self, name: &str) -> Result<LowLevelClient> {
        match &*self.resolve_client(name)? {
            Client::LowLevel(client) => Ok(client.clone()),
            other => Err(flavor_error(name, ClientFlavor::LowLevel, other)),
        }
    }
}

fn flavor_error(name: &str, expected: ClientFlavor, actual: &Client) -> OpenSearchError {
    OpenSearchError::ClientFlavor {
        name: name.to_string(),
        expected,
        actual: actual.flavor(),
    }
}

impl OpenSearchResolver for NamedRegistry {
    fn resolve_authentication_credential(&self, name: &str) -> armature_registry::Result<Arc<AuthenticationCredential>> {
        self.resolve(name)
    }

    fn resolve_connection_pool(&self, name: &str) -> armature_registry::Result<Arc<ConnectionPool>> {
        self.resolve(name)
    }

    fn resolve_connection_settings(&self, name: &str) -> armature_registry::Result<Arc<ConnectionSettings>> {
        self.resolve(name)
    }

    fn resolve_client(&self, name: &str) -> armature_registry::Result<Arc<Client>> {
        self.resolve(name)
    }
}
