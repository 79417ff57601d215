//! Connection settings: transport configuration over a pool.

use crate::error::{OpenSearchError, Result};
use crate::pool::ConnectionPool;
use armature_registry::{CapabilityKind, Component};
use opensearch::http::Url;
use opensearch::http::transport::{SingleNodeConnectionPool, Transport, TransportBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Tunables applied when a transport is built from settings.
#[derive(Debug, Clone)]
pub struct ConnectionSettingsOptions {
    /// Request timeout.
    pub request_timeout: Duration,
    /// Ignore system proxy settings.
    pub disable_proxy: bool,
}

impl Default for ConnectionSettingsOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            disable_proxy: true,
        }
    }
}

impl ConnectionSettingsOptions {
    /// Set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Use or ignore system proxy settings.
    pub fn with_proxy(mut self, enabled: bool) -> Self {
        self.disable_proxy = !enabled;
        self
    }
}

/// Connection configuration shared by the clients built from it.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pool: Arc<ConnectionPool>,
    options: ConnectionSettingsOptions,
}

impl Component for ConnectionSettings {
    const KIND: CapabilityKind = CapabilityKind::ConnectionConfiguration;
}

impl ConnectionSettings {
    /// Settings over an existing pool.
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            options: ConnectionSettingsOptions::default(),
        }
    }

    /// Settings talking to a single node.
    pub fn single_node(url: Url) -> Self {
        Self::new(Arc::new(ConnectionPool::single_node(url)))
    }

    /// Replace the transport options.
    pub fn with_options(mut self, options: ConnectionSettingsOptions) -> Self {
        self.options = options;
        self
    }

    /// The pool nodes are drawn from.
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// The transport options.
    pub fn options(&self) -> &ConnectionSettingsOptions {
        &self.options
    }

    /// Build a transport against the node the pool selects.
    pub fn transport(&self) -> Result<Transport> {
        let node = self.pool.select_node().clone();
        debug!(node = node.as_str(), topology = self.pool.topology().as_str(), "Building OpenSearch transport");

        let mut builder = TransportBuilder::new(SingleNodeConnectionPool::new(node))
            .timeout(self.options.request_timeout);

        if self.options.disable_proxy {
            builder = builder.disable_proxy();
        }

        if let Some(credentials) = self.pool.credentials() {
            builder = builder.auth(credentials.to_transport_credentials());
        }

        builder
            .build()
            .map_err(|e| OpenSearchError::Connection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ConnectionSettingsOptions::default();
        assert_eq!(options.request_timeout, Duration::from_secs(30));
        assert!(options.disable_proxy);
        assert!(!options.with_proxy(true).disable_proxy);
    }

    #[test]
    fn test_single_node_settings() {
        let settings = ConnectionSettings::single_node(Url::parse("http://localhost:9200").unwrap())
            .with_options(ConnectionSettingsOptions::default().with_request_timeout(Duration::from_secs(5)));

        assert_eq!(settings.pool().nodes().len(), 1);
        assert_eq!(settings.options().request_timeout, Duration::from_secs(5));
        assert!(settings.transport().is_ok());
    }
}
