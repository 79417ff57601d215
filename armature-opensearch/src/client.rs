//! High-level and low-level OpenSearch clients.

use crate::{
    connection::ConnectionSettings,
    error::{OpenSearchError, Result},
};
use armature_registry::{CapabilityKind, Component};
use opensearch::{
    OpenSearch,
    http::{Method, headers::HeaderMap, request::JsonBody, transport::Transport},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// OpenSearch client for cluster operations.
#[derive(Clone)]
pub struct OpenSearchClient {
    client: Arc<OpenSearch>,
    settings: Arc<ConnectionSettings>,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client from connection settings.
    pub fn new(settings: Arc<ConnectionSettings>) -> Result<Self> {
        info!(nodes = ?settings.pool().nodes(), "Initializing OpenSearch client");

        let transport = settings.transport()?;
        let client = OpenSearch::new(transport);

        debug!("OpenSearch client initialized");

        Ok(Self {
            client: Arc::new(client),
            settings,
        })
    }

    /// Get the underlying OpenSearch client.
    pub fn inner(&self) -> &OpenSearch {
        &self.client
    }

    /// Get the connection settings.
    pub fn settings(&self) -> &Arc<ConnectionSettings> {
        &self.settings
    }

    /// Get cluster health.
    pub async fn health(&self) -> Result<Value> {
        let response = self
            .client
            .cluster()
            .health(opensearch::cluster::ClusterHealthParts::None)
            .send()
            .await?;

        Ok(response.json().await?)
    }

    /// Get cluster information.
    pub async fn info(&self) -> Result<Value> {
        let response = self.client.info().send().await?;
        Ok(response.json().await?)
    }

    /// Ping the cluster.
    pub async fn ping(&self) -> Result<bool> {
        let response = self.client.ping().send().await;
        Ok(response.is_ok_and(|r| r.status_code().is_success()))
    }
}

impl std::fmt::Debug for OpenSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchClient")
            .field("nodes", &self.settings.pool().nodes())
            .finish()
    }
}

/// Client sending raw requests over the transport.
#[derive(Clone)]
pub struct LowLevelClient {
    transport: Transport,
    settings: Arc<ConnectionSettings>,
}

impl LowLevelClient {
    /// Create a new low-level client from connection settings.
    pub fn new(settings: Arc<ConnectionSettings>) -> Result<Self> {
        info!(nodes = ?settings.pool().nodes(), "Initializing OpenSearch low-level client");

        Ok(Self {
            transport: settings.transport()?,
            settings,
        })
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Get the connection settings.
    pub fn settings(&self) -> &Arc<ConnectionSettings> {
        &self.settings
    }

    /// Send a request and return the JSON response body.
    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        debug!(path, "Sending low-level request");

        let response = self
            .transport
            .send(
                method,
                path,
                HeaderMap::new(),
                None::<&()>,
                body.map(JsonBody::<Value>::from),
                None,
            )
            .await?;

        let status = response.status_code();
        let body: Value = response.json().await?;

        if !status.is_success() {
            return Err(OpenSearchError::Internal(
                body.get("error")
                    .and_then(|e| e.get("reason"))
                    .and_then(|r| r.as_str())
                    .unwrap_or("Unknown error")
                    .to_string(),
            ));
        }

        Ok(body)
    }
}

impl std::fmt::Debug for LowLevelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LowLevelClient")
            .field("nodes", &self.settings.pool().nodes())
            .finish()
    }
}

/// Which client API a named client exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientFlavor {
    /// [`OpenSearchClient`].
    HighLevel,
    /// [`LowLevelClient`].
    LowLevel,
}

impl std::fmt::Display for ClientFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientFlavor::HighLevel => f.write_str("high-level"),
            ClientFlavor::LowLevel => f.write_str("low-level"),
        }
    }
}

/// A named client.
#[derive(Debug, Clone)]
pub enum Client {
    /// High-level client.
    HighLevel(OpenSearchClient),
    /// Low-level client.
    LowLevel(LowLevelClient),
}

impl Component for Client {
    const KIND: CapabilityKind = CapabilityKind::Client;
}

impl Client {
    /// The client flavor.
    pub fn flavor(&self) -> ClientFlavor {
        match self {
            Client::HighLevel(_) => ClientFlavor::HighLevel,
            Client::LowLevel(_) => ClientFlavor::LowLevel,
        }
    }

    /// The high-level client, if this is one.
    pub fn as_high_level(&self) -> Option<&OpenSearchClient> {
        match self {
            Client::HighLevel(client) => Some(client),
            Client::LowLevel(_) => None,
        }
    }

    /// The low-level client, if this is one.
    pub fn as_low_level(&self) -> Option<&LowLevelClient> {
        match self {
            Client::LowLevel(client) => Some(client),
            Client::HighLevel(_) => None,
        }
    }

    /// Connection settings the client was built from.
    pub fn settings(&self) -> &Arc<ConnectionSettings> {
        match self {
            Client::HighLevel(client) => client.settings(),
            Client::LowLevel(client) => client.settings(),
        }
    }
}
