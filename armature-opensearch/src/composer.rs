//! Declarative registration of named OpenSearch pipelines.

use crate::{
    auth::{ApiKeyAuthenticationOptions, AuthenticationCredential, BasicAuthenticationOptions},
    client::{Client, LowLevelClient, OpenSearchClient},
    connection::{ConnectionSettings, ConnectionSettingsOptions},
    error::{OpenSearchError, Result},
    pool::{ConnectionPool, NodeScorer, PoolTopology, parse_url},
    resolver::OpenSearchResolver,
};
use armature_config::ConfigurationSource;
use armature_registry::{BoxError, Component, NamedRegistry};
use opensearch::http::Url;
use std::sync::Arc;
use tracing::debug;

/// Node list and credentials for a connection pool registration.
#[derive(Debug, Clone)]
pub struct ConnectionPoolOptions {
    topology: PoolTopology,
    nodes: Vec<Url>,
    credentials: Option<String>,
}

impl ConnectionPoolOptions {
    fn new(topology: PoolTopology, nodes: impl IntoIterator<Item = Url>) -> Self {
        Self {
            topology,
            nodes: nodes.into_iter().collect(),
            credentials: None,
        }
    }

    /// One fixed node.
    pub fn single_node(url: Url) -> Self {
        Self::new(PoolTopology::SingleNode, [url])
    }

    /// Fixed node list, round-robin.
    pub fn static_nodes(urls: impl IntoIterator<Item = Url>) -> Self {
        Self::new(PoolTopology::Static, urls)
    }

    /// Reseedable node list, round-robin.
    pub fn sniffing(urls: impl IntoIterator<Item = Url>) -> Self {
        Self::new(PoolTopology::Sniffing, urls)
    }

    /// Fixed node list, first node preferred.
    pub fn sticky(urls: impl IntoIterator<Item = Url>) -> Self {
        Self::new(PoolTopology::Sticky, urls)
    }

    /// Reseedable node list, best scored node preferred.
    pub fn sticky_sniffing(urls: impl IntoIterator<Item = Url>, scorer: NodeScorer) -> Self {
        Self::new(PoolTopology::StickySniffing(scorer), urls)
    }

    /// Authenticate with the credential registered under `name`.
    pub fn with_credentials(mut self, name: impl Into<String>) -> Self {
        self.credentials = Some(name.into());
        self
    }
}

fn build_pool(registry: &NamedRegistry, topology: PoolTopology, nodes: Vec<Url>, credentials: Option<&str>) -> std::result::Result<ConnectionPool, BoxError> {
    let pool = ConnectionPool::new(topology, nodes)?;
    Ok(match credentials {
        Some(name) => pool.with_credentials(registry.resolve_authentication_credential(name)?),
        None => pool,
    })
}

/// Composition root for named OpenSearch components.
///
/// Every `add_*` method registers a factory in the underlying
/// [`NamedRegistry`]; nothing is built, and no configuration is read, until
/// the component is resolved. Components may reference components of an
/// earlier stage by name: credentials, then pools, then connection settings,
/// then clients.
///
/// ```rust
/// use armature_opensearch::{BasicAuthenticationOptions, OpenSearchComposer, OpenSearchResolver, Url};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = OpenSearchComposer::new()
///     .add_basic_authentication("admin", BasicAuthenticationOptions::new("admin", "admin"))?
///     .add_static_connection_pool_with_credentials(
///         "cluster",
///         [Url::parse("http://node-1:9200")?, Url::parse("http://node-2:9200")?],
///         "admin",
///     )?
///     .add_connection_settings_from_pool("search", "cluster")?
///     .add_client_from_settings("search", "search")?
///     .build();
///
/// let client = registry.resolve_high_level_client("search")?;
/// assert_eq!(client.settings().pool().nodes().len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct OpenSearchComposer {
    registry: NamedRegistry,
    config: Option<Arc<dyn ConfigurationSource>>,
}

impl OpenSearchComposer {
    /// Compose into a fresh registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose into an existing registry.
    pub fn with_registry(registry: NamedRegistry) -> Self {
        Self {
            registry,
            config: None,
        }
    }

    /// Attach the configuration source read by `*_from_config` registrations.
    pub fn with_configuration(mut self, config: Arc<dyn ConfigurationSource>) -> Self {
        self.config = Some(config);
        self
    }

    /// The registry being composed.
    pub fn registry(&self) -> &NamedRegistry {
        &self.registry
    }

    /// Finish composition and hand back the registry.
    pub fn build(self) -> NamedRegistry {
        self.registry
    }

    fn register<T, F>(self, name: &str, build: F) -> Result<Self>
    where
        T: Component,
        F: Fn(&NamedRegistry) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        self.registry.register(name, build)?;
        let kind = T::KIND;
        debug!(kind = %kind, name, "Registered OpenSearch component");
        Ok(self)
    }

    fn config(&self) -> Result<Arc<dyn ConfigurationSource>> {
        self.config.clone().ok_or_else(|| {
            OpenSearchError::Validation("No configuration source attached to the composer".to_string())
        })
    }

    // =========================================================================
    // Authentication credentials
    // =========================================================================

    /// Register basic authentication credentials.
    pub fn add_basic_authentication(self, name: &str, options: BasicAuthenticationOptions) -> Result<Self> {
        self.register(name, move |_| Ok(AuthenticationCredential::basic(&options)?))
    }

    /// Register basic authentication credentials built by `configure`.
    ///
    /// `configure` runs when the credential is first resolved.
    pub fn add_basic_authentication_with<F>(self, name: &str, configure: F) -> Result<Self>
    where
        F: Fn(&mut BasicAuthenticationOptions) + Send + Sync + 'static,
    {
        self.register(name, move |_| {
            let mut options = BasicAuthenticationOptions::default();
            configure(&mut options);
            Ok(AuthenticationCredential::basic(&options)?)
        })
    }

    /// Register basic authentication credentials bound from a configuration section.
    pub fn add_basic_authentication_from_config(self, name: &str, section: &str) -> Result<Self> {
        let config = self.config()?;
        let section = section.to_string();
        self.register(name, move |_| {
            let options: BasicAuthenticationOptions = config.bind(&section)?;
            Ok(AuthenticationCredential::basic(&options)?)
        })
    }

    /// Register API key credentials.
    pub fn add_api_key_authentication(self, name: &str, options: ApiKeyAuthenticationOptions) -> Result<Self> {
        self.register(name, move |_| Ok(AuthenticationCredential::api_key(&options)?))
    }

    /// Register API key credentials built by `configure`.
    ///
    /// `configure` runs when the credential is first resolved.
    pub fn add_api_key_authentication_with<F>(self, name: &str, configure: F) -> Result<Self>
    where
        F: Fn(&mut ApiKeyAuthenticationOptions) + Send + Sync + 'static,
    {
        self.register(name, move |_| {
            let mut options = ApiKeyAuthenticationOptions::default();
            configure(&mut options);
            Ok(AuthenticationCredential::api_key(&options)?)
        })
    }

    /// Register API key credentials bound from a configuration section.
    pub fn add_api_key_authentication_from_config(self, name: &str, section: &str) -> Result<Self> {
        let config = self.config()?;
        let section = section.to_string();
        self.register(name, move |_| {
            let options: ApiKeyAuthenticationOptions = config.bind(&section)?;
            Ok(AuthenticationCredential::api_key(&options)?)
        })
    }

    // =========================================================================
    // Connection pools
    // =========================================================================

    /// Register a connection pool.
    pub fn add_connection_pool(self, name: &str, options: ConnectionPoolOptions) -> Result<Self> {
        let ConnectionPoolOptions {
            topology,
            nodes,
            credentials,
        } = options;

        self.register(name, move |registry| {
            build_pool(registry, topology.clone(), nodes.clone(), credentials.as_deref())
        })
    }

    /// Register a pool whose nodes come from a configuration section.
    ///
    /// Single-node pools read one URL from the section; other topologies
    /// read a list of URLs from its children.
    fn add_connection_pool_from_config(
        self,
        name: &str,
        section: &str,
        topology: PoolTopology,
    ) -> Result<Self> {
        let config = self.config()?;
        let section = section.to_string();

        self.register(name, move |registry| {
            let nodes = match &topology {
                PoolTopology::SingleNode => vec![parse_url(&config.bind::<String>(&section)?)?],
                _ => config
                    .bind_children::<String>(&section)?
                    .iter()
                    .map(|url| parse_url(url))
                    .collect::<Result<Vec<_>>>()?,
            };
            build_pool(registry, topology.clone(), nodes, None)
        })
    }

    /// Register a single-node pool.
    pub fn add_single_node_connection_pool(self, name: &str, url: Url) -> Result<Self> {
        self.add_connection_pool(name, ConnectionPoolOptions::single_node(url))
    }

    /// Register a single-node pool whose URL is read from `section`.
    pub fn add_single_node_connection_pool_from_config(self, name: &str, section: &str) -> Result<Self> {
        self.add_connection_pool_from_config(name, section, PoolTopology::SingleNode)
    }

    /// Register a static pool.
    pub fn add_static_connection_pool(self, name: &str, urls: impl IntoIterator<Item = Url>) -> Result<Self> {
        self.add_connection_pool(name, ConnectionPoolOptions::static_nodes(urls))
    }

    /// Register a static pool authenticated with the credential named `credentials`.
    pub fn add_static_connection_pool_with_credentials(
        self,
        name: &str,
        urls: impl IntoIterator<Item = Url>,
        credentials: &str,
    ) -> Result<Self> {
        self.add_connection_pool(
            name,
            ConnectionPoolOptions::static_nodes(urls).with_credentials(credentials),
        )
    }

    /// Register a static pool whose URLs are read from `section`.
    pub fn add_static_connection_pool_from_config(self, name: &str, section: &str) -> Result<Self> {
        self.add_connection_pool_from_config(name, section, PoolTopology::Static)
    }

    /// Register a sniffing pool.
    pub fn add_sniffing_connection_pool(self, name: &str, urls: impl IntoIterator<Item = Url>) -> Result<Self> {
        self.add_connection_pool(name, ConnectionPoolOptions::sniffing(urls))
    }

    /// Register a sniffing pool whose URLs are read from `section`.
    pub fn add_sniffing_connection_pool_from_config(self, name: &str, section: &str) -> Result<Self> {
        self.add_connection_pool_from_config(name, section, PoolTopology::Sniffing)
    }

    /// Register a sticky pool.
    pub fn add_sticky_connection_pool(self, name: &str, urls: impl IntoIterator<Item = Url>) -> Result<Self> {
        self.add_connection_pool(name, ConnectionPoolOptions::sticky(urls))
    }

    /// Register a sticky pool whose URLs are read from `section`.
    pub fn add_sticky_connection_pool_from_config(self, name: &str, section: &str) -> Result<Self> {
        self.add_connection_pool_from_config(name, section, PoolTopology::Sticky)
    }

    /// Register a sticky sniffing pool.
    pub fn add_sticky_sniffing_connection_pool(
        self,
        name: &str,
        urls: impl IntoIterator<Item = Url>,
        scorer: NodeScorer,
    ) -> Result<Self> {
        self.add_connection_pool(name, ConnectionPoolOptions::sticky_sniffing(urls, scorer))
    }

    /// Register a sticky sniffing pool whose URLs are read from `section`.
    pub fn add_sticky_sniffing_connection_pool_from_config(
        self,
        name: &str,
        section: &str,
        scorer: NodeScorer,
    ) -> Result<Self> {
        self.add_connection_pool_from_config(name, section, PoolTopology::StickySniffing(scorer))
    }

    /// Register a cloud pool authenticated with the credential named `credentials`.
    pub fn add_cloud_connection_pool(self, name: &str, cloud_id: &str, credentials: &str) -> Result<Self> {
        let cloud_id = cloud_id.to_string();
        let credentials = credentials.to_string();
        self.register(name, move |registry| {
            let credential = registry.resolve_authentication_credential(&credentials)?;
            Ok(ConnectionPool::cloud(&cloud_id, credential)?)
        })
    }

    /// Register basic credentials and a cloud pool using them, both under `name`.
    pub fn add_cloud_connection_pool_with_basic_auth(
        self,
        name: &str,
        cloud_id: &str,
        options: BasicAuthenticationOptions,
    ) -> Result<Self> {
        self.add_basic_authentication(name, options)?
            .add_cloud_connection_pool(name, cloud_id, name)
    }

    /// Register API key credentials and a cloud pool using them, both under `name`.
    pub fn add_cloud_connection_pool_with_api_key(
        self,
        name: &str,
        cloud_id: &str,
        options: ApiKeyAuthenticationOptions,
    ) -> Result<Self> {
        self.add_api_key_authentication(name, options)?
            .add_cloud_connection_pool(name, cloud_id, name)
    }

    // =========================================================================
    // Connection settings
    // =========================================================================

    /// Register settings talking directly to `url`.
    pub fn add_connection_settings(self, name: &str, url: Url) -> Result<Self> {
        self.register(name, move |_| Ok(ConnectionSettings::single_node(url.clone())))
    }

    /// Register settings over the pool named `pool`.
    pub fn add_connection_settings_from_pool(self, name: &str, pool: &str) -> Result<Self> {
        self.add_connection_settings_from_pool_with(name, pool, ConnectionSettingsOptions::default())
    }

    /// Register settings over the pool named `pool` with explicit transport options.
    pub fn add_connection_settings_from_pool_with(
        self,
        name: &str,
        pool: &str,
        options: ConnectionSettingsOptions,
    ) -> Result<Self> {
        let pool = pool.to_string();
        self.register(name, move |registry| {
            let pool = registry.resolve_connection_pool(&pool)?;
            Ok(ConnectionSettings::new(pool).with_options(options.clone()))
        })
    }

    /// Register settings talking to the URL read from `section`.
    pub fn add_connection_settings_from_config(self, name: &str, section: &str) -> Result<Self> {
        let config = self.config()?;
        let section = section.to_string();
        self.register(name, move |_| {
            let url = parse_url(&config.bind::<String>(&section)?)?;
            Ok(ConnectionSettings::single_node(url))
        })
    }

    // =========================================================================
    // Clients
    // =========================================================================

    /// Register settings and a high-level client for `url`, both under `name`.
    pub fn add_client(self, name: &str, url: Url) -> Result<Self> {
        self.add_connection_settings(name, url)?
            .add_client_from_settings(name, name)
    }

    /// Register a high-level client over the settings named `settings`.
    pub fn add_client_from_settings(self, name: &str, settings: &str) -> Result<Self> {
        let settings = settings.to_string();
        self.register(name, move |registry| {
            let settings = registry.resolve_connection_settings(&settings)?;
            Ok(Client::HighLevel(OpenSearchClient::new(settings)?))
        })
    }

    /// Register a low-level client over the settings named `settings`.
    pub fn add_low_level_client(self, name: &str, settings: &str) -> Result<Self> {
        let settings = settings.to_string();
        self.register(name, move |registry| {
            let settings = registry.resolve_connection_settings(&settings)?;
            Ok(Client::LowLevel(LowLevelClient::new(settings)?))
        })
    }
}

impl std::fmt::Debug for OpenSearchComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchComposer")
            .field("registry", &self.registry)
            .field("has_configuration", &self.config.is_some())
            .finish()
    }
}
