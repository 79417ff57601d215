//! Connection pool topologies.

use crate::auth::AuthenticationCredential;
use crate::error::{OpenSearchError, Result};
use armature_registry::{CapabilityKind, Component};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use opensearch::http::Url;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scores a node for sticky sniffing pools; the highest score wins.
pub type NodeScorer = Arc<dyn Fn(&Url) -> f32 + Send + Sync>;

/// How a pool picks the node a transport talks to.
#[derive(Clone)]
pub enum PoolTopology {
    /// One fixed node.
    SingleNode,
    /// Fixed node list, round-robin.
    Static,
    /// Seed node list that may be reseeded from the cluster, round-robin.
    Sniffing,
    /// Fixed node list, always the first node.
    Sticky,
    /// Seed node list, always the best scored node.
    StickySniffing(NodeScorer),
    /// Managed cloud deployment resolved from a cloud id.
    Cloud {
        /// The cloud id the node was derived from.
        cloud_id: String,
    },
}

impl PoolTopology {
    /// Short name of the topology.
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolTopology::SingleNode => "single-node",
            PoolTopology::Static => "static",
            PoolTopology::Sniffing => "sniffing",
            PoolTopology::Sticky => "sticky",
            PoolTopology::StickySniffing(_) => "sticky-sniffing",
            PoolTopology::Cloud { .. } => "cloud",
        }
    }
}

impl std::fmt::Debug for PoolTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolTopology::Cloud { cloud_id } => f.debug_struct("Cloud").field("cloud_id", cloud_id).finish(),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A node topology plus the credentials used against it.
pub struct ConnectionPool {
    topology: PoolTopology,
    nodes: Vec<Url>,
    credentials: Option<Arc<AuthenticationCredential>>,
    cursor: AtomicUsize,
}

impl Component for ConnectionPool {
    const KIND: CapabilityKind = CapabilityKind::ConnectionPool;
}

impl ConnectionPool {
    /// Create a pool over `nodes`.
    ///
    /// At least one node is required, and single-node pools take exactly one.
    pub fn new(topology: PoolTopology, nodes: Vec<Url>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(OpenSearchError::Validation(format!(
                "A {} connection pool needs at least one node",
                topology.as_str()
            )));
        }
        if matches!(topology, PoolTopology::SingleNode) && nodes.len() > 1 {
            return Err(OpenSearchError::Validation(format!(
                "A single-node connection pool takes one node, got {}",
                nodes.len()
            )));
        }

        Ok(Self {
            topology,
            nodes,
            credentials: None,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Single-node pool.
    pub fn single_node(url: Url) -> Self {
        Self {
            topology: PoolTopology::SingleNode,
            nodes: vec![url],
            credentials: None,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Cloud pool for a cloud id of the form `label:base64(domain$uuid[$...])`.
    pub fn cloud(cloud_id: &str, credentials: Arc<AuthenticationCredential>) -> Result<Self> {
        let url = parse_cloud_id(cloud_id)?;
        Ok(Self::new(
            PoolTopology::Cloud {
                cloud_id: cloud_id.to_string(),
            },
            vec![url],
        )?
        .with_credentials(credentials))
    }

    /// Attach credentials.
    pub fn with_credentials(mut self, credentials: Arc<AuthenticationCredential>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// The pool topology.
    pub fn topology(&self) -> &PoolTopology {
        &self.topology
    }

    /// The configured nodes, in order.
    pub fn nodes(&self) -> &[Url] {
        &self.nodes
    }

    /// Credentials used for every node, if any.
    pub fn credentials(&self) -> Option<&Arc<AuthenticationCredential>> {
        self.credentials.as_ref()
    }

    /// Whether the node list can be refreshed from the cluster.
    pub fn supports_reseeding(&self) -> bool {
        matches!(
            self.topology,
            PoolTopology::Sniffing | PoolTopology::StickySniffing(_)
        )
    }

    /// Pick the node for the next transport.
    pub fn select_node(&self) -> &Url {
        match &self.topology {
            PoolTopology::Static | PoolTopology::Sniffing => {
                let i = self.cursor.fetch_add(1, Ordering::Relaxed);
                &self.nodes[i % self.nodes.len()]
            }
            PoolTopology::StickySniffing(scorer) => {
                let mut best = &self.nodes[0];
                let mut best_score = scorer(best);
                for node in &self.nodes[1..] {
                    let score = scorer(node);
                    if score > best_score {
                        best = node;
                        best_score = score;
                    }
                }
                best
            }
            PoolTopology::SingleNode | PoolTopology::Sticky | PoolTopology::Cloud { .. } => &self.nodes[0],
        }
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("topology", &self.topology)
            .field("nodes", &self.nodes.iter().map(Url::as_str).collect::<Vec<_>>())
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Parse a URL, reporting which option it came from.
pub(crate) fn parse_url(value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| OpenSearchError::Validation(format!("Invalid URL '{}': {}", value, e)))
}

fn parse_cloud_id(cloud_id: &str) -> Result<Url> {
    let invalid = |reason: &str| OpenSearchError::Validation(format!("Invalid cloud id: {}", reason));

    let (_, encoded) = cloud_id
        .split_once(':')
        .ok_or_else(|| invalid("expected '<label>:<base64 data>'"))?;

    let decoded = STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| invalid("data is not valid base64"))?;

    let mut parts = decoded.split('$');
    let domain = parts.next().filter(|p| !p.is_empty());
    let uuid = parts.next().filter(|p| !p.is_empty());

    match (domain, uuid) {
        (Some(domain), Some(uuid)) => parse_url(&format!("https://{}.{}", uuid, domain)),
        _ => Err(invalid("expected '<domain>$<uuid>' in the decoded data")),
    }
}
