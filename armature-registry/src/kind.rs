//! Capability kinds, registration keys and the component marker trait.

use crate::error::{RegistryError, Result};
use std::fmt;

/// The stage of a client pipeline a component belongs to.
///
/// Kinds are ordered by pipeline stage. A component may only depend on a
/// component of a strictly earlier kind, which keeps the dependency graph
/// acyclic without any runtime cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CapabilityKind {
    /// Credentials presented to the cluster.
    AuthenticationCredential,
    /// Node topology the transport draws connections from.
    ConnectionPool,
    /// Transport-level settings built on top of a pool.
    ConnectionConfiguration,
    /// A usable client, high-level or low-level.
    Client,
}

impl CapabilityKind {
    /// Every kind, in stage order.
    pub const ALL: [CapabilityKind; 4] = [
        CapabilityKind::AuthenticationCredential,
        CapabilityKind::ConnectionPool,
        CapabilityKind::ConnectionConfiguration,
        CapabilityKind::Client,
    ];

    /// Stable label used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::AuthenticationCredential => "authentication-credential",
            CapabilityKind::ConnectionPool => "connection-pool",
            CapabilityKind::ConnectionConfiguration => "connection-configuration",
            CapabilityKind::Client => "client",
        }
    }

    /// Whether a component of this kind may declare a dependency on `other`.
    pub fn may_depend_on(self, other: CapabilityKind) -> bool {
        other < self
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compound `(kind, name)` key identifying one registered component.
///
/// Names are case-sensitive and scoped per kind: a pool named `"search"`
/// and a client named `"search"` are distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    kind: CapabilityKind,
    name: String,
}

impl RegistryKey {
    /// Create a key, rejecting empty names.
    pub fn new(kind: CapabilityKind, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::InvalidName(kind));
        }
        Ok(Self { kind, name })
    }

    /// Key used for lookups only; lookups with an empty name simply miss.
    pub(crate) fn lookup(kind: CapabilityKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
        }
    }

    /// The kind half of the key.
    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// The name half of the key.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// A type that can be stored in a [`NamedRegistry`](crate::NamedRegistry).
///
/// Each component type belongs to exactly one [`CapabilityKind`].
///
/// ```
/// use armature_registry::{CapabilityKind, Component};
///
/// struct Credentials {
///     username: String,
/// }
///
/// impl Component for Credentials {
///     const KIND: CapabilityKind = CapabilityKind::AuthenticationCredential;
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// The pipeline stage this type is registered under.
    const KIND: CapabilityKind;
}
