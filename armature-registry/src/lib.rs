//! Named component registry for the Armature framework.
//!
//! This crate provides the composition substrate used by Armature client
//! integrations to register several independently configured instances of
//! the same pipeline, each under its own name:
//! - Closed set of pipeline stages ([`CapabilityKind`])
//! - Deferred factories keyed by `(kind, name)`
//! - Single-flight, memoized construction on first resolution
//! - Pull-based transitive dependency resolution between stages
//!
//! # Example
//!
//! ```rust
//! use armature_registry::{CapabilityKind, Component, NamedRegistry};
//!
//! struct Credentials {
//!     username: String,
//! }
//!
//! impl Component for Credentials {
//!     const KIND: CapabilityKind = CapabilityKind::AuthenticationCredential;
//! }
//!
//! struct Pool {
//!     credentials: std::sync::Arc<Credentials>,
//! }
//!
//! impl Component for Pool {
//!     const KIND: CapabilityKind = CapabilityKind::ConnectionPool;
//! }
//!
//! let registry = NamedRegistry::new();
//!
//! registry.register("admin", |_| {
//!     Ok(Credentials { username: "admin".to_string() })
//! })?;
//!
//! // Resolved lazily: "admin" is built when "primary" is.
//! registry.register("primary", |r| {
//!     Ok(Pool { credentials: r.resolve::<Credentials>("admin")? })
//! })?;
//!
//! let pool = registry.resolve::<Pool>("primary")?;
//! assert_eq!(pool.credentials.username, "admin");
//! # Ok::<(), armature_registry::RegistryError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod entry;
mod error;
mod kind;
mod registry;

pub use entry::EntryState;
pub use error::{BoxError, RegistryError, Result};
pub use kind::{CapabilityKind, Component, RegistryKey};
pub use registry::NamedRegistry;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{CapabilityKind, Component, NamedRegistry, RegistryError, Result};
}
