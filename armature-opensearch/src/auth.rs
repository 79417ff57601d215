//! Authentication options and credentials.

use crate::error::{OpenSearchError, Result};
use armature_registry::{CapabilityKind, Component};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

/// Basic authentication options.
///
/// Field names also bind from `Username`/`Password` sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BasicAuthenticationOptions {
    /// Username.
    #[serde(alias = "Username")]
    pub username: Option<String>,
    /// Password.
    #[serde(alias = "Password")]
    pub password: Option<String>,
}

impl BasicAuthenticationOptions {
    /// Options with both fields set.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }
}

/// API key authentication options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiKeyAuthenticationOptions {
    /// Base64 encoding of `id:api_key`.
    #[serde(
        alias = "Base64EncodedApiKey",
        alias = "base64EncodedApiKey",
        alias = "base64encodedapikey"
    )]
    pub base64_encoded_api_key: Option<String>,
}

impl ApiKeyAuthenticationOptions {
    /// Options with the encoded key set.
    pub fn new(base64_encoded_api_key: impl Into<String>) -> Self {
        Self {
            base64_encoded_api_key: Some(base64_encoded_api_key.into()),
        }
    }
}

/// Credentials presented to the cluster.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthenticationCredential {
    /// HTTP basic authentication.
    Basic {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// API key authentication.
    ApiKey {
        /// API key id.
        id: String,
        /// API key secret.
        key: String,
    },
}

impl Component for AuthenticationCredential {
    const KIND: CapabilityKind = CapabilityKind::AuthenticationCredential;
}

impl AuthenticationCredential {
    /// Basic credentials from options. The username is required.
    pub fn basic(options: &BasicAuthenticationOptions) -> Result<Self> {
        let username = options
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| OpenSearchError::Validation("Basic authentication requires a username".to_string()))?;

        Ok(AuthenticationCredential::Basic {
            username: username.to_string(),
            password: options.password.clone().unwrap_or_default(),
        })
    }

    /// API key credentials from options.
    ///
    /// The key must be the base64 encoding of `id:api_key`.
    pub fn api_key(options: &ApiKeyAuthenticationOptions) -> Result<Self> {
        let encoded = options
            .base64_encoded_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| OpenSearchError::Validation("API key authentication requires an encoded key".to_string()))?;

        let decoded = STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| OpenSearchError::Validation("API key is not valid base64".to_string()))?;

        let (id, key) = decoded
            .split_once(':')
            .ok_or_else(|| OpenSearchError::Validation("Decoded API key must have the form 'id:api_key'".to_string()))?;

        Ok(AuthenticationCredential::ApiKey {
            id: id.to_string(),
            key: key.to_string(),
        })
    }

    /// Convert into transport credentials.
    pub fn to_transport_credentials(&self) -> opensearch::auth::Credentials {
        match self {
            AuthenticationCredential::Basic { username, password } => {
                opensearch::auth::Credentials::Basic(username.clone(), password.clone())
            }
            AuthenticationCredential::ApiKey { id, key } => {
                opensearch::auth::Credentials::ApiKey(id.clone(), key.clone())
            }
        }
    }
}

impl std::fmt::Debug for AuthenticationCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthenticationCredential::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            AuthenticationCredential::ApiKey { id, .. } => f
                .debug_struct("ApiKey")
                .field("id", id)
                .field("key", &"<redacted>")
                .finish(),
        }
    }
}
