//! Credential management for API keys.
//!
//! Two layers live here:
//!
//! - [`CredentialStore`] implementations look up raw secrets by exact key
//!   name (process environment, system keyring, memory) and can be stacked
//!   with [`LayeredCredentialStore`].
//! - [`CredentialResolver`] derives canonical key names from a provider and
//!   model and applies the model-then-provider fallback, caching hits.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use switchboard_models::auth::{
//!     CredentialResolver, EnvCredentialStore, KeyringCredentialStore, LayeredCredentialStore,
//! };
//!
//! let store = LayeredCredentialStore::new()
//!     .with_layer(Arc::new(KeyringCredentialStore::new("switchboard")))
//!     .with_layer(Arc::new(EnvCredentialStore::new()));
//! let resolver = CredentialResolver::new(Arc::new(store), "AI_KEY_");
//!
//! // AI_KEY_GROQ_LLAMA3_70B, then AI_KEY_GROQ
//! let key = resolver.resolve("groq", Some("llama3-70b")).await;
//! ```

mod resolver;
mod store;

use std::fmt;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::Result;

pub use resolver::{CredentialResolver, DEFAULT_KEY_PREFIX};
pub use store::{
    EnvCredentialStore, KeyringCredentialStore, LayeredCredentialStore, MemoryCredentialStore,
};

/// A secure API key that prevents accidental logging.
///
/// The key is wrapped in `SecretString` which:
/// - Implements `Debug` as `"[REDACTED]"`
/// - Zeroizes memory on drop
/// - Requires explicit `.expose_secret()` to access the value
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Create a new API key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the secret key value.
    ///
    /// Use sparingly - only when actually sending to an API.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Where a credential layer reads its secrets from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Process environment variables.
    Environment,
    /// The system keyring.
    Keyring,
    /// An in-process map.
    Memory,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CredentialSource::Environment => "environment",
            CredentialSource::Keyring => "keyring",
            CredentialSource::Memory => "memory",
        };
        f.write_str(name)
    }
}

/// Raw secret lookup by exact key name.
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Where this store reads from. Layered stores report their first layer.
    fn source(&self) -> CredentialSource;

    /// Look up a secret. `Ok(None)` means the key is not present.
    async fn get(&self, key: &str) -> Result<Option<ApiKey>>;

    /// Store a secret under `key`.
    async fn set(&self, key: &str, secret: &str) -> Result<()>;

    /// Delete a secret. Returns whether anything was removed.
    async fn delete(&self, key: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-secret-key-12345");
        let debug = format!("{:?}", key);
        assert_eq!(debug, "ApiKey([REDACTED])");
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn api_key_from_string() {
        let key: ApiKey = "my-key".into();
        assert_eq!(key.expose_secret(), "my-key");

        let key: ApiKey = String::from("my-key").into();
        assert_eq!(key.expose_secret(), "my-key");
    }

    #[test]
    fn credential_source_display() {
        assert_eq!(CredentialSource::Keyring.to_string(), "keyring");
        assert_eq!(CredentialSource::Environment.to_string(), "environment");
    }
}
