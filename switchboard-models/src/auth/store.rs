//! Credential store layers.

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{ApiKey, CredentialSource, CredentialStore};
use crate::{Error, Result};

/// Reads secrets from process environment variables.
///
/// The environment is treated as read-only.
#[derive(Debug, Default, Clone)]
pub struct EnvCredentialStore;

impl EnvCredentialStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    fn source(&self) -> CredentialSource {
        CredentialSource::Environment
    }

    async fn get(&self, key: &str) -> Result<Option<ApiKey>> {
        Ok(env::var(key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(ApiKey::new))
    }

    async fn set(&self, _key: &str, _secret: &str) -> Result<()> {
        Err(Error::ReadOnlyStore(self.source().to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        Err(Error::ReadOnlyStore(self.source().to_string()))
    }
}

/// Stores secrets in the system keyring.
///
/// Keyring calls block, so they run on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service_name: String,
}

impl KeyringCredentialStore {
    /// Create a keyring store.
    ///
    /// # Arguments
    ///
    /// * `service_name` - Service identifier for keyring (e.g., "switchboard")
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    async fn with_entry<T, F>(&self, key: &str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(keyring::Entry) -> Result<T> + Send + 'static,
    {
        let service = self.service_name.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let entry =
                keyring::Entry::new(&service, &key).map_err(|e| Error::Keyring(e.to_string()))?;
            op(entry)
        })
        .await
        .map_err(|e| Error::Keyring(e.to_string()))?
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    fn source(&self) -> CredentialSource {
        CredentialSource::Keyring
    }

    async fn get(&self, key: &str) -> Result<Option<ApiKey>> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(secret) => Ok(Some(ApiKey::new(secret))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Keyring(e.to_string())),
        })
        .await
    }

    async fn set(&self, key: &str, secret: &str) -> Result<()> {
        let secret = secret.to_string();
        self.with_entry(key, move |entry| {
            entry
                .set_password(&secret)
                .map_err(|e| Error::Keyring(e.to_string()))
        })
        .await?;
        debug!(key, "stored credential in keyring");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(Error::Keyring(e.to_string())),
        })
        .await
    }
}

/// In-process credential map.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a secret.
    pub fn with_secret(self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), secret.into());
        self
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    fn source(&self) -> CredentialSource {
        CredentialSource::Memory
    }

    async fn get(&self, key: &str) -> Result<Option<ApiKey>> {
        let secrets = self.secrets.read().unwrap_or_else(|e| e.into_inner());
        Ok(secrets.get(key).map(|s| ApiKey::new(s.as_str())))
    }

    async fn set(&self, key: &str, secret: &str) -> Result<()> {
        self.secrets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), secret.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self
            .secrets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(removed.is_some())
    }
}

/// Ordered stack of credential stores.
///
/// # Storage Priority
///
/// When retrieving credentials the layers are asked in order and the first
/// hit wins. A failing layer is logged and skipped.
///
/// When storing credentials the first layer that accepts writes is used.
/// Deletes go to every writable layer.
#[derive(Default)]
pub struct LayeredCredentialStore {
    layers: Vec<Arc<dyn CredentialStore>>,
}

impl LayeredCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer with lower priority than the existing ones.
    pub fn with_layer(mut self, layer: Arc<dyn CredentialStore>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Look up a secret and report which layer had it.
    pub async fn get_with_source(&self, key: &str) -> Option<(ApiKey, CredentialSource)> {
        for layer in &self.layers {
            match layer.get(key).await {
                Ok(Some(secret)) => {
                    debug!(key, source = %layer.source(), "resolved credential");
                    return Some((secret, layer.source()));
                }
                Ok(None) => {}
                Err(e) => warn!(key, source = %layer.source(), error = %e, "credential layer failed"),
            }
        }
        None
    }
}

#[async_trait]
impl CredentialStore for LayeredCredentialStore {
    fn source(&self) -> CredentialSource {
        self.layers
            .first()
            .map(|layer| layer.source())
            .unwrap_or(CredentialSource::Memory)
    }

    async fn get(&self, key: &str) -> Result<Option<ApiKey>> {
        Ok(self.get_with_source(key).await.map(|(secret, _)| secret))
    }

    async fn set(&self, key: &str, secret: &str) -> Result<()> {
        let mut last_err = None;
        for layer in &self.layers {
            match layer.set(key, secret).await {
                Ok(()) => return Ok(()),
                Err(e @ Error::ReadOnlyStore(_)) => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::ReadOnlyStore("layered".to_string())))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut removed = false;
        for layer in &self.layers {
            match layer.delete(key).await {
                Ok(hit) => removed |= hit,
                Err(Error::ReadOnlyStore(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }
}
