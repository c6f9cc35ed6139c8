//! Model configuration catalog and resolver.
//!
//! The catalog itself is an external source (a database, a TOML file); this
//! module only reads it. [`ConfigurationResolver`] turns an arbitrary model
//! identifier into one [`ModelConfiguration`]:
//!
//! 1. exact identifier match
//! 2. `provider/model` decomposition
//! 3. linear scan comparing identifier or model id, case-insensitively
//!
//! Hits are cached for a fixed TTL keyed by the identifier as given.
//! Catalog failures are returned as [`Error::CatalogUnavailable`] and never
//! cached.

mod file;
mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

pub use file::TomlCatalog;
pub use memory::InMemoryCatalog;

use crate::cache::TtlCache;
use crate::{Error, ModelConfiguration, ModelId, ProviderTag, Result};

/// Read access to model configuration records.
///
/// Implementations must tolerate concurrent calls.
#[async_trait]
pub trait ConfigurationCatalog: Send + Sync {
    /// Every record.
    async fn get_all(&self) -> Result<Vec<ModelConfiguration>>;

    /// Record with exactly this identifier.
    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<ModelConfiguration>>;

    /// Record for this provider (case-insensitive) and model id.
    async fn get_by_provider_and_model(
        &self,
        provider: &str,
        model: &str,
    ) -> Result<Option<ModelConfiguration>>;
}

/// Cached configuration lookup.
pub struct ConfigurationResolver {
    catalog: Arc<dyn ConfigurationCatalog>,
    cache: TtlCache<ModelConfiguration>,
}

impl ConfigurationResolver {
    pub fn new(catalog: Arc<dyn ConfigurationCatalog>, ttl: Duration) -> Self {
        Self {
            catalog,
            cache: TtlCache::new(ttl),
        }
    }

    /// Resolve `identifier`, using the cache when possible.
    #[instrument(skip(self))]
    pub async fn resolve(&self, identifier: &str) -> Result<ModelConfiguration> {
        self.cache
            .get_or_try_insert_with(identifier, || async {
                let config = self.lookup(identifier).await?;
                let owner = Some(config.provider_tag());
                Ok::<_, Error>((config, owner))
            })
            .await
    }

    /// Load every catalog record into the cache. Returns the record count.
    pub async fn preload(&self) -> Result<usize> {
        let all = self.catalog.get_all().await?;
        let count = all.len();
        for config in all {
            let owner = Some(config.provider_tag());
            let key = config.identifier.as_str().to_string();
            self.cache.insert(key, config, owner);
        }
        Ok(count)
    }

    /// Drop cached records belonging to `provider`.
    pub fn invalidate_provider(&self, provider: &ProviderTag) -> usize {
        self.cache.invalidate_owner(provider)
    }

    /// Drop every cached record.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// The underlying catalog.
    pub fn catalog(&self) -> &Arc<dyn ConfigurationCatalog> {
        &self.catalog
    }

    async fn lookup(&self, identifier: &str) -> Result<ModelConfiguration> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return Err(Error::ConfigurationNotFound(identifier.to_string()));
        }

        if let Some(config) = self.catalog.get_by_identifier(trimmed).await? {
            debug!("exact identifier match");
            return Ok(config);
        }

        let id = ModelId::from(trimmed);
        if let Some((provider, model)) = id.split() {
            if let Some(config) = self.catalog.get_by_provider_and_model(provider, model).await? {
                debug!(provider, model, "provider/model match");
                return Ok(config);
            }
        }

        self.catalog
            .get_all()
            .await?
            .into_iter()
            .find(|c| {
                c.identifier.as_str().eq_ignore_ascii_case(trimmed)
                    || c.model.eq_ignore_ascii_case(trimmed)
            })
            .inspect(|_| debug!("matched by scan"))
            .ok_or_else(|| Error::ConfigurationNotFound(identifier.to_string()))
    }
}
