//! In-process catalog.

use std::sync::RwLock;

use async_trait::async_trait;

use super::ConfigurationCatalog;
use crate::{ModelConfiguration, ProviderTag, Result};

/// Catalog held in memory, for tests and embedders that own their records.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    records: RwLock<Vec<ModelConfiguration>>,
}

impl InMemoryCatalog {
    pub fn new(records: Vec<ModelConfiguration>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Insert a record or replace the one with the same identifier.
    pub fn upsert(&self, config: ModelConfiguration) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        match records
            .iter_mut()
            .find(|r| r.identifier == config.identifier)
        {
            Some(existing) => *existing = config,
            None => records.push(config),
        }
    }

    /// Remove a record. Returns whether it existed.
    pub fn remove(&self, identifier: &str) -> bool {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let before = records.len();
        records.retain(|r| r.identifier.as_str() != identifier);
        records.len() != before
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<ModelConfiguration>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ConfigurationCatalog for InMemoryCatalog {
    async fn get_all(&self) -> Result<Vec<ModelConfiguration>> {
        Ok(self.read().clone())
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<ModelConfiguration>> {
        Ok(self
            .read()
            .iter()
            .find(|r| r.identifier.as_str() == identifier)
            .cloned())
    }

    async fn get_by_provider_and_model(
        &self,
        provider: &str,
        model: &str,
    ) -> Result<Option<ModelConfiguration>> {
        let provider = ProviderTag::new(provider);
        Ok(self
            .read()
            .iter()
            .find(|r| r.provider_tag() == provider && r.model == model)
            .cloned())
    }
}
