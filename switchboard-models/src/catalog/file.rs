//! Catalog backed by a TOML file.
//!
//! ```toml
//! [[models]]
//! identifier = "groq/llama3-70b"
//! provider = "groq"
//! model = "llama3-70b"
//!
//! [models.capabilities]
//! max_tokens = 8192
//! streaming = true
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::ConfigurationCatalog;
use crate::{Error, ModelConfiguration, ProviderTag, Result};

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    models: Vec<ModelConfiguration>,
}

/// Reads `[[models]]` records from a file on every call.
///
/// The file is the source of truth; caching is the resolver's job.
#[derive(Debug, Clone)]
pub struct TomlCatalog {
    path: PathBuf,
}

impl TomlCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse catalog records from TOML text.
    pub fn parse(contents: &str) -> Result<Vec<ModelConfiguration>> {
        let file: CatalogFile = toml::from_str(contents)?;
        Ok(file.models)
    }

    async fn load(&self) -> Result<Vec<ModelConfiguration>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                Error::CatalogUnavailable(format!("{}: {e}", path.display()))
            })?;
            Self::parse(&contents)
                .map_err(|e| Error::CatalogUnavailable(format!("{}: {e}", path.display())))
        })
        .await
        .map_err(|e| Error::CatalogUnavailable(e.to_string()))?
    }
}

#[async_trait]
impl ConfigurationCatalog for TomlCatalog {
    async fn get_all(&self) -> Result<Vec<ModelConfiguration>> {
        self.load().await
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<ModelConfiguration>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|r| r.identifier.as_str() == identifier))
    }

    async fn get_by_provider_and_model(
        &self,
        provider: &str,
        model: &str,
    ) -> Result<Option<ModelConfiguration>> {
        let provider = ProviderTag::new(provider);
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|r| r.provider_tag() == provider && r.model == model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CATALOG: &str = r#"
[[models]]
identifier = "groq/llama3-70b"
provider = "groq"
model = "llama3-70b"
credential_key = "GROQ_API_KEY"

[models.capabilities]
max_tokens = 8192
streaming = true

[[models]]
identifier = "simulated/echo"
provider = "simulated"
model = "echo"
enabled = false
"#;

    #[test]
    fn parse_reads_records_and_defaults() {
        let records = TomlCatalog::parse(CATALOG).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].capabilities.max_tokens, 8192);
        assert!(records[0].capabilities.streaming);
        assert!(!records[0].capabilities.function_calling);
        assert_eq!(records[0].credential_key.as_deref(), Some("GROQ_API_KEY"));
        assert!(records[0].enabled);

        assert!(!records[1].enabled);
    }

    #[test]
    fn parse_empty_file_has_no_records() {
        assert!(TomlCatalog::parse("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookups_read_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models.toml");
        std::fs::write(&path, CATALOG).unwrap();
        let catalog = TomlCatalog::new(&path);

        assert_eq!(catalog.get_all().await.unwrap().len(), 2);
        assert!(
            catalog
                .get_by_identifier("groq/llama3-70b")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            catalog
                .get_by_provider_and_model("Simulated", "echo")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let catalog = TomlCatalog::new("/nonexistent/switchboard/models.toml");
        assert!(matches!(
            catalog.get_all().await,
            Err(Error::CatalogUnavailable(_))
        ));
    }
}
