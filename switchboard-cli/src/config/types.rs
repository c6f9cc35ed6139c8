use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use switchboard_models::FactoryConfig;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSwitchboardConfig {
    #[serde(default)]
    pub factory: RawFactoryConfig,

    #[serde(default)]
    pub catalog: RawCatalogConfig,
}

/// Factory settings as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawFactoryConfig {
    pub configuration_ttl_secs: Option<u64>,
    pub service_ttl_secs: Option<u64>,
    pub credential_prefix: Option<String>,
    pub preload_catalog: Option<bool>,
    pub keyring_service: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCatalogConfig {
    /// Model catalog file
    pub path: Option<PathBuf>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SwitchboardConfig {
    #[serde(default)]
    pub factory: FactoryConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Model catalog file
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: switchboard_paths::catalog_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = SwitchboardConfig::default();
        assert_eq!(config.factory.service_ttl_secs, 900);
        assert!(config.factory.preload_catalog);
        assert!(config.catalog.path.ends_with("switchboard/models.toml"));
    }

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[factory]
service_ttl_secs = 60
"#;
        let raw: RawSwitchboardConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(raw.factory.service_ttl_secs, Some(60));
        assert!(raw.factory.configuration_ttl_secs.is_none());
        assert!(raw.factory.preload_catalog.is_none());
        assert!(raw.catalog.path.is_none());
    }

    #[test]
    fn test_raw_config_empty_uses_none() {
        let raw: RawSwitchboardConfig = toml::from_str("").unwrap();

        assert!(raw.factory.credential_prefix.is_none());
        assert!(raw.factory.keyring_service.is_none());
    }
}
