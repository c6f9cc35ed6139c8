use super::types::{
    CatalogConfig, RawCatalogConfig, RawFactoryConfig, RawSwitchboardConfig, SwitchboardConfig,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use switchboard_models::FactoryConfig;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<SwitchboardConfig> {
        Self::load_layers(&[Self::user_config_path(), Self::project_config_path()])
    }

    /// Merge the files that exist, later layers winning.
    pub fn load_layers(paths: &[PathBuf]) -> Result<SwitchboardConfig> {
        let mut raw = RawSwitchboardConfig::default();
        for path in paths.iter().filter(|p| p.exists()) {
            debug!(path = %path.display(), "loading config layer");
            raw = Self::merge_raw(raw, Self::read_raw(path)?);
        }
        Ok(Self::finalize(raw))
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        switchboard_paths::config_file()
    }

    /// Get project config path
    /// Can be overridden with SWITCHBOARD_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("SWITCHBOARD_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join(switchboard_paths::CONFIG_FILE)
        } else {
            PathBuf::from(".switchboard").join(switchboard_paths::CONFIG_FILE)
        }
    }

    fn read_raw(path: &Path) -> Result<RawSwitchboardConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawSwitchboardConfig, overlay: RawSwitchboardConfig) -> RawSwitchboardConfig {
        RawSwitchboardConfig {
            factory: RawFactoryConfig {
                configuration_ttl_secs: overlay
                    .factory
                    .configuration_ttl_secs
                    .or(base.factory.configuration_ttl_secs),
                service_ttl_secs: overlay
                    .factory
                    .service_ttl_secs
                    .or(base.factory.service_ttl_secs),
                credential_prefix: overlay
                    .factory
                    .credential_prefix
                    .or(base.factory.credential_prefix),
                preload_catalog: overlay
                    .factory
                    .preload_catalog
                    .or(base.factory.preload_catalog),
                keyring_service: overlay
                    .factory
                    .keyring_service
                    .or(base.factory.keyring_service),
            },
            catalog: RawCatalogConfig {
                path: overlay.catalog.path.or(base.catalog.path),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawSwitchboardConfig) -> SwitchboardConfig {
        let defaults = FactoryConfig::default();
        SwitchboardConfig {
            factory: FactoryConfig {
                configuration_ttl_secs: raw
                    .factory
                    .configuration_ttl_secs
                    .unwrap_or(defaults.configuration_ttl_secs),
                service_ttl_secs: raw
                    .factory
                    .service_ttl_secs
                    .unwrap_or(defaults.service_ttl_secs),
                credential_prefix: raw
                    .factory
                    .credential_prefix
                    .unwrap_or(defaults.credential_prefix),
                preload_catalog: raw
                    .factory
                    .preload_catalog
                    .unwrap_or(defaults.preload_catalog),
                keyring_service: raw
                    .factory
                    .keyring_service
                    .unwrap_or(defaults.keyring_service),
            },
            catalog: raw
                .catalog
                .path
                .map(|path| CatalogConfig { path })
                .unwrap_or_default(),
        }
    }
}
