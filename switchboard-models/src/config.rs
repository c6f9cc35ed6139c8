//! Factory settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::DEFAULT_KEY_PREFIX;

/// Default lifetime of cached configurations and services.
pub const DEFAULT_TTL_SECS: u64 = 15 * 60;

/// Default keyring service name.
pub const DEFAULT_KEYRING_SERVICE: &str = "switchboard";

/// Settings for [`ServiceFactory`](crate::ServiceFactory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Seconds a resolved configuration stays cached.
    pub configuration_ttl_secs: u64,
    /// Seconds a constructed service stays cached.
    pub service_ttl_secs: u64,
    /// Prefix of canonical credential keys.
    pub credential_prefix: String,
    /// Load the whole catalog into the cache on first use.
    pub preload_catalog: bool,
    /// Service name used for keyring entries.
    pub keyring_service: String,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            configuration_ttl_secs: DEFAULT_TTL_SECS,
            service_ttl_secs: DEFAULT_TTL_SECS,
            credential_prefix: DEFAULT_KEY_PREFIX.to_string(),
            preload_catalog: true,
            keyring_service: DEFAULT_KEYRING_SERVICE.to_string(),
        }
    }
}

impl FactoryConfig {
    pub fn configuration_ttl(&self) -> Duration {
        Duration::from_secs(self.configuration_ttl_secs)
    }

    pub fn service_ttl(&self) -> Duration {
        Duration::from_secs(self.service_ttl_secs)
    }
}
