//! Service factory: the public entry point of the resolution pipeline.
//!
//! ```text
//! create_service(id)
//!   └─ service cache ── hit ──────────────────────────────► handle
//!        └─ miss (one pipeline per key)
//!             ├─ ConfigurationResolver (catalog, TTL cache)
//!             ├─ ServiceRegistry (creator │ descriptor │ discovery)
//!             ├─ CredentialResolver (when the descriptor needs one)
//!             └─ ServiceInstantiator
//!                  └─ any failure ──► FallbackService (cached too)
//! ```
//!
//! Creation never fails: every resolution error is logged and replaced by a
//! [`FallbackService`], which is cached under the failing key so repeated
//! requests inside the TTL do not redo the failing work. An unreachable
//! catalog is the exception: its fallback is returned but not cached, so
//! the next request retries once the catalog is back.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::auth::{
    CredentialResolver, CredentialStore, EnvCredentialStore, KeyringCredentialStore,
    LayeredCredentialStore,
};
use crate::cache::TtlCache;
use crate::catalog::{ConfigurationCatalog, ConfigurationResolver};
use crate::config::FactoryConfig;
use crate::providers::{AiService, FallbackService, builtin_module};
use crate::registry::{
    ImplementationDescriptor, Lookup, Registration, ServiceInstantiator, ServiceModule,
    ServiceRegistry,
};
use crate::{Error, ModelConfiguration, ModelId, ProviderTag, Result};

/// Lifecycle of a [`ServiceFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FactoryState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
}

impl From<u8> for FactoryState {
    fn from(value: u8) -> Self {
        match value {
            1 => FactoryState::Initializing,
            2 => FactoryState::Ready,
            _ => FactoryState::Uninitialized,
        }
    }
}

/// Resolves model identifiers to ready-to-call services.
///
/// Construct one per process with [`ServiceFactory::builder`] and share it
/// behind an `Arc`.
pub struct ServiceFactory {
    config: FactoryConfig,
    configurations: ConfigurationResolver,
    credentials: Arc<CredentialResolver>,
    registry: ServiceRegistry,
    instantiator: ServiceInstantiator,
    services: TtlCache<Arc<dyn AiService>>,
    init_lock: Mutex<()>,
    state: AtomicU8,
}

impl ServiceFactory {
    pub fn builder(catalog: Arc<dyn ConfigurationCatalog>) -> ServiceFactoryBuilder {
        ServiceFactoryBuilder::new(catalog)
    }

    pub fn state(&self) -> FactoryState {
        FactoryState::from(self.state.load(Ordering::Acquire))
    }

    /// Preload the catalog once. Concurrent callers wait for the first.
    ///
    /// A failed preload is logged and the factory still becomes ready;
    /// configurations are then resolved on demand.
    pub async fn initialize(&self) {
        if self.state() == FactoryState::Ready {
            return;
        }
        let _guard = self.init_lock.lock().await;
        if self.state() == FactoryState::Ready {
            return;
        }

        self.set_state(FactoryState::Initializing);
        if self.config.preload_catalog {
            match self.configurations.preload().await {
                Ok(count) => info!(count, "preloaded model catalog"),
                Err(e) => warn!(error = %e, "catalog preload failed, resolving on demand"),
            }
        }
        self.set_state(FactoryState::Ready);
    }

    /// Service for `identifier`. Never fails; see the module docs.
    #[instrument(skip(self))]
    pub async fn create_service(&self, identifier: &str) -> Arc<dyn AiService> {
        self.initialize().await;
        self.services
            .get_or_try_insert_with(identifier, || self.resolve_service(identifier))
            .await
            .unwrap_or_else(|uncached| uncached)
    }

    /// Service for a configuration supplied by the caller.
    ///
    /// Skips catalog resolution; cached under the configuration's identifier.
    #[instrument(skip(self, config), fields(model = %config.identifier))]
    pub async fn create_service_with(
        &self,
        provider: &str,
        config: ModelConfiguration,
    ) -> Arc<dyn AiService> {
        self.initialize().await;
        let tag = ProviderTag::new(provider);
        let key = config.identifier.as_str().to_string();
        self.services
            .get_or_try_insert_with(&key, || async {
                let resolved = match self.build(&tag, &config).await {
                    Ok(service) => (service, Some(tag.clone())),
                    Err(e) => self.fallback(&key, Some(tag.clone()), &e),
                };
                Ok::<_, Infallible>(resolved)
            })
            .await
            .unwrap_or_else(|never| match never {})
    }

    /// Evict cached services, configurations, discovery results and
    /// credentials, for one provider or for everything.
    pub fn clear_cache(&self, provider: Option<&str>) {
        match provider {
            Some(name) => {
                let tag = ProviderTag::new(name);
                let services = self.services.invalidate_owner(&tag);
                let configurations = self.configurations.invalidate_provider(&tag);
                self.registry.forget_discovery(&tag);
                self.credentials.invalidate_provider(&tag);
                info!(provider = %tag, services, configurations, "cleared provider cache");
            }
            None => {
                self.services.clear();
                self.configurations.clear();
                self.registry.clear_discovery();
                self.credentials.clear();
                info!("cleared all caches");
            }
        }
    }

    /// Drop cached credentials so the next resolution reads the store.
    pub fn refresh_credentials(&self, provider: Option<&str>) {
        match provider {
            Some(name) => self.credentials.invalidate_provider(&ProviderTag::new(name)),
            None => self.credentials.clear(),
        }
    }

    pub fn supports_provider(&self, name: &str) -> bool {
        self.registry.supports(&ProviderTag::new(name))
    }

    pub fn supported_providers(&self) -> BTreeSet<ProviderTag> {
        self.registry.providers()
    }

    /// Supported providers that can actually be built: creators, providers
    /// that need no credential, and providers with a resolvable credential.
    ///
    /// A credential counts when it resolves for the provider key or for any
    /// catalog configuration of that provider (its override or model key).
    /// An unreachable catalog leaves only the provider key.
    pub async fn active_providers(&self) -> BTreeSet<ProviderTag> {
        let catalog = match self.configurations.catalog().get_all().await {
            Ok(configs) => configs,
            Err(e) => {
                warn!(error = %e, "catalog unavailable, checking provider keys only");
                Vec::new()
            }
        };

        let mut active = BTreeSet::new();
        for tag in self.supported_providers() {
            let usable = match self.registry.lookup(&tag) {
                Lookup::Registered(Registration::Creator(_)) => true,
                Lookup::Registered(Registration::Implementation(d)) | Lookup::Discovered(d) => {
                    if d.requires_credential() {
                        let configs: Vec<ModelConfiguration> = catalog
                            .iter()
                            .filter(|c| c.provider_tag() == tag)
                            .cloned()
                            .collect();
                        self.credentials
                            .has_credential_for(tag.as_str(), &configs)
                            .await
                    } else {
                        true
                    }
                }
                Lookup::Miss => false,
            };
            if usable {
                active.insert(tag);
            }
        }
        active
    }

    /// Register a construction function at runtime.
    ///
    /// Cached entries of that provider are evicted.
    pub fn register_creator<F>(&self, provider: &str, creator: F)
    where
        F: Fn(&ModelConfiguration) -> Result<Arc<dyn AiService>> + Send + Sync + 'static,
    {
        self.registry.register_creator(provider, creator);
        self.clear_cache(Some(provider));
    }

    /// Register an implementation at runtime.
    ///
    /// Cached entries of that provider are evicted.
    pub fn register_implementation(&self, provider: &str, descriptor: ImplementationDescriptor) {
        self.registry.register_implementation(provider, descriptor);
        self.clear_cache(Some(provider));
    }

    /// Add a late-bound discovery module.
    pub fn add_module(&self, module: ServiceModule) {
        self.registry.add_module(module);
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<CredentialResolver> {
        &self.credentials
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn configurations(&self) -> &ConfigurationResolver {
        &self.configurations
    }

    fn set_state(&self, state: FactoryState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// `Err` carries a fallback that must not be cached.
    async fn resolve_service(
        &self,
        identifier: &str,
    ) -> std::result::Result<(Arc<dyn AiService>, Option<ProviderTag>), Arc<dyn AiService>> {
        let hinted = ModelId::from(identifier).provider().map(ProviderTag::new);
        let config = match self.configurations.resolve(identifier).await {
            Ok(config) => config,
            Err(e @ Error::CatalogUnavailable(_)) => {
                let (service, _) = self.fallback(identifier, hinted, &e);
                return Err(service);
            }
            Err(e) => return Ok(self.fallback(identifier, hinted, &e)),
        };

        let tag = config.provider_tag();
        Ok(match self.build(&tag, &config).await {
            Ok(service) => (service, Some(tag)),
            Err(e) => self.fallback(identifier, Some(tag), &e),
        })
    }

    async fn build(
        &self,
        tag: &ProviderTag,
        config: &ModelConfiguration,
    ) -> Result<Arc<dyn AiService>> {
        if !config.enabled {
            return Err(Error::ModelDisabled(config.identifier.to_string()));
        }

        let descriptor = match self.registry.lookup(tag) {
            Lookup::Registered(Registration::Creator(creator)) => return creator(config),
            Lookup::Registered(Registration::Implementation(d)) | Lookup::Discovered(d) => d,
            Lookup::Miss => return Err(Error::NoRegisteredProvider(tag.to_string())),
        };

        if descriptor.requires_credential() && self.credentials.resolve_for(config).await.is_none()
        {
            return Err(Error::CredentialMissing(tag.to_string()));
        }

        self.instantiator.instantiate(&descriptor, config).await
    }

    fn fallback(
        &self,
        identifier: &str,
        owner: Option<ProviderTag>,
        err: &Error,
    ) -> (Arc<dyn AiService>, Option<ProviderTag>) {
        match err {
            Error::NoSuitableConstructor { .. } => {
                error!(model = identifier, error = %err, "unusable implementation, using fallback service")
            }
            _ => warn!(model = identifier, error = %err, "using fallback service"),
        }
        (Arc::new(FallbackService::new(identifier)), owner)
    }
}

/// Composition-root builder for [`ServiceFactory`].
pub struct ServiceFactoryBuilder {
    catalog: Arc<dyn ConfigurationCatalog>,
    store: Option<Arc<dyn CredentialStore>>,
    config: FactoryConfig,
    modules: Vec<ServiceModule>,
    registrations: Vec<(String, Registration)>,
}

impl ServiceFactoryBuilder {
    fn new(catalog: Arc<dyn ConfigurationCatalog>) -> Self {
        Self {
            catalog,
            store: None,
            config: FactoryConfig::default(),
            modules: Vec::new(),
            registrations: Vec::new(),
        }
    }

    /// Credential store to resolve from. Defaults to the system keyring
    /// followed by the process environment.
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Discovery module searched after the built-in one.
    pub fn module(mut self, module: ServiceModule) -> Self {
        self.modules.push(module);
        self
    }

    pub fn register_creator<F>(mut self, provider: &str, creator: F) -> Self
    where
        F: Fn(&ModelConfiguration) -> Result<Arc<dyn AiService>> + Send + Sync + 'static,
    {
        self.registrations
            .push((provider.to_string(), Registration::Creator(Arc::new(creator))));
        self
    }

    pub fn register_implementation(
        mut self,
        provider: &str,
        descriptor: ImplementationDescriptor,
    ) -> Self {
        self.registrations.push((
            provider.to_string(),
            Registration::Implementation(Arc::new(descriptor)),
        ));
        self
    }

    pub fn build(self) -> ServiceFactory {
        let config = self.config;
        let store = self.store.unwrap_or_else(|| {
            Arc::new(
                LayeredCredentialStore::new()
                    .with_layer(Arc::new(KeyringCredentialStore::new(
                        config.keyring_service.as_str(),
                    )))
                    .with_layer(Arc::new(EnvCredentialStore::new())),
            )
        });
        let credentials = Arc::new(CredentialResolver::new(
            store,
            config.credential_prefix.as_str(),
        ));

        let registry = ServiceRegistry::new(builtin_module());
        for module in self.modules {
            registry.add_module(module);
        }
        for (provider, registration) in self.registrations {
            registry.register(&provider, registration);
        }

        ServiceFactory {
            configurations: ConfigurationResolver::new(self.catalog, config.configuration_ttl()),
            instantiator: ServiceInstantiator::new(Arc::clone(&credentials)),
            services: TtlCache::new(config.service_ttl()),
            credentials,
            registry,
            config,
            init_lock: Mutex::new(()),
            state: AtomicU8::new(FactoryState::Uninitialized as u8),
        }
    }
}
