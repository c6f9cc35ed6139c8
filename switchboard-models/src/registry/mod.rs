//! Provider registry.
//!
//! Maps a canonical provider tag to either a construction function or an
//! implementation descriptor. Providers known at build time are registered
//! explicitly; anything else goes through the [`TypeDiscoverer`], whose
//! results (hits and misses) are memoized.

mod descriptor;
mod discovery;
mod instantiate;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

pub use descriptor::{
    Constructor, CredentialConstructor, DefaultConstructor, ImplementationDescriptor,
    ResolverCapabilitiesConstructor, ResolverConstructor,
};
pub use discovery::{ServiceModule, TypeDiscoverer};
pub use instantiate::ServiceInstantiator;

use crate::providers::AiService;
use crate::{ModelConfiguration, ProviderTag, Result};

/// Zero-config construction function registered for a provider.
pub type ServiceCreator =
    Arc<dyn Fn(&ModelConfiguration) -> Result<Arc<dyn AiService>> + Send + Sync>;

/// How a provider is constructed.
#[derive(Clone)]
pub enum Registration {
    Creator(ServiceCreator),
    Implementation(Arc<ImplementationDescriptor>),
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Registration::Creator(_) => write!(f, "Creator"),
            Registration::Implementation(d) => write!(f, "Implementation({})", d.type_name()),
        }
    }
}

/// Result of a registry lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Found in the static registrations.
    Registered(Registration),
    /// Found by discovery.
    Discovered(Arc<ImplementationDescriptor>),
    /// Unknown provider.
    Miss,
}

impl Lookup {
    pub fn is_miss(&self) -> bool {
        matches!(self, Lookup::Miss)
    }
}

/// Case-insensitive provider registry with discovery on miss.
pub struct ServiceRegistry {
    registrations: DashMap<ProviderTag, Registration>,
    discoverer: TypeDiscoverer,
}

impl ServiceRegistry {
    /// Create a registry whose discoverer searches `local` first.
    pub fn new(local: ServiceModule) -> Self {
        Self {
            registrations: DashMap::new(),
            discoverer: TypeDiscoverer::new(local),
        }
    }

    /// Register `provider`, replacing any previous entry.
    pub fn register(&self, provider: &str, registration: Registration) {
        let tag = ProviderTag::new(provider);
        info!(provider = %tag, ?registration, "registered provider");
        self.registrations.insert(tag, registration);
    }

    /// Register a construction function, replacing any previous entry.
    pub fn register_creator<F>(&self, provider: &str, creator: F)
    where
        F: Fn(&ModelConfiguration) -> Result<Arc<dyn AiService>> + Send + Sync + 'static,
    {
        self.register(provider, Registration::Creator(Arc::new(creator)));
    }

    /// Register an implementation, replacing any previous entry.
    pub fn register_implementation(&self, provider: &str, descriptor: ImplementationDescriptor) {
        self.register(provider, Registration::Implementation(Arc::new(descriptor)));
    }

    /// Add a module for discovery.
    pub fn add_module(&self, module: ServiceModule) {
        self.discoverer.add_module(module);
    }

    /// Static registration first, then discovery.
    pub fn lookup(&self, provider: &ProviderTag) -> Lookup {
        if let Some(registration) = self.registrations.get(provider) {
            return Lookup::Registered(registration.clone());
        }
        match self.discoverer.discover(provider) {
            Some(descriptor) => Lookup::Discovered(descriptor),
            None => Lookup::Miss,
        }
    }

    /// Whether `provider` is registered or discoverable.
    pub fn supports(&self, provider: &ProviderTag) -> bool {
        !self.lookup(provider).is_miss()
    }

    /// Registered providers plus those served by discovery modules.
    pub fn providers(&self) -> BTreeSet<ProviderTag> {
        let mut providers: BTreeSet<ProviderTag> = self
            .registrations
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        providers.extend(self.discoverer.provider_hints());
        providers
    }

    /// Drop memoized discovery results for one provider.
    pub fn forget_discovery(&self, provider: &ProviderTag) {
        self.discoverer.forget(provider);
    }

    /// Drop all memoized discovery results.
    pub fn clear_discovery(&self) {
        self.discoverer.clear();
    }

    pub fn discoverer(&self) -> &TypeDiscoverer {
        &self.discoverer
    }
}
