//! Convention-based lookup of implementations in explicit modules.
//!
//! Nothing is found by reflection. A [`ServiceModule`] is a named list of
//! descriptors; the discoverer searches its local module first, then any
//! modules added later (e.g. by a plugin loader). The expected type name is
//! derived from the provider tag (`groq` → `GroqService`). An exact name
//! match in any module beats a containment match. Containment compares the
//! tag against the type name without its `Service` suffix and needs at least
//! [`MIN_CONTAINMENT_LEN`] characters.
//!
//! Results are memoized per provider, misses included, so each provider is
//! scanned at most once until [`TypeDiscoverer::forget`] or
//! [`TypeDiscoverer::clear`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use tracing::{debug, info};

use super::descriptor::ImplementationDescriptor;
use crate::ProviderTag;

/// Shortest provider tag, in alphanumeric characters, that may match a type
/// name by containment.
pub const MIN_CONTAINMENT_LEN: usize = 3;

/// A named group of implementations.
#[derive(Debug, Clone)]
pub struct ServiceModule {
    name: String,
    implementations: Vec<Arc<ImplementationDescriptor>>,
}

impl ServiceModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            implementations: Vec::new(),
        }
    }

    pub fn with(mut self, descriptor: ImplementationDescriptor) -> Self {
        self.implementations.push(Arc::new(descriptor));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn implementations(&self) -> &[Arc<ImplementationDescriptor>] {
        &self.implementations
    }
}

/// Memoizing implementation finder.
pub struct TypeDiscoverer {
    local: ServiceModule,
    modules: RwLock<Vec<ServiceModule>>,
    memo: DashMap<ProviderTag, Option<Arc<ImplementationDescriptor>>>,
    scans: AtomicUsize,
}

impl TypeDiscoverer {
    pub fn new(local: ServiceModule) -> Self {
        Self {
            local,
            modules: RwLock::new(Vec::new()),
            memo: DashMap::new(),
            scans: AtomicUsize::new(0),
        }
    }

    /// Add a module searched after the local one.
    ///
    /// Memoized misses are dropped so the new module gets a chance.
    pub fn add_module(&self, module: ServiceModule) {
        info!(
            module = module.name(),
            implementations = module.implementations().len(),
            "added service module"
        );
        self.modules
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(module);
        self.memo.retain(|_, found| found.is_some());
    }

    /// Find the implementation for `provider`, scanning at most once.
    pub fn discover(&self, provider: &ProviderTag) -> Option<Arc<ImplementationDescriptor>> {
        if let Some(found) = self.memo.get(provider) {
            return found.clone();
        }
        self.memo
            .entry(provider.clone())
            .or_insert_with(|| self.scan(provider))
            .clone()
    }

    /// Provider names served by every known module, by naming convention.
    pub fn provider_hints(&self) -> Vec<ProviderTag> {
        let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
        std::iter::once(&self.local)
            .chain(modules.iter())
            .flat_map(|m| m.implementations().iter())
            .filter(|d| !d.constructors().is_empty())
            .map(|d| d.provider_hint())
            .collect()
    }

    /// Drop the memoized result for one provider.
    pub fn forget(&self, provider: &ProviderTag) {
        self.memo.remove(provider);
    }

    /// Drop every memoized result.
    pub fn clear(&self) {
        self.memo.clear();
    }

    /// Number of scans performed so far.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    fn scan(&self, provider: &ProviderTag) -> Option<Arc<ImplementationDescriptor>> {
        self.scans.fetch_add(1, Ordering::Relaxed);

        let needle: String = provider
            .as_str()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();
        if needle.is_empty() {
            return None;
        }

        let expected = provider.implementation_name();
        let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
        let candidates = || {
            std::iter::once(&self.local)
                .chain(modules.iter())
                .flat_map(|m| m.implementations().iter())
                .filter(|d| !d.constructors().is_empty())
        };

        let found = candidates()
            .find(|d| d.type_name() == expected)
            .or_else(|| {
                if needle.len() < MIN_CONTAINMENT_LEN {
                    return None;
                }
                candidates().find(|d| type_stem(d.type_name()).contains(&needle))
            })
            .cloned();

        match &found {
            Some(d) => debug!(%provider, type_name = d.type_name(), "discovered implementation"),
            None => debug!(%provider, %expected, "no implementation found"),
        }
        found
    }
}

/// Lowercase alphanumeric part of `type_name` without a `Service` suffix.
fn type_stem(type_name: &str) -> String {
    type_name
        .strip_suffix("Service")
        .unwrap_or(type_name)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::FallbackService;

    fn descriptor(name: &str) -> ImplementationDescriptor {
        ImplementationDescriptor::new(name).with_default(|| Box::new(FallbackService::new("")))
    }

    #[test]
    fn finds_exact_name_in_local_module() {
        let discoverer =
            TypeDiscoverer::new(ServiceModule::new("local").with(descriptor("GroqService")));

        let found = discoverer.discover(&ProviderTag::new("Groq")).unwrap();
        assert_eq!(found.type_name(), "GroqService");
    }

    #[test]
    fn exact_match_in_later_module_beats_containment() {
        let discoverer =
            TypeDiscoverer::new(ServiceModule::new("local").with(descriptor("GroqLegacyClient")));
        discoverer.add_module(ServiceModule::new("plugin").with(descriptor("GroqService")));

        let found = discoverer.discover(&ProviderTag::new("groq")).unwrap();
        assert_eq!(found.type_name(), "GroqService");
    }

    #[test]
    fn falls_back_to_containment() {
        let discoverer =
            TypeDiscoverer::new(ServiceModule::new("local").with(descriptor("MyOpenAiClient")));

        let found = discoverer.discover(&ProviderTag::new("open-ai")).unwrap();
        assert_eq!(found.type_name(), "MyOpenAiClient");
    }

    #[test]
    fn short_or_generic_tags_do_not_match_by_containment() {
        let discoverer = TypeDiscoverer::new(
            ServiceModule::new("local")
                .with(descriptor("SimulatedService"))
                .with(descriptor("AiService")),
        );

        for provider in ["e", "si", "service", "Service", "ted-service"] {
            assert!(
                discoverer.discover(&ProviderTag::new(provider)).is_none(),
                "{provider} should not be discovered"
            );
        }
        assert_eq!(
            discoverer.discover(&ProviderTag::new("ai")).unwrap().type_name(),
            "AiService"
        );
        assert_eq!(
            discoverer.discover(&ProviderTag::new("simul")).unwrap().type_name(),
            "SimulatedService"
        );
    }

    #[test]
    fn descriptors_without_constructors_are_ignored() {
        let discoverer = TypeDiscoverer::new(
            ServiceModule::new("local").with(ImplementationDescriptor::new("GroqService")),
        );
        assert!(discoverer.discover(&ProviderTag::new("groq")).is_none());
    }

    #[test]
    fn misses_are_memoized() {
        let discoverer = TypeDiscoverer::new(ServiceModule::new("local"));
        let tag = ProviderTag::new("unknown");

        assert!(discoverer.discover(&tag).is_none());
        assert!(discoverer.discover(&tag).is_none());
        assert_eq!(discoverer.scan_count(), 1);

        discoverer.forget(&tag);
        assert!(discoverer.discover(&tag).is_none());
        assert_eq!(discoverer.scan_count(), 2);
    }

    #[test]
    fn empty_provider_never_matches() {
        let discoverer =
            TypeDiscoverer::new(ServiceModule::new("local").with(descriptor("GroqService")));
        assert!(discoverer.discover(&ProviderTag::new("  ")).is_none());
    }

    #[test]
    fn adding_module_retries_previous_misses() {
        let discoverer = TypeDiscoverer::new(ServiceModule::new("local"));
        let tag = ProviderTag::new("mistral");
        assert!(discoverer.discover(&tag).is_none());

        discoverer.add_module(ServiceModule::new("plugin").with(descriptor("MistralService")));
        assert!(discoverer.discover(&tag).is_some());
    }
}
