//! Implementation descriptors and their construction shapes.

use std::fmt;
use std::sync::Arc;

use crate::auth::{ApiKey, CredentialResolver};
use crate::providers::AiService;
use crate::{Capabilities, ModelId, ProviderTag, Result};

/// Builds a service from the credential resolver and model identifier.
pub type ResolverConstructor =
    Arc<dyn Fn(Arc<CredentialResolver>, &ModelId) -> Result<Arc<dyn AiService>> + Send + Sync>;

/// Builds a service from the resolver, model identifier and capabilities.
pub type ResolverCapabilitiesConstructor = Arc<
    dyn Fn(Arc<CredentialResolver>, &ModelId, &Capabilities) -> Result<Arc<dyn AiService>>
        + Send
        + Sync,
>;

/// Builds a service from an already resolved credential.
pub type CredentialConstructor =
    Arc<dyn Fn(ApiKey, &ModelId) -> Result<Arc<dyn AiService>> + Send + Sync>;

/// Builds an unconfigured service; the model name is injected afterwards.
pub type DefaultConstructor = Arc<dyn Fn() -> Box<dyn AiService> + Send + Sync>;

/// One construction shape an implementation supports.
#[derive(Clone)]
pub enum Constructor {
    Resolver(ResolverConstructor),
    ResolverWithCapabilities(ResolverCapabilitiesConstructor),
    Credential(CredentialConstructor),
    Default(DefaultConstructor),
}

impl Constructor {
    /// Lower runs first.
    pub fn priority(&self) -> u8 {
        match self {
            Constructor::Resolver(_) => 0,
            Constructor::ResolverWithCapabilities(_) => 1,
            Constructor::Credential(_) => 2,
            Constructor::Default(_) => 3,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Constructor::Resolver(_) => "resolver",
            Constructor::ResolverWithCapabilities(_) => "resolver+capabilities",
            Constructor::Credential(_) => "credential",
            Constructor::Default(_) => "default",
        }
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constructor({})", self.shape())
    }
}

/// A named service implementation and the ways it can be built.
///
/// Constructors are kept sorted by [`Constructor::priority`], so the order
/// they are added in does not matter.
#[derive(Debug, Clone)]
pub struct ImplementationDescriptor {
    type_name: String,
    requires_credential: bool,
    constructors: Vec<Constructor>,
}

impl ImplementationDescriptor {
    /// Describe an implementation. Credentials are required unless
    /// [`without_credential`](Self::without_credential) is called.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            requires_credential: true,
            constructors: Vec::new(),
        }
    }

    pub fn without_credential(mut self) -> Self {
        self.requires_credential = false;
        self
    }

    pub fn with_resolver<F>(self, f: F) -> Self
    where
        F: Fn(Arc<CredentialResolver>, &ModelId) -> Result<Arc<dyn AiService>>
            + Send
            + Sync
            + 'static,
    {
        self.with_constructor(Constructor::Resolver(Arc::new(f)))
    }

    pub fn with_resolver_and_capabilities<F>(self, f: F) -> Self
    where
        F: Fn(Arc<CredentialResolver>, &ModelId, &Capabilities) -> Result<Arc<dyn AiService>>
            + Send
            + Sync
            + 'static,
    {
        self.with_constructor(Constructor::ResolverWithCapabilities(Arc::new(f)))
    }

    pub fn with_credential<F>(self, f: F) -> Self
    where
        F: Fn(ApiKey, &ModelId) -> Result<Arc<dyn AiService>> + Send + Sync + 'static,
    {
        self.with_constructor(Constructor::Credential(Arc::new(f)))
    }

    pub fn with_default<F>(self, f: F) -> Self
    where
        F: Fn() -> Box<dyn AiService> + Send + Sync + 'static,
    {
        self.with_constructor(Constructor::Default(Arc::new(f)))
    }

    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructors.push(constructor);
        self.constructors.sort_by_key(Constructor::priority);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn requires_credential(&self) -> bool {
        self.requires_credential
    }

    /// Constructors in priority order.
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Provider this implementation serves by naming convention:
    /// `GroqService` serves `groq`.
    pub fn provider_hint(&self) -> ProviderTag {
        let base = self
            .type_name
            .strip_suffix("Service")
            .unwrap_or(&self.type_name);
        ProviderTag::new(base)
    }
}
