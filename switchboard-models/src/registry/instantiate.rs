//! Building service handles from implementation descriptors.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::descriptor::{Constructor, ImplementationDescriptor};
use crate::auth::CredentialResolver;
use crate::providers::AiService;
use crate::{Error, ModelConfiguration, Result};

/// Tries an implementation's constructors in priority order.
///
/// 1. resolver + model identifier
/// 2. resolver + model identifier + capabilities
/// 3. resolved credential + model identifier (skipped without a credential)
/// 4. no arguments, then model-name injection when supported
///
/// The first constructor that succeeds wins. A failing constructor is
/// logged and the next one is tried.
pub struct ServiceInstantiator {
    credentials: Arc<CredentialResolver>,
}

impl ServiceInstantiator {
    pub fn new(credentials: Arc<CredentialResolver>) -> Self {
        Self { credentials }
    }

    #[instrument(skip_all, fields(type_name = descriptor.type_name(), model = %config.identifier))]
    pub async fn instantiate(
        &self,
        descriptor: &ImplementationDescriptor,
        config: &ModelConfiguration,
    ) -> Result<Arc<dyn AiService>> {
        let model = &config.identifier;

        for constructor in descriptor.constructors() {
            let attempt = match constructor {
                Constructor::Resolver(f) => f(Arc::clone(&self.credentials), model),
                Constructor::ResolverWithCapabilities(f) => {
                    f(Arc::clone(&self.credentials), model, &config.capabilities)
                }
                Constructor::Credential(f) => match self.credentials.resolve_for(config).await {
                    Some(key) => f(key, model),
                    None => {
                        debug!(shape = constructor.shape(), "skipped: no credential");
                        continue;
                    }
                },
                Constructor::Default(f) => {
                    let mut service = f();
                    if !service.set_model_name(model.as_str()) {
                        debug!("implementation has no writable model name");
                    }
                    Ok(Arc::from(service))
                }
            };

            match attempt {
                Ok(service) => {
                    debug!(shape = constructor.shape(), "constructed service");
                    return Ok(service);
                }
                Err(e) => debug!(shape = constructor.shape(), error = %e, "constructor failed"),
            }
        }

        Err(Error::NoSuitableConstructor {
            provider: config.provider.clone(),
            type_name: descriptor.type_name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{DEFAULT_KEY_PREFIX, MemoryCredentialStore};
    use crate::providers::{FallbackService, SimulatedService};
    use crate::Capabilities;

    fn instantiator(store: MemoryCredentialStore) -> ServiceInstantiator {
        ServiceInstantiator::new(Arc::new(CredentialResolver::new(
            Arc::new(store),
            DEFAULT_KEY_PREFIX,
        )))
    }

    fn groq_config() -> ModelConfiguration {
        ModelConfiguration::builder("groq", "llama3-70b").build()
    }

    #[tokio::test]
    async fn resolver_shape_wins_over_others() {
        let descriptor = ImplementationDescriptor::new("GroqService")
            .with_default(|| Box::new(FallbackService::new("default")))
            .with_resolver(|_, model| Ok(Arc::new(FallbackService::new(format!("resolver:{model}")))));

        let service = instantiator(MemoryCredentialStore::new())
            .instantiate(&descriptor, &groq_config())
            .await
            .unwrap();
        assert_eq!(service.model_name(), "resolver:groq/llama3-70b");
    }

    #[tokio::test]
    async fn failing_constructor_falls_through() {
        let descriptor = ImplementationDescriptor::new("GroqService")
            .with_resolver(|_, _| Err(Error::Provider("bad".into())))
            .with_resolver_and_capabilities(|_, model, caps| {
                Ok(Arc::new(SimulatedService::new(model.as_str(), caps.clone())))
            });
        let config = ModelConfiguration::builder("groq", "llama3-70b")
            .capabilities(Capabilities::full())
            .build();

        let service = instantiator(MemoryCredentialStore::new())
            .instantiate(&descriptor, &config)
            .await
            .unwrap();
        assert!(service.capabilities().function_calling);
    }

    #[tokio::test]
    async fn credential_shape_needs_a_credential() {
        let descriptor = ImplementationDescriptor::new("GroqService").with_credential(|key, model| {
            Ok(Arc::new(FallbackService::new(format!(
                "{}:{model}",
                key.expose_secret()
            ))))
        });

        let missing = instantiator(MemoryCredentialStore::new())
            .instantiate(&descriptor, &groq_config())
            .await;
        assert!(matches!(missing, Err(Error::NoSuitableConstructor { .. })));

        let service = instantiator(MemoryCredentialStore::new().with_secret("AI_KEY_GROQ", "xyz"))
            .instantiate(&descriptor, &groq_config())
            .await
            .unwrap();
        assert_eq!(service.model_name(), "xyz:groq/llama3-70b");
    }

    #[tokio::test]
    async fn default_shape_injects_model_name() {
        let descriptor = ImplementationDescriptor::new("SimulatedService")
            .with_default(|| Box::new(SimulatedService::default()));

        let service = instantiator(MemoryCredentialStore::new())
            .instantiate(&descriptor, &groq_config())
            .await
            .unwrap();
        assert_eq!(service.model_name(), "groq/llama3-70b");
    }

    #[tokio::test]
    async fn no_constructors_is_an_error() {
        let descriptor = ImplementationDescriptor::new("EmptyService");
        let err = instantiator(MemoryCredentialStore::new())
            .instantiate(&descriptor, &groq_config())
            .await
            .err()
            .expect("expected instantiate to fail");
        assert!(matches!(
            err,
            Error::NoSuitableConstructor { ref type_name, .. } if type_name == "EmptyService"
        ));
    }
}
