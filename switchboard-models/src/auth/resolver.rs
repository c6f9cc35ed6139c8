//! Canonical credential key derivation and resolution.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, instrument, warn};

use super::{ApiKey, CredentialStore};
use crate::{ModelConfiguration, ProviderTag, Result, MODEL_SEPARATOR};

/// Prefix of every canonical credential key.
pub const DEFAULT_KEY_PREFIX: &str = "AI_KEY_";

/// Resolves credentials for a provider/model pair.
///
/// # Key derivation
///
/// Each segment is uppercased and every non-alphanumeric character becomes
/// `_`. A model segment that repeats the `provider/` prefix has it stripped.
///
/// | provider | model        | key                       |
/// |----------|--------------|---------------------------|
/// | `groq`   | -            | `AI_KEY_GROQ`             |
/// | `groq`   | `llama3-70b` | `AI_KEY_GROQ_LLAMA3_70B`  |
/// | `groq`   | `groq/mixtral-8x7b` | `AI_KEY_GROQ_MIXTRAL_8X7B` |
///
/// # Caching
///
/// Successful lookups are cached by key without expiry, together with the
/// provider they were resolved for. Misses are not cached. Call
/// [`invalidate_provider`](Self::invalidate_provider) or
/// [`clear`](Self::clear) after changing a secret out of band.
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
    prefix: String,
    cache: DashMap<String, CachedSecret>,
}

#[derive(Clone)]
struct CachedSecret {
    secret: ApiKey,
    owner: ProviderTag,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn CredentialStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            cache: DashMap::new(),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Provider-level key, e.g. `AI_KEY_GROQ`.
    pub fn provider_key(&self, provider: &str) -> String {
        format!("{}{}", self.prefix, key_segment(provider))
    }

    /// Model-level key, e.g. `AI_KEY_GROQ_LLAMA3_70B`.
    ///
    /// Returns `None` when the model segment is empty.
    pub fn model_key(&self, provider: &str, model: &str) -> Option<String> {
        let model = strip_provider_prefix(provider, model);
        let segment = key_segment(model);
        if segment.is_empty() {
            return None;
        }
        Some(format!("{}_{}", self.provider_key(provider), segment))
    }

    /// Resolve a credential: model key first, then provider key.
    #[instrument(skip(self))]
    pub async fn resolve(&self, provider: &str, model: Option<&str>) -> Option<ApiKey> {
        let owner = ProviderTag::new(provider);
        if let Some(key) = model.and_then(|m| self.model_key(provider, m)) {
            if let Some(secret) = self.lookup(&key, &owner).await {
                return Some(secret);
            }
        }
        self.lookup(&self.provider_key(provider), &owner).await
    }

    /// Resolve a credential for a configuration record.
    ///
    /// The record's explicit credential key, if any, is tried first.
    pub async fn resolve_for(&self, config: &ModelConfiguration) -> Option<ApiKey> {
        if let Some(key) = config.credential_key.as_deref() {
            if let Some(secret) = self.lookup(key, &config.provider_tag()).await {
                return Some(secret);
            }
        }
        self.resolve(&config.provider, Some(&config.model)).await
    }

    /// Whether a provider-level credential exists.
    pub async fn has_credential(&self, provider: &str) -> bool {
        self.lookup(&self.provider_key(provider), &ProviderTag::new(provider))
            .await
            .is_some()
    }

    /// Whether any credential resolves for `provider`: one of `configs`
    /// (override or model key), or the provider-level key.
    pub async fn has_credential_for(
        &self,
        provider: &str,
        configs: &[ModelConfiguration],
    ) -> bool {
        for config in configs {
            if self.resolve_for(config).await.is_some() {
                return true;
            }
        }
        self.has_credential(provider).await
    }

    /// Store a secret under the canonical key and return the key name.
    pub async fn store_secret(
        &self,
        provider: &str,
        model: Option<&str>,
        secret: &str,
    ) -> Result<String> {
        let key = self.key_for(provider, model);
        self.store.set(&key, secret).await?;
        self.cache.insert(
            key.clone(),
            CachedSecret {
                secret: ApiKey::new(secret),
                owner: ProviderTag::new(provider),
            },
        );
        Ok(key)
    }

    /// Remove a secret stored under the canonical key.
    pub async fn remove_secret(&self, provider: &str, model: Option<&str>) -> Result<bool> {
        let key = self.key_for(provider, model);
        self.cache.remove(&key);
        self.store.delete(&key).await
    }

    /// Drop cached secrets belonging to `provider`, including secrets read
    /// through a configuration's own credential key.
    pub fn invalidate_provider(&self, provider: &ProviderTag) {
        let provider_key = self.provider_key(provider.as_str());
        let model_prefix = format!("{provider_key}_");
        self.cache.retain(|key, cached| {
            &cached.owner != provider && key != &provider_key && !key.starts_with(&model_prefix)
        });
    }

    /// Drop every cached secret.
    pub fn clear(&self) {
        self.cache.clear();
    }

    fn key_for(&self, provider: &str, model: Option<&str>) -> String {
        model
            .and_then(|m| self.model_key(provider, m))
            .unwrap_or_else(|| self.provider_key(provider))
    }

    async fn lookup(&self, key: &str, owner: &ProviderTag) -> Option<ApiKey> {
        if let Some(cached) = self.cache.get(key) {
            return Some(cached.secret.clone());
        }
        match self.store.get(key).await {
            Ok(Some(secret)) => {
                debug!(key, provider = %owner, "credential resolved from store");
                self.cache.insert(
                    key.to_string(),
                    CachedSecret {
                        secret: secret.clone(),
                        owner: owner.clone(),
                    },
                );
                Some(secret)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "credential lookup failed");
                None
            }
        }
    }
}

fn key_segment(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn strip_provider_prefix<'a>(provider: &str, model: &'a str) -> &'a str {
    match model.split_once(MODEL_SEPARATOR) {
        Some((head, rest)) if head.eq_ignore_ascii_case(provider.trim()) => rest,
        _ => model,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts reads against an inner store.
    struct CountingStore {
        inner: MemoryCredentialStore,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl CredentialStore for CountingStore {
        fn source(&self) -> crate::auth::CredentialSource {
            self.inner.source()
        }

        async fn get(&self, key: &str) -> Result<Option<ApiKey>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, secret: &str) -> Result<()> {
            self.inner.set(key, secret).await
        }

        async fn delete(&self, key: &str) -> Result<bool> {
            self.inner.delete(key).await
        }
    }

    fn resolver(store: MemoryCredentialStore) -> CredentialResolver {
        CredentialResolver::new(Arc::new(store), DEFAULT_KEY_PREFIX)
    }

    #[test]
    fn derives_canonical_keys() {
        let r = resolver(MemoryCredentialStore::new());
        assert_eq!(r.provider_key("groq"), "AI_KEY_GROQ");
        assert_eq!(r.provider_key("Open-AI"), "AI_KEY_OPEN_AI");
        assert_eq!(
            r.model_key("groq", "llama3-70b").as_deref(),
            Some("AI_KEY_GROQ_LLAMA3_70B")
        );
        assert_eq!(
            r.model_key("groq", "GROQ/mixtral-8x7b").as_deref(),
            Some("AI_KEY_GROQ_MIXTRAL_8X7B")
        );
        assert_eq!(
            r.model_key("openrouter", "meta/llama.3").as_deref(),
            Some("AI_KEY_OPENROUTER_META_LLAMA_3")
        );
        assert!(r.model_key("groq", "").is_none());
    }

    #[tokio::test]
    async fn model_key_takes_precedence() {
        let r = resolver(
            MemoryCredentialStore::new()
                .with_secret("AI_KEY_GROQ", "xyz")
                .with_secret("AI_KEY_GROQ_LLAMA3_70B", "abc"),
        );

        let key = r.resolve("groq", Some("llama3-70b")).await.unwrap();
        assert_eq!(key.expose_secret(), "abc");
    }

    #[tokio::test]
    async fn falls_back_to_provider_key() {
        let r = resolver(MemoryCredentialStore::new().with_secret("AI_KEY_GROQ", "xyz"));

        let key = r.resolve("groq", Some("mixtral")).await.unwrap();
        assert_eq!(key.expose_secret(), "xyz");
        assert_eq!(r.resolve("groq", None).await.unwrap().expose_secret(), "xyz");
    }

    #[tokio::test]
    async fn absent_when_nothing_stored() {
        let r = resolver(MemoryCredentialStore::new());
        assert!(r.resolve("groq", Some("llama3-70b")).await.is_none());
        assert!(!r.has_credential("groq").await);
    }

    #[tokio::test]
    async fn configuration_override_wins() {
        let r = resolver(
            MemoryCredentialStore::new()
                .with_secret("AI_KEY_GROQ", "xyz")
                .with_secret("MY_GROQ_KEY", "override"),
        );
        let config = ModelConfiguration::builder("groq", "llama3-70b")
            .credential_key("MY_GROQ_KEY")
            .build();

        assert_eq!(
            r.resolve_for(&config).await.unwrap().expose_secret(),
            "override"
        );
    }

    #[tokio::test]
    async fn hits_are_cached_until_invalidated() {
        let store = Arc::new(CountingStore {
            inner: MemoryCredentialStore::new().with_secret("AI_KEY_GROQ", "xyz"),
            reads: AtomicUsize::new(0),
        });
        let r = CredentialResolver::new(store.clone(), DEFAULT_KEY_PREFIX);

        r.resolve("groq", None).await.unwrap();
        r.resolve("groq", None).await.unwrap();
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);

        r.invalidate_provider(&ProviderTag::new("GROQ"));
        r.resolve("groq", None).await.unwrap();
        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_drops_override_secrets() {
        let store = Arc::new(MemoryCredentialStore::new().with_secret("MY_GROQ_KEY", "old"));
        let r = CredentialResolver::new(store.clone(), DEFAULT_KEY_PREFIX);
        let config = ModelConfiguration::builder("groq", "llama3-70b")
            .credential_key("MY_GROQ_KEY")
            .build();

        assert_eq!(r.resolve_for(&config).await.unwrap().expose_secret(), "old");
        store.set("MY_GROQ_KEY", "new").await.unwrap();
        assert_eq!(r.resolve_for(&config).await.unwrap().expose_secret(), "old");

        r.invalidate_provider(&ProviderTag::new("openai"));
        assert_eq!(r.resolve_for(&config).await.unwrap().expose_secret(), "old");

        r.invalidate_provider(&ProviderTag::new("Groq"));
        assert_eq!(r.resolve_for(&config).await.unwrap().expose_secret(), "new");
    }

    #[tokio::test]
    async fn model_key_alone_counts_as_credential() {
        let r = resolver(MemoryCredentialStore::new().with_secret("AI_KEY_GROQ_LLAMA3_70B", "abc"));
        let configs = vec![
            ModelConfiguration::builder("groq", "mixtral").build(),
            ModelConfiguration::builder("groq", "llama3-70b").build(),
        ];

        assert!(!r.has_credential("groq").await);
        assert!(r.has_credential_for("groq", &configs).await);
        assert!(!r.has_credential_for("groq", &configs[..1]).await);
    }

    #[tokio::test]
    async fn store_and_remove_secret_use_canonical_keys() {
        let r = resolver(MemoryCredentialStore::new());

        let key = r
            .store_secret("groq", Some("llama3-70b"), "abc")
            .await
            .unwrap();
        assert_eq!(key, "AI_KEY_GROQ_LLAMA3_70B");
        assert_eq!(
            r.resolve("groq", Some("llama3-70b"))
                .await
                .unwrap()
                .expose_secret(),
            "abc"
        );

        assert!(r.remove_secret("groq", Some("llama3-70b")).await.unwrap());
        assert!(r.resolve("groq", Some("llama3-70b")).await.is_none());
    }
}
