//! Core types for service resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the provider and model parts of a composite identifier.
pub const MODEL_SEPARATOR: char = '/';

/// Identifier of a model, commonly in `provider/model` format.
///
/// The identifier is opaque: callers may pass anything, including strings
/// without a separator. [`ModelId::split`] only succeeds for well-formed
/// composites.
///
/// # Examples
///
/// ```
/// use switchboard_models::ModelId;
///
/// let id = ModelId::new("groq", "llama3-70b");
/// assert_eq!(id.split(), Some(("groq", "llama3-70b")));
/// assert_eq!(id.to_string(), "groq/llama3-70b");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Create a new model ID from provider and model name.
    pub fn new(provider: &str, model: &str) -> Self {
        Self(format!("{provider}{MODEL_SEPARATOR}{model}"))
    }

    /// Split into `(provider, model)` if both parts are non-empty.
    pub fn split(&self) -> Option<(&str, &str)> {
        let (provider, model) = self.0.split_once(MODEL_SEPARATOR)?;
        if provider.is_empty() || model.is_empty() {
            return None;
        }
        Some((provider, model))
    }

    /// Get the provider portion of the ID, if it is a composite.
    pub fn provider(&self) -> Option<&str> {
        self.split().map(|(provider, _)| provider)
    }

    /// Get the full ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Canonical provider name.
///
/// Provider names are compared case-insensitively everywhere, so they are
/// normalized once here (trimmed, lowercased) and compared as plain strings
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ProviderTag(String);

impl ProviderTag {
    /// Normalize a provider name.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Get the canonical name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name an implementation for this provider is expected to carry.
    ///
    /// Each alphanumeric segment is capitalized and `Service` is appended:
    /// `groq` becomes `GroqService`, `open-ai` becomes `OpenAiService`.
    pub fn implementation_name(&self) -> String {
        let mut name = String::with_capacity(self.0.len() + 7);
        for segment in self.0.split(|c: char| !c.is_ascii_alphanumeric()) {
            let mut chars = segment.chars();
            if let Some(first) = chars.next() {
                name.extend(first.to_uppercase());
                name.push_str(chars.as_str());
            }
        }
        name.push_str("Service");
        name
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProviderTag {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<ProviderTag> for String {
    fn from(tag: ProviderTag) -> Self {
        tag.0
    }
}

/// Declared feature support of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Maximum tokens the model will generate.
    pub max_tokens: u32,
    /// Supports streaming responses.
    pub streaming: bool,
    /// Supports tool/function calling.
    pub function_calling: bool,
    /// Default sampling temperature.
    pub temperature: f32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            streaming: false,
            function_calling: false,
            temperature: 0.7,
        }
    }
}

impl Capabilities {
    /// Capabilities of a chat model that streams.
    pub fn chat() -> Self {
        Self {
            streaming: true,
            ..Default::default()
        }
    }

    /// Capabilities of a chat model with streaming and tool calling.
    pub fn full() -> Self {
        Self {
            streaming: true,
            function_calling: true,
            ..Default::default()
        }
    }
}

/// Configuration record for a single model, as read from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfiguration {
    /// Unique model identifier.
    pub identifier: ModelId,
    /// Provider name as stored in the catalog.
    pub provider: String,
    /// Provider-side model id (e.g. `llama3-70b`).
    pub model: String,
    /// Exact credential key to try before the canonical keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_key: Option<String>,
    /// Declared capabilities.
    #[serde(default)]
    pub capabilities: Capabilities,
    /// Disabled records are never instantiated.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl ModelConfiguration {
    /// Create a new configuration builder.
    pub fn builder(provider: &str, model: &str) -> ModelConfigurationBuilder {
        ModelConfigurationBuilder::new(provider, model)
    }

    /// Canonical provider tag of this record.
    pub fn provider_tag(&self) -> ProviderTag {
        ProviderTag::new(&self.provider)
    }
}

/// Builder for constructing `ModelConfiguration`.
#[derive(Debug)]
pub struct ModelConfigurationBuilder {
    identifier: Option<String>,
    provider: String,
    model: String,
    credential_key: Option<String>,
    capabilities: Capabilities,
    enabled: bool,
}

impl ModelConfigurationBuilder {
    fn new(provider: &str, model: &str) -> Self {
        Self {
            identifier: None,
            provider: provider.to_string(),
            model: model.to_string(),
            credential_key: None,
            capabilities: Capabilities::default(),
            enabled: true,
        }
    }

    /// Use an identifier other than `provider/model`.
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Set an explicit credential key.
    pub fn credential_key(mut self, key: impl Into<String>) -> Self {
        self.credential_key = Some(key.into());
        self
    }

    /// Set the model capabilities.
    pub fn capabilities(mut self, caps: Capabilities) -> Self {
        self.capabilities = caps;
        self
    }

    /// Set the maximum output tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.capabilities.max_tokens = tokens;
        self
    }

    /// Mark the record as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Build the `ModelConfiguration`.
    pub fn build(self) -> ModelConfiguration {
        let identifier = match self.identifier {
            Some(id) => ModelId::from(id),
            None => ModelId::new(&self.provider, &self.model),
        };
        ModelConfiguration {
            identifier,
            provider: self.provider,
            model: self.model,
            credential_key: self.credential_key,
            capabilities: self.capabilities,
            enabled: self.enabled,
        }
    }
}
