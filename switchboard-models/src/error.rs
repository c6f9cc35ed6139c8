//! Error types for service resolution.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or calling a service.
///
/// Everything except [`Error::OperationCancelled`] and [`Error::Provider`] is a
/// resolution-time failure. The [`ServiceFactory`](crate::ServiceFactory)
/// absorbs those and hands out the fallback service instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration catalog could not be read.
    #[error("configuration catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// No configuration record matches the requested identifier.
    #[error("configuration not found: {0}")]
    ConfigurationNotFound(String),

    /// A configuration record exists but is disabled.
    #[error("model disabled: {0}")]
    ModelDisabled(String),

    /// Neither the registry nor discovery know the provider.
    #[error("no registered provider: {0}")]
    NoRegisteredProvider(String),

    /// An implementation was found but none of its constructors applied.
    #[error("no suitable constructor for {type_name} (provider {provider})")]
    NoSuitableConstructor { provider: String, type_name: String },

    /// No credential could be resolved for the provider.
    #[error("credentials not found for provider: {0}")]
    CredentialMissing(String),

    /// The caller cancelled an in-flight request.
    #[error("operation cancelled")]
    OperationCancelled,

    /// Failed to access the system keyring.
    #[error("keyring error: {0}")]
    Keyring(String),

    /// The credential layer does not accept writes.
    #[error("credential store '{0}' is read-only")]
    ReadOnlyStore(String),

    /// Runtime failure reported by a service implementation.
    #[error("provider error: {0}")]
    Provider(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error happened while resolving a service rather than
    /// while calling one.
    pub fn is_resolution_error(&self) -> bool {
        !matches!(self, Error::OperationCancelled | Error::Provider(_))
    }
}
