//! Service resolution for switchboard.
//!
//! This crate turns a model identifier into a ready-to-call service:
//! - Configuration catalog with a TTL-cached resolver
//! - Credential resolution across keyring, environment and memory stores
//! - Provider registry with late-bound implementation discovery
//! - A factory that never fails, degrading to a fallback service
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   ServiceFactory                     │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  │
//! │  │Configuration│  │   Service   │  │   Service   │  │
//! │  │  Resolver   │  │  Registry   │  │ Instantiator│  │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────┘
//!          │                 │                 │
//!          ▼                 ▼                 ▼
//!   ConfigurationCatalog  TypeDiscoverer  CredentialResolver
//!                                              │
//!                                              ▼
//!                                       CredentialStore
//!                                 (Keyring + Env + Memory)
//! ```

mod cache;
mod config;
mod error;
mod factory;
mod types;

pub mod auth;
pub mod catalog;
pub mod providers;
pub mod registry;

pub use cache::{CacheEntry, TtlCache};
pub use config::{DEFAULT_KEYRING_SERVICE, DEFAULT_TTL_SECS, FactoryConfig};
pub use error::{Error, Result};
pub use factory::{FactoryState, ServiceFactory, ServiceFactoryBuilder};
pub use types::{
    Capabilities, MODEL_SEPARATOR, ModelConfiguration, ModelConfigurationBuilder, ModelId,
    ProviderTag,
};
