//! Service handle trait and built-in implementations.
//!
//! The [`AiService`] trait is the capability contract every constructed
//! service exposes, whether it talks to a cloud provider or is the local
//! [`FallbackService`].
//!
//! # Example
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//! use switchboard_models::providers::AiService;
//!
//! async fn ask(service: &dyn AiService) -> switchboard_models::Result<String> {
//!     let cancel = CancellationToken::new();
//!     service
//!         .send_streamed_message("Hello!", &cancel, &|partial| println!("{partial}"))
//!         .await
//! }
//! ```

mod fallback;
mod simulated;

use std::time::Duration;

use async_trait::async_trait;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

pub use fallback::{FALLBACK_PROVIDER, FallbackService};
pub use simulated::{SIMULATED_PROVIDER, SimulatedService};

use crate::registry::ServiceModule;
use crate::{Capabilities, Error, Result};

/// Name of the module holding the built-in implementations.
pub const BUILTIN_MODULE: &str = "builtin";

/// Callback receiving the accumulated text of a streamed response.
pub type UpdateCallback<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Capability contract of a constructed service.
///
/// # Required Methods
///
/// - [`model_name`](AiService::model_name) / [`provider_name`](AiService::provider_name) - identity
/// - [`send_message`](AiService::send_message) - single response
/// - [`send_streamed_message`](AiService::send_streamed_message) - incremental response
/// - [`capabilities`](AiService::capabilities) - declared features
///
/// Cancellation must surface as [`Error::OperationCancelled`], never as a
/// partial success, and must leave the handle reusable.
#[async_trait]
pub trait AiService: Send + Sync {
    /// Model this handle was built for.
    fn model_name(&self) -> &str;

    /// Provider name, `fallback` for the degraded service.
    fn provider_name(&self) -> &str;

    /// Send a prompt and wait for the full response.
    async fn send_message(&self, prompt: &str, cancel: &CancellationToken) -> Result<String>;

    /// Send a prompt and report the growing response through `on_update`.
    ///
    /// `on_update` receives the text accumulated so far and must return
    /// quickly.
    async fn send_streamed_message(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
        on_update: UpdateCallback<'_>,
    ) -> Result<String>;

    /// Declared capabilities.
    fn capabilities(&self) -> Capabilities;

    /// Rough token count of `text`. Never performs I/O.
    fn estimate_tokens(&self, text: &str) -> usize {
        estimate_tokens(text)
    }

    /// Set the model name after no-argument construction.
    ///
    /// Returns `false` when the implementation has no writable model name.
    fn set_model_name(&mut self, _model: &str) -> bool {
        false
    }
}

/// Four characters per token, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// The module of built-in implementations searched first by discovery.
pub fn builtin_module() -> ServiceModule {
    ServiceModule::new(BUILTIN_MODULE).with(SimulatedService::descriptor())
}

/// Emit `text` word by word through `on_update`, honoring cancellation.
///
/// Returns the full text once every word was delivered.
pub(crate) async fn stream_words(
    text: &str,
    delay: Duration,
    cancel: &CancellationToken,
    on_update: UpdateCallback<'_>,
) -> Result<String> {
    let mut words = tokio_stream::iter(text.split_inclusive(' '));
    let mut accumulated = String::with_capacity(text.len());

    while let Some(word) = words.next().await {
        if cancel.is_cancelled() {
            return Err(Error::OperationCancelled);
        }
        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::OperationCancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        accumulated.push_str(word);
        on_update(&accumulated);
    }

    Ok(accumulated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[tokio::test]
    async fn stream_words_reports_growing_text() {
        let updates = Mutex::new(Vec::new());
        let cancel = CancellationToken::new();

        let text = stream_words("one two three", Duration::ZERO, &cancel, &|partial| {
            updates.lock().unwrap().push(partial.to_string());
        })
        .await
        .unwrap();

        assert_eq!(text, "one two three");
        assert_eq!(
            *updates.lock().unwrap(),
            vec!["one ", "one two ", "one two three"]
        );
    }

    #[tokio::test]
    async fn stream_words_stops_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = stream_words("one two", Duration::ZERO, &cancel, &|_| {}).await;
        assert!(matches!(result, Err(Error::OperationCancelled)));
    }

    #[test]
    fn builtin_module_contains_simulated_service() {
        let module = builtin_module();
        assert_eq!(module.name(), BUILTIN_MODULE);
        assert!(
            module
                .implementations()
                .iter()
                .any(|d| d.type_name() == "SimulatedService")
        );
    }
}
