//! Degraded service handed out when resolution fails.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{AiService, UpdateCallback, stream_words};
use crate::{Capabilities, Error, Result};

/// Provider name reported by [`FallbackService`].
pub const FALLBACK_PROVIDER: &str = "fallback";

/// Deterministic, network-free service.
///
/// Answers every prompt with a fixed notice naming the requested model so
/// callers keep working while the real provider is unavailable.
#[derive(Debug, Clone)]
pub struct FallbackService {
    model_name: String,
    capabilities: Capabilities,
}

impl FallbackService {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            capabilities: Capabilities::chat(),
        }
    }

    fn respond(&self, prompt: &str) -> String {
        let model = if self.model_name.is_empty() {
            "<unnamed>"
        } else {
            self.model_name.as_str()
        };
        format!(
            "Model {model} is not available right now. \
             This is a placeholder reply to a {} token prompt.",
            self.estimate_tokens(prompt)
        )
    }
}

#[async_trait]
impl AiService for FallbackService {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn provider_name(&self) -> &str {
        FALLBACK_PROVIDER
    }

    async fn send_message(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(Error::OperationCancelled);
        }
        Ok(self.respond(prompt))
    }

    async fn send_streamed_message(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
        on_update: UpdateCallback<'_>,
    ) -> Result<String> {
        stream_words(&self.respond(prompt), Duration::ZERO, cancel, on_update).await
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn set_model_name(&mut self, model: &str) -> bool {
        self.model_name = model.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_fallback_identity() {
        let service = FallbackService::new("groq/llama3-70b");
        assert_eq!(service.provider_name(), FALLBACK_PROVIDER);
        assert_eq!(service.model_name(), "groq/llama3-70b");
    }

    #[tokio::test]
    async fn responses_are_deterministic() {
        let service = FallbackService::new("x");
        let cancel = CancellationToken::new();

        let a = service.send_message("hello there", &cancel).await.unwrap();
        let b = service.send_message("hello there", &cancel).await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("Model x"));
    }

    #[tokio::test]
    async fn streamed_and_plain_responses_match() {
        let service = FallbackService::new("x");
        let cancel = CancellationToken::new();

        let plain = service.send_message("hi", &cancel).await.unwrap();
        let streamed = service
            .send_streamed_message("hi", &cancel, &|_| {})
            .await
            .unwrap();
        assert_eq!(plain, streamed);
    }

    #[tokio::test]
    async fn cancelled_call_fails_and_handle_stays_usable() {
        let service = FallbackService::new("x");
        let cancelled = CancellationToken::new();
        cancelled.cancel();

        assert!(matches!(
            service.send_message("hi", &cancelled).await,
            Err(Error::OperationCancelled)
        ));
        assert!(
            service
                .send_message("hi", &CancellationToken::new())
                .await
                .is_ok()
        );
    }
}
