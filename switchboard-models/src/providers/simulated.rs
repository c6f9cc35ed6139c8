//! Local simulated provider.
//!
//! Produces canned replies without any network access. It is discovered
//! through the built-in module like any late-bound implementation, which
//! makes it useful for demos and for exercising the resolution pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{AiService, UpdateCallback, stream_words};
use crate::registry::ImplementationDescriptor;
use crate::{Capabilities, Error, Result};

/// Provider name served by [`SimulatedService`].
pub const SIMULATED_PROVIDER: &str = "simulated";

/// Longest prompt excerpt echoed back.
const ECHO_LIMIT: usize = 80;

/// Canned-response service.
#[derive(Debug, Clone, Default)]
pub struct SimulatedService {
    model_name: String,
    capabilities: Capabilities,
    chunk_delay: Duration,
}

impl SimulatedService {
    pub fn new(model_name: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            model_name: model_name.into(),
            capabilities,
            chunk_delay: Duration::ZERO,
        }
    }

    /// Pause between streamed words.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Discovery descriptor: no credential, no-arg construction with
    /// model-name injection, or construction from resolver and capabilities.
    pub fn descriptor() -> ImplementationDescriptor {
        ImplementationDescriptor::new("SimulatedService")
            .without_credential()
            .with_default(|| Box::new(SimulatedService::default()))
            .with_resolver_and_capabilities(|_resolver, model, capabilities| {
                Ok(Arc::new(SimulatedService::new(
                    model.as_str(),
                    capabilities.clone(),
                )))
            })
    }

    fn respond(&self, prompt: &str) -> String {
        let excerpt: String = prompt.trim().chars().take(ECHO_LIMIT).collect();
        format!(
            "Simulated reply from {}: you said \"{excerpt}\"",
            self.model_name
        )
    }
}

#[async_trait]
impl AiService for SimulatedService {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn provider_name(&self) -> &str {
        SIMULATED_PROVIDER
    }

    async fn send_message(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        if !self.chunk_delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::OperationCancelled),
                _ = tokio::time::sleep(self.chunk_delay) => {}
            }
        }
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
        stream_words(&self.respond(prompt), self.chunk_delay, cancel, on_update).await
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn set_model_name(&mut self, model: &str) -> bool {
        self.model_name = model.to_string();
        true
    }
}
