//! Adapts [`Provider`] to the engine's [`CompletionClient`] seam.
//!
//! Applies the system prompt and request timeout, and turns every provider
//! failure into a [`TransportError`]. When streaming is on, tokens are shown
//! as they arrive and erased when the request ends, whether it completed,
//! failed or timed out, so the terminal can reprint it after validation.

use std::time::Duration;

use tracing::{debug, warn};

use super::client::Provider;
use crate::engine::CompletionClient;
use crate::error::TransportError;
use crate::output::StdoutRenderer;

/// Erases the streamed preview when dropped.
///
/// Dropped on success, on a stream error, and when the request future is
/// cancelled by the timeout.
struct StreamPreview {
    renderer: StdoutRenderer,
}

impl Drop for StreamPreview {
    fn drop(&mut self) {
        self.renderer.erase();
    }
}

/// A rig-core backed [`CompletionClient`].
pub struct RigCompletionClient {
    provider: Provider,
    system_prompt: Option<String>,
    timeout: Duration,
    stream: bool,
}

impl RigCompletionClient {
    pub fn new(
        provider: Provider,
        system_prompt: Option<String>,
        timeout: Duration,
        stream: bool,
    ) -> Self {
        Self {
            provider,
            system_prompt,
            timeout,
            stream,
        }
    }

    async fn request(&self, prompt: &str) -> anyhow::Result<String> {
        let system_prompt = self.system_prompt.as_deref();
        if !self.stream {
            return self.provider.prompt(prompt, system_prompt).await;
        }

        let mut preview = StreamPreview {
            renderer: StdoutRenderer::new(),
        };
        let response = self
            .provider
            .stream(prompt, system_prompt, &mut preview.renderer)
            .await;
        response
    }
}

#[async_trait::async_trait(?Send)]
impl CompletionClient for RigCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
        debug!(model = self.provider.model(), chars = prompt.len(), "sending prompt");
        match tokio::time::timeout(self.timeout, self.request(prompt)).await {
            Ok(Ok(response)) => {
                debug!(chars = response.len(), "response received");
                Ok(response)
            }
            Ok(Err(err)) => {
                warn!(error = %format!("{err:#}"), "provider request failed");
                Err(TransportError::from_provider_message(format!("{err:#}")))
            }
            Err(_) => Err(TransportError::Timeout(self.timeout.as_secs())),
        }
    }
}
