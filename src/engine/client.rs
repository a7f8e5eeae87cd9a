//! The completion-service seam.

use crate::error::TransportError;

/// A service that turns a prompt into a response.
///
/// Implementations own their timeouts: a request that takes too long fails
/// with [`TransportError::Timeout`]. Returning `Ok` with malformed text is
/// not a transport failure; the validator deals with it.
#[async_trait::async_trait(?Send)]
pub trait CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, TransportError>;
}

#[async_trait::async_trait(?Send)]
impl<C: CompletionClient + ?Sized> CompletionClient for &C {
    async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
        (**self).complete(prompt).await
    }
}
