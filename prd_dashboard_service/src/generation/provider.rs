use async_trait::async_trait;

use crate::{
    error::CallError,
    generation::types::{GenerationRequest, GenerationResponse},
};

/// A single round trip to a text-generation service.
///
/// Implementations classify failures into [`CallError`] variants; the
/// orchestrator decides whether to retry from that classification alone.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &GenerationRequest) -> Result<GenerationResponse, CallError>;

    fn provider_name(&self) -> &str;

    /// Whether a credential is available right now. Does not make a call.
    fn has_credential(&self) -> bool {
        true
    }
}
