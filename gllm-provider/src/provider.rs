//! The [`Provider`] capability-set trait.

use std::future::Future;

use futures::stream::BoxStream;
use gllm_types::{EmbeddingError, EmbeddingRequest, EmbeddingResponse, ProviderError};

use crate::types::{ProviderRequest, StreamEvent};

/// A boxed, owned stream of provider events.
pub type EventStream = BoxStream<'static, Result<StreamEvent, ProviderError>>;

/// An LLM provider family (OpenAI, Anthropic, Gemini, and the Volcengine
/// variant) that can stream a completion.
///
/// This trait uses RPITIT and is deliberately not object-safe: the driver
/// is generic over `P: Provider`, not a trait object. An erasure layer, if
/// one is ever needed at a plugin boundary, would live outside this trait.
pub trait Provider: Send + Sync {
    /// Open a streaming completion request, returning the event stream once
    /// the connection is established.
    fn stream(&self, request: ProviderRequest) -> impl Future<Output = Result<EventStream, ProviderError>> + Send;

    /// The model limits lookup key this provider reports for `request.model`.
    fn model_name<'a>(&self, request: &'a ProviderRequest) -> &'a str {
        &request.model
    }
}

/// A provider family that additionally exposes an embeddings endpoint.
///
/// Not every family implements this — it is ambient provider surface, not a
/// capability the turn driver depends on.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate one embedding vector per input string.
    fn embed(&self, request: EmbeddingRequest) -> impl Future<Output = Result<EmbeddingResponse, EmbeddingError>> + Send;
}
