//! ModelProvider trait definition.
//!
//! This is the abstraction the engine drives. Uses RPITIT for `complete`
//! and `Pin<Box<dyn Stream>>` for `stream` (streams need to be
//! object-safe for the BoxModelProvider wrapper).

use std::pin::Pin;

use futures_util::Stream;

use lexbot_types::llm::{CompletionResponse, LlmError, ModelRequest, StreamEvent};

/// Trait for generative-model backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition) for
/// `complete`. The `stream` method returns a boxed stream because
/// streams need to be object-safe for `BoxModelProvider`.
///
/// Implementations live in lexbot-infra (e.g., `BedrockProvider`).
pub trait ModelProvider: Send + Sync {
    /// Human-readable provider name (e.g., "bedrock").
    fn name(&self) -> &str;

    /// Send a non-streaming request and receive the full response.
    fn complete(
        &self,
        request: &ModelRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;

    /// Send a streaming request. Returns a stream of decoded events.
    ///
    /// Obtaining the stream itself never fails eagerly; transport or
    /// protocol failures surface as the first `Err` item, which the
    /// engine treats as fatal for the request.
    fn stream(
        &self,
        request: ModelRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;
}
