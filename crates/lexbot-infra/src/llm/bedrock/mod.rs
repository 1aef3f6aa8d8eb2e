//! AWS Bedrock Claude provider: request types, event-stream decoding,
//! and the [`client::BedrockProvider`] implementation of `ModelProvider`.

pub mod client;
pub mod streaming;
pub mod types;

pub use client::BedrockProvider;
