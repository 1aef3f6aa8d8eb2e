//! Outbound connection sink contract and framing constants.
//!
//! Frame order for a successful request: zero or more plain-text
//! fragments, the end-of-stream sentinel, then one JSON array of
//! citation objects. All sends are best-effort -- a failed push is
//! logged by the caller and never aborts the orchestration loop.

use lexbot_types::chat::SourceDocument;
use lexbot_types::error::SinkError;

/// Fixed sentinel marking the end of generated text.
pub const EOF_SENTINEL: &str = "!<|EOF_STREAM|>!";

/// Prefix for user-visible error frames.
pub const ERROR_PREFIX: &str = "<!ERROR!>: ";

/// Trait for the client connection.
///
/// Implementations live in lexbot-api (e.g., `WebSocketSink`).
pub trait ConnectionSink: Send {
    /// Deliver one text fragment.
    fn push(
        &mut self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;

    /// Deliver the end-of-stream sentinel.
    fn push_eof(&mut self) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;

    /// Deliver the deduplicated citation list as the final frame.
    fn push_sources(
        &mut self,
        sources: &[SourceDocument],
    ) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;

    /// Close the connection.
    fn close(&mut self) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;
}

/// Serialize a citation list to the wire format: a JSON array of
/// `{title, uri}` objects.
pub fn serialize_sources(sources: &[SourceDocument]) -> String {
    serde_json::to_string(sources).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_sources() {
        let sources = vec![SourceDocument {
            title: "chapter-1.txt (Bedrock Knowledge Base)".to_string(),
            uri: "doc/1".to_string(),
        }];
        let json = serialize_sources(&sources);
        assert_eq!(
            json,
            r#"[{"title":"chapter-1.txt (Bedrock Knowledge Base)","uri":"doc/1"}]"#
        );
    }

    #[test]
    fn test_serialize_empty_sources() {
        assert_eq!(serialize_sources(&[]), "[]");
    }
}
