use thiserror::Error;

/// Errors from the semantic retrieval backend.
///
/// These never reach the client: the retrieval collaborator converts
/// them into a degraded-but-valid fallback result so an answer can
/// still be produced.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("retrieval backend error: {0}")]
    Backend(String),

    #[error("retrieval response malformed: {0}")]
    Malformed(String),
}

/// Errors from the statute chapter store.
#[derive(Debug, Error)]
pub enum StatuteError {
    #[error("invalid chapter number: '{0}'")]
    InvalidChapter(String),

    #[error("statute backend error: {0}")]
    Backend(String),
}

/// Errors from the session-service RPC.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session service request failed: {0}")]
    Http(String),

    #[error("session service response malformed: {0}")]
    Protocol(String),
}

/// Errors delivering frames to the client connection.
///
/// Sends are best-effort; callers log these and continue.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("connection closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),
}

/// Configuration errors, surfaced before any model call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("knowledge base id is not configured")]
    MissingKnowledgeBaseId,

    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statute_error_display() {
        let err = StatuteError::InvalidChapter("twelve".to_string());
        assert_eq!(err.to_string(), "invalid chapter number: 'twelve'");
    }

    #[test]
    fn test_session_store_error_display() {
        let err = SessionStoreError::Protocol("missing body".to_string());
        assert!(err.to_string().contains("missing body"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingKnowledgeBaseId;
        assert_eq!(err.to_string(), "knowledge base id is not configured");
    }
}
