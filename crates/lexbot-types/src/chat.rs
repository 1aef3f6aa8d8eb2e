//! Conversation turn, citation, and session wire types for Lexbot.
//!
//! Field names on the serde derives match the session-service RPC
//! contract and the inbound WebSocket payload; they are part of the
//! external interface, not an internal choice.

use serde::{Deserialize, Serialize};

use std::fmt;

/// A cited source document.
///
/// Within one answer no two entries share the same `uri`; the
/// first-seen `title` for a uri is the one retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub title: String,
    pub uri: String,
}

/// One completed user/assistant exchange, immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    pub chatbot: String,
    #[serde(default)]
    pub metadata: Vec<SourceDocument>,
}

/// Inbound chat request carried in the `data` field of a WebSocket frame.
///
/// `chat_history` is the client's view of prior turns; only the last two
/// are used to seed model context.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundChatRequest {
    #[serde(rename = "userMessage")]
    pub user_message: String,
    pub user_id: String,
    pub session_id: String,
    #[serde(rename = "chatHistory", default)]
    pub chat_history: Vec<ConversationTurn>,
}

/// Which session-service write operation to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOperation {
    AddSession,
    UpdateSession,
}

impl fmt::Display for SaveOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveOperation::AddSession => write!(f, "add_session"),
            SaveOperation::UpdateSession => write!(f, "update_session"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_request_field_names() {
        let json = r#"{
            "userMessage": "What is the copay?",
            "user_id": "u-1",
            "session_id": "s-1",
            "chatHistory": [
                {"user": "hi", "chatbot": "hello", "metadata": []}
            ]
        }"#;
        let req: InboundChatRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.user_message, "What is the copay?");
        assert_eq!(req.user_id, "u-1");
        assert_eq!(req.session_id, "s-1");
        assert_eq!(req.chat_history.len(), 1);
        assert_eq!(req.chat_history[0].chatbot, "hello");
    }

    #[test]
    fn test_inbound_request_history_defaults_empty() {
        let json = r#"{"userMessage": "hi", "user_id": "u", "session_id": "s"}"#;
        let req: InboundChatRequest = serde_json::from_str(json).unwrap();
        assert!(req.chat_history.is_empty());
    }

    #[test]
    fn test_conversation_turn_metadata_defaults_empty() {
        let json = r#"{"user": "q", "chatbot": "a"}"#;
        let turn: ConversationTurn = serde_json::from_str(json).unwrap();
        assert!(turn.metadata.is_empty());
    }

    #[test]
    fn test_save_operation_wire_names() {
        assert_eq!(SaveOperation::AddSession.to_string(), "add_session");
        assert_eq!(SaveOperation::UpdateSession.to_string(), "update_session");
        let json = serde_json::to_string(&SaveOperation::AddSession).unwrap();
        assert_eq!(json, "\"add_session\"");
    }

    #[test]
    fn test_source_document_serde() {
        let doc = SourceDocument {
            title: "chapter-12.txt (Bedrock Knowledge Base)".to_string(),
            uri: "s3://corpus/acts/1998/chapter-12.txt".to_string(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: SourceDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, doc);
    }
}
