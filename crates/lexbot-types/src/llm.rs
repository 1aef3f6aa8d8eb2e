//! Model request/response types for Lexbot.
//!
//! These types model the data shapes for generative-model interactions:
//! structured conversation messages, streaming events decoded from the
//! model's incremental output, and error handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tool::ToolSpec;

/// Role of a message in a model conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One block of content within a conversation message.
///
/// History entries hold either plain text or structured tool-use /
/// tool-result blocks. A `ToolResult` must reference the `id` of a
/// `ToolUse` block appearing earlier in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// A single role-tagged message in a model conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

impl ChatMessage {
    /// Build a message holding a single text block.
    pub fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }
}

/// Request to a model provider.
///
/// The provider owns the model identifier; the request carries only the
/// conversation payload and sampling parameters.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub messages: Vec<ChatMessage>,
    pub system: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    /// Tool definitions exposed to the model for this request.
    pub tools: Vec<ToolSpec>,
}

/// Response from a non-streaming model invocation.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub stop_reason: Option<StopReason>,
}

/// Reason why the model stopped generating in the current round.
///
/// Only `ToolUse` continues the orchestration loop; every other reason
/// (including ones this enum does not know by name) is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    Other(String),
}

impl StopReason {
    /// Parse a wire stop-reason string. Unknown values are preserved
    /// rather than rejected -- they still terminate the loop.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            other => StopReason::Other(other.to_string()),
        }
    }

    /// True when the model is waiting on tool results before resuming.
    pub fn is_tool_use(&self) -> bool {
        matches!(self, StopReason::ToolUse)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::ToolUse => write!(f, "tool_use"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::StopSequence => write!(f, "stop_sequence"),
            StopReason::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Events decoded from the model's incremental output stream.
///
/// Exactly one classification applies per decoded frame; frames that
/// match none of these shapes decode to no event at all.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A fragment of answer text.
    TextDelta { text: String },

    /// The model opened a tool-use block.
    ToolUseStart { id: String, name: String },

    /// A fragment of the current tool call's JSON input.
    ToolInputDelta { partial_json: String },

    /// The model stopped generating for this round.
    Stop { reason: StopReason },
}

/// Errors from model provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("rate limited")]
    RateLimited,

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_stop_reason_from_wire_known() {
        assert_eq!(StopReason::from_wire("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_wire("tool_use"), StopReason::ToolUse);
        assert_eq!(StopReason::from_wire("max_tokens"), StopReason::MaxTokens);
        assert_eq!(
            StopReason::from_wire("stop_sequence"),
            StopReason::StopSequence
        );
    }

    #[test]
    fn test_stop_reason_from_wire_unknown_preserved() {
        let reason = StopReason::from_wire("pause_turn");
        assert_eq!(reason, StopReason::Other("pause_turn".to_string()));
        assert!(!reason.is_tool_use());
        assert_eq!(reason.to_string(), "pause_turn");
    }

    #[test]
    fn test_only_tool_use_continues() {
        assert!(StopReason::ToolUse.is_tool_use());
        for terminal in [
            StopReason::EndTurn,
            StopReason::MaxTokens,
            StopReason::StopSequence,
            StopReason::Other("guardrail".to_string()),
        ] {
            assert!(!terminal.is_tool_use());
        }
    }

    #[test]
    fn test_content_block_serde_tagging() {
        let block = ContentBlock::ToolUse {
            id: "toolu_1".to_string(),
            name: "query_db".to_string(),
            input: serde_json::json!({"query": "copay"}),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "tool_use");
        assert_eq!(json["id"], "toolu_1");
        assert_eq!(json["input"]["query"], "copay");
    }

    #[test]
    fn test_tool_result_serde() {
        let block = ContentBlock::ToolResult {
            tool_use_id: "toolu_1".to_string(),
            content: "chapter text".to_string(),
        };
        let json = serde_json::to_string(&block).unwrap();
        let parsed: ContentBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, block);
    }

    #[test]
    fn test_chat_message_text_helper() {
        let msg = ChatMessage::text(MessageRole::User, "hello");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content.len(), 1);
        match &msg.content[0] {
            ContentBlock::Text { text } => assert_eq!(text, "hello"),
            other => panic!("expected Text, got {other:?}"),
        }
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Provider {
            message: "HTTP 500".to_string(),
        };
        assert_eq!(err.to_string(), "provider error: HTTP 500");
    }
}
