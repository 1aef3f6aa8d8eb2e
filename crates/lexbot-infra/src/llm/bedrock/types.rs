//! AWS Bedrock request/response types.
//!
//! Bedrock uses the Claude Messages API JSON format with two
//! differences from the direct API:
//! - The model id is omitted from the request body (it goes in the URL path).
//! - An `anthropic_version` field is required in the request body.
//!
//! Message content is structured (text / tool_use / tool_result blocks);
//! the serde shapes in `lexbot_types::llm` already match the wire format,
//! so requests embed them directly.

use serde::{Deserialize, Serialize};

use lexbot_types::llm::ChatMessage;
use lexbot_types::tool::ToolSpec;

/// Request body for Bedrock Claude `invoke` / `invoke-with-response-stream`.
#[derive(Debug, Clone, Serialize)]
pub struct BedrockRequest {
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
}

/// A single chunk in the Bedrock event stream.
///
/// Bedrock wraps each model event inside `{"bytes":"<base64>"}`; the
/// base64-decoded payload is one Anthropic-style JSON event.
#[derive(Debug, Clone, Deserialize)]
pub struct BedrockStreamChunk {
    pub bytes: String,
}

// ---------------------------------------------------------------------------
// Decoded event payload structs
//
// Each model event names its kind in a `type` field. Payloads are
// deserialized into these structs per kind; shapes that do not parse
// are treated as "no event" by the decoder, never as stream errors.
// ---------------------------------------------------------------------------

/// Payload for `content_block_start`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlockStartPayload {
    pub index: u32,
    pub content_block: StartedBlock,
}

/// The block object inside a `content_block_start` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum StartedBlock {
    #[serde(rename = "text")]
    Text {},
    #[serde(rename = "tool_use")]
    ToolUse { id: String, name: String },
}

/// Payload for `content_block_delta`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlockDeltaPayload {
    pub index: u32,
    pub delta: BlockDelta,
}

/// Delta kinds within a content block.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum BlockDelta {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    #[serde(rename = "input_json_delta")]
    InputJsonDelta { partial_json: String },
}

/// Payload for `message_delta`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDeltaPayload {
    pub delta: MessageDeltaObj,
}

/// The delta object inside a `message_delta` event.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDeltaObj {
    pub stop_reason: Option<String>,
}

/// Non-streaming response from Bedrock Claude `invoke`.
#[derive(Debug, Clone, Deserialize)]
pub struct BedrockNonStreamResponse {
    pub content: Vec<ResponseBlock>,
    pub stop_reason: Option<String>,
}

/// A content block in a non-streaming response.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}
