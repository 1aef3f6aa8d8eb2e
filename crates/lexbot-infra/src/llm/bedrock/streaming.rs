//! AWS Bedrock event stream parsing and model-event decoding.
//!
//! Bedrock's `invoke-with-response-stream` returns the AWS event stream
//! binary protocol (not SSE). Each frame has the layout:
//!
//! ```text
//! [total_len:4][headers_len:4][prelude_crc:4][headers...][payload...][msg_crc:4]
//! ```
//!
//! For `chunk` frames the payload is `{"bytes":"<base64>"}` where the
//! base64-decoded content is one Anthropic-style JSON event. Those
//! events are classified into the engine's [`StreamEvent`] enum by
//! [`decode_model_event`]; shapes the decoder does not recognize decode
//! to no event rather than failing the stream.

use std::pin::Pin;

use base64::Engine;
use futures_util::{Stream, StreamExt};
use secrecy::ExposeSecret;

use lexbot_types::llm::{LlmError, StopReason, StreamEvent};

use super::types::{
    BedrockStreamChunk, BlockDelta, ContentBlockDeltaPayload, ContentBlockStartPayload,
    MessageDeltaPayload, StartedBlock,
};

/// Parsed header from a binary event stream frame.
#[derive(Debug)]
struct FrameHeader {
    name: String,
    value: String,
}

/// Parse binary headers from an event stream frame.
///
/// Header format: `[name_len:1][name:N][type:1][value_len:2][value:M]`.
/// Only type 7 (string) is handled, which is what Bedrock sends; an
/// unknown type ends parsing since its length is unknowable.
fn parse_frame_headers(mut buf: &[u8]) -> Vec<FrameHeader> {
    let mut headers = Vec::new();
    while let Some((&name_len, rest)) = buf.split_first() {
        let name_len = name_len as usize;
        if rest.len() < name_len + 1 {
            break;
        }
        let name = String::from_utf8_lossy(&rest[..name_len]).to_string();
        let header_type = rest[name_len];
        buf = &rest[name_len + 1..];

        if header_type != 7 {
            break;
        }
        if buf.len() < 2 {
            break;
        }
        let value_len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        buf = &buf[2..];
        if buf.len() < value_len {
            break;
        }
        let value = String::from_utf8_lossy(&buf[..value_len]).to_string();
        buf = &buf[value_len..];
        headers.push(FrameHeader { name, value });
    }
    headers
}

/// Parse one binary frame from the buffer.
///
/// Returns `Some((event_type, payload, bytes_consumed))` for a complete
/// frame, or `None` while the buffer holds only a partial frame.
pub fn parse_event_stream_frame(buf: &[u8]) -> Option<(String, Vec<u8>, usize)> {
    if buf.len() < 12 {
        return None;
    }

    let total_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    let headers_len = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;
    // bytes 8..12 = prelude CRC (skipped)

    if buf.len() < total_len {
        return None;
    }

    let headers_start = 12;
    let headers_end = headers_start + headers_len;
    let payload_end = total_len.checked_sub(4)?; // trailing message CRC

    if headers_end > payload_end || payload_end > buf.len() {
        return None;
    }

    let headers = parse_frame_headers(&buf[headers_start..headers_end]);
    let payload = buf[headers_end..payload_end].to_vec();

    let event_type = headers
        .iter()
        .find(|h| h.name == ":event-type" || h.name == ":exception-type")
        .map(|h| h.value.clone())
        .unwrap_or_default();

    Some((event_type, payload, total_len))
}

/// Classify one decoded model event by structural shape.
///
/// Exactly one classification applies per event:
/// - a text delta, a tool-input delta, the start of a tool-use block,
///   or a terminal stop signal.
///
/// Everything else -- `message_start`, `content_block_stop`, pings,
/// text block starts, events of unknown shape -- is no event. This is
/// deterministic and side-effect free.
pub fn decode_model_event(event: &serde_json::Value) -> Option<StreamEvent> {
    match event.get("type")?.as_str()? {
        "content_block_delta" => {
            let payload: ContentBlockDeltaPayload =
                serde_json::from_value(event.clone()).ok()?;
            match payload.delta {
                BlockDelta::TextDelta { text } => Some(StreamEvent::TextDelta { text }),
                BlockDelta::InputJsonDelta { partial_json } => {
                    Some(StreamEvent::ToolInputDelta { partial_json })
                }
            }
        }

        "content_block_start" => {
            let payload: ContentBlockStartPayload =
                serde_json::from_value(event.clone()).ok()?;
            match payload.content_block {
                StartedBlock::ToolUse { id, name } => {
                    Some(StreamEvent::ToolUseStart { id, name })
                }
                StartedBlock::Text {} => None,
            }
        }

        "message_delta" => {
            let payload: MessageDeltaPayload = serde_json::from_value(event.clone()).ok()?;
            let reason = payload.delta.stop_reason?;
            Some(StreamEvent::Stop {
                reason: StopReason::from_wire(&reason),
            })
        }

        _ => None,
    }
}

/// Create a streaming connection to the Bedrock Runtime API.
///
/// Sends the HTTP request, checks the response status, then reads the
/// binary event stream body, buffering until whole frames are
/// available. Each `chunk` frame is base64-decoded and classified by
/// [`decode_model_event`]; exception frames become stream errors.
pub fn create_bedrock_stream(
    client: &reqwest::Client,
    url: &str,
    body: super::types::BedrockRequest,
    api_key: &secrecy::SecretString,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
    let client = client.clone();
    let url = url.to_string();
    let bearer = api_key.expose_secret().to_string();

    Box::pin(async_stream::try_stream! {
        let response = client
            .post(&url)
            .header("Authorization", format!("Bearer {bearer}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %error_body, "Bedrock stream API error response");
            let err = match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited,
                529 => LlmError::Overloaded(error_body),
                s if s >= 500 => LlmError::Provider {
                    message: format!("Bedrock server error HTTP {status}: {error_body}"),
                },
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            };
            Err::<(), LlmError>(err)?;
            return;
        }

        let mut byte_stream = response.bytes_stream();
        let mut buffer = Vec::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let bytes = chunk_result
                .map_err(|e| LlmError::Stream(format!("response body read: {e}")))?;
            buffer.extend_from_slice(&bytes);

            // Drain every complete frame currently in the buffer.
            while let Some((event_type, payload, consumed)) = parse_event_stream_frame(&buffer) {
                buffer.drain(..consumed);

                if event_type == "chunk" {
                    let chunk: BedrockStreamChunk = serde_json::from_slice(&payload)
                        .map_err(|e| LlmError::Deserialization(format!("chunk wrapper: {e}")))?;
                    let decoded = base64::engine::general_purpose::STANDARD
                        .decode(&chunk.bytes)
                        .map_err(|e| LlmError::Deserialization(format!("base64 decode: {e}")))?;
                    let event: serde_json::Value = serde_json::from_slice(&decoded)
                        .map_err(|e| LlmError::Deserialization(format!("inner json: {e}")))?;

                    if let Some(stream_event) = decode_model_event(&event) {
                        yield stream_event;
                    }
                } else if event_type.ends_with("Exception") {
                    let message = String::from_utf8_lossy(&payload).to_string();
                    tracing::warn!(exception = %event_type, "Bedrock stream exception frame");
                    Err::<(), LlmError>(LlmError::Stream(format!("{event_type}: {message}")))?;
                } else if !event_type.is_empty() {
                    tracing::debug!(event_type = %event_type, "non-chunk Bedrock frame, skipping");
                }
            }
        }
    })
}
