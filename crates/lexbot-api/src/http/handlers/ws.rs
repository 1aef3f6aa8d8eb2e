//! WebSocket chat handler.
//!
//! The `/ws/chat` endpoint upgrades an HTTP connection to a WebSocket.
//! Incoming text frames carry `{"action": ..., "data": ...}`:
//!
//! - `connect` / `disconnect` -- lifecycle no-ops.
//! - `getChatbotResponse` -- the single actionable route; runs the
//!   orchestration engine against the frame's `data` payload.
//! - anything else -- a generic acknowledgment frame.
//!
//! Each connection is handled by one isolated task; requests on
//! different connections never share history or tool-call state. Every
//! engine invocation gets a freshly constructed context (providers and
//! collaborators built from config), never process-wide singletons.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::StreamExt;
use serde::Deserialize;

use lexbot_core::agent::engine::ChatContext;
use lexbot_core::llm::box_provider::BoxModelProvider;
use lexbot_core::sink::{ConnectionSink, ERROR_PREFIX};
use lexbot_infra::llm::bedrock::BedrockProvider;
use lexbot_infra::llm::mistral::MistralTitleProvider;
use lexbot_infra::retrieval::BedrockKnowledgeBase;
use lexbot_infra::session::HttpSessionStore;
use lexbot_infra::statute::{S3ObjectFetcher, StatuteArchive};
use lexbot_types::chat::InboundChatRequest;

use crate::http::sink::WebSocketSink;
use crate::state::AppState;

/// Acknowledgment frame for unrecognized actions.
const DEFAULT_ACK: &str = r#"{"action":"Default Response Triggered"}"#;

/// An inbound WebSocket frame.
///
/// Unknown or malformed frames never crash the connection; malformed
/// JSON is answered with an error frame.
#[derive(Debug, Deserialize)]
struct WsFrame {
    action: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Upgrade an HTTP request to a WebSocket chat connection.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Core connection loop: read frames, dispatch by action.
async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let (sender, mut receiver) = socket.split();
    let mut sink = WebSocketSink::new(sender);

    while let Some(msg_result) = receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                handle_frame(&state, &mut sink, &text).await;
            }
            Ok(Message::Close(_)) => break,
            Err(err) => {
                tracing::debug!(error = %err, "WebSocket receive error");
                break;
            }
            // Binary, ping, pong protocol frames are handled by axum.
            Ok(_) => {}
        }
    }

    tracing::debug!("WebSocket connection closed");
}

/// Dispatch one inbound frame by its action.
async fn handle_frame(state: &AppState, sink: &mut WebSocketSink, text: &str) {
    let frame: WsFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::warn!(error = %err, "malformed inbound frame");
            push_error(sink, &format!("malformed request: {err}")).await;
            return;
        }
    };

    match frame.action.as_str() {
        "connect" | "disconnect" => {
            tracing::debug!(action = %frame.action, "lifecycle frame");
        }
        "getChatbotResponse" => {
            run_chat(state, sink, frame.data).await;
        }
        other => {
            tracing::debug!(action = %other, "unrecognized action");
            if let Err(err) = sink.push(DEFAULT_ACK).await {
                tracing::debug!(error = %err, "failed to push default ack");
            }
        }
    }
}

/// Run the orchestration engine for one chat request.
async fn run_chat(state: &AppState, sink: &mut WebSocketSink, data: serde_json::Value) {
    // Configuration check before any model call.
    let knowledge_base_id = match state.config.require_knowledge_base_id() {
        Ok(id) => id.to_string(),
        Err(err) => {
            tracing::error!(error = %err, "chat rejected: retrieval backend not configured");
            push_error(sink, &err.to_string()).await;
            return;
        }
    };

    let request: InboundChatRequest = match serde_json::from_value(data) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(error = %err, "malformed chat payload");
            push_error(sink, &format!("malformed request: {err}")).await;
            return;
        }
    };

    let config = &state.config;
    let provider = BoxModelProvider::new(BedrockProvider::new(
        state.http.clone(),
        config.bedrock_api_key.clone(),
        config.chat_model_id.clone(),
        config.region.clone(),
    ));
    let title_provider = BoxModelProvider::new(MistralTitleProvider::new(
        state.http.clone(),
        config.bedrock_api_key.clone(),
        config.title_model_id.clone(),
        config.region.clone(),
    ));
    let retriever = BedrockKnowledgeBase::new(
        state.http.clone(),
        config.bedrock_api_key.clone(),
        knowledge_base_id,
        config.region.clone(),
    );
    let statutes = StatuteArchive::new(S3ObjectFetcher::new(
        state.http.clone(),
        config.bedrock_api_key.clone(),
        config.statute_bucket.clone(),
        config.region.clone(),
    ));
    let sessions = HttpSessionStore::new(state.http.clone(), config.session_endpoint.clone());

    let ctx = ChatContext {
        provider: &provider,
        title_provider: &title_provider,
        retriever: &retriever,
        statutes: &statutes,
        sessions: &sessions,
        system_prompt: &config.system_prompt,
    };

    let request_id = uuid::Uuid::now_v7();
    tracing::info!(
        request_id = %request_id,
        session_id = %request.session_id,
        model = %config.chat_model_id,
        "chat request started"
    );

    if let Err(err) = state.engine.execute(&ctx, sink, &request).await {
        tracing::error!(error = %err, request_id = %request_id, session_id = %request.session_id, "chat request failed");
        push_error(sink, &err.client_message()).await;
    }
}

/// Push an error frame; failures are logged, never propagated.
async fn push_error(sink: &mut WebSocketSink, message: &str) {
    if let Err(err) = sink.push(&format!("{ERROR_PREFIX}{message}")).await {
        tracing::debug!(error = %err, "failed to push error frame");
    }
}
