//! HttpSessionStore -- [`SessionStore`] implementation over the
//! session-service RPC endpoint.
//!
//! The wire contract double-encodes payloads: both the request and the
//! response wrap the operation JSON in a `body` string field. A response
//! whose envelope or inner payload does not parse is a protocol error;
//! the engine surfaces that to the client and aborts without persisting.

use serde::{Deserialize, Serialize};

use lexbot_core::session::SessionStore;
use lexbot_types::chat::{ConversationTurn, SaveOperation};
use lexbot_types::error::SessionStoreError;

/// Outer envelope for requests and responses.
#[derive(Debug, Serialize, Deserialize)]
struct RpcEnvelope {
    body: String,
}

/// Inner request payload, JSON-encoded into the envelope body.
#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    operation: &'a str,
    user_id: &'a str,
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_chat_entry: Option<&'a ConversationTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

/// Inner response payload. An absent `chat_history` signals a session
/// that does not exist yet.
#[derive(Debug, Deserialize)]
struct SessionPayload {
    chat_history: Option<Vec<ConversationTurn>>,
}

/// Session-service RPC client.
pub struct HttpSessionStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSessionStore {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    async fn invoke(&self, request: &SessionRequest<'_>) -> Result<String, SessionStoreError> {
        let body = serde_json::to_string(request)
            .map_err(|e| SessionStoreError::Http(format!("request encode failed: {e}")))?;
        let envelope = RpcEnvelope { body };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| SessionStoreError::Http(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SessionStoreError::Http(format!(
                "HTTP {status}: {error_body}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| SessionStoreError::Http(format!("body read failed: {e}")))
    }
}

/// Parse the double-encoded response into the session payload.
fn parse_session_payload(raw: &str) -> Result<SessionPayload, SessionStoreError> {
    if raw.is_empty() {
        return Err(SessionStoreError::Protocol(
            "empty response from session service".to_string(),
        ));
    }
    let envelope: RpcEnvelope = serde_json::from_str(raw)
        .map_err(|e| SessionStoreError::Protocol(format!("envelope: {e}")))?;
    serde_json::from_str(&envelope.body)
        .map_err(|e| SessionStoreError::Protocol(format!("payload: {e}")))
}

impl SessionStore for HttpSessionStore {
    async fn load(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Vec<ConversationTurn>>, SessionStoreError> {
        let request = SessionRequest {
            operation: "get_session",
            user_id,
            session_id,
            new_chat_entry: None,
            title: None,
        };
        let raw = self.invoke(&request).await?;
        let payload = parse_session_payload(&raw)?;
        Ok(payload.chat_history)
    }

    async fn save(
        &self,
        op: SaveOperation,
        user_id: &str,
        session_id: &str,
        entry: &ConversationTurn,
        title: &str,
    ) -> Result<(), SessionStoreError> {
        let operation = op.to_string();
        let request = SessionRequest {
            operation: &operation,
            user_id,
            session_id,
            new_chat_entry: Some(entry),
            title: Some(title),
        };
        self.invoke(&request).await?;
        tracing::debug!(session_id, operation = %operation, "session saved");
        Ok(())
    }
}
