//! WebSocketSink -- [`ConnectionSink`] implementation over an axum
//! WebSocket sender.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;

use lexbot_core::sink::{serialize_sources, ConnectionSink, EOF_SENTINEL};
use lexbot_types::chat::SourceDocument;
use lexbot_types::error::SinkError;

/// Delivers outbound frames to one client connection.
pub struct WebSocketSink {
    sender: SplitSink<WebSocket, Message>,
}

impl WebSocketSink {
    pub fn new(sender: SplitSink<WebSocket, Message>) -> Self {
        Self { sender }
    }

    async fn send_text(&mut self, text: String) -> Result<(), SinkError> {
        self.sender
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| SinkError::Send(e.to_string()))
    }
}

impl ConnectionSink for WebSocketSink {
    async fn push(&mut self, text: &str) -> Result<(), SinkError> {
        self.send_text(text.to_string()).await
    }

    async fn push_eof(&mut self) -> Result<(), SinkError> {
        self.send_text(EOF_SENTINEL.to_string()).await
    }

    async fn push_sources(&mut self, sources: &[SourceDocument]) -> Result<(), SinkError> {
        self.send_text(serialize_sources(sources)).await
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.sender
            .send(Message::Close(None))
            .await
            .map_err(|e| SinkError::Send(e.to_string()))
    }
}
