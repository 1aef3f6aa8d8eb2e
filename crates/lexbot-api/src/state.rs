//! Application state shared across WebSocket connections.
//!
//! `AppState` intentionally holds only the loaded configuration, the
//! shared HTTP client, and the engine settings. Model providers and
//! retrieval collaborators are constructed per request by the chat
//! handler -- there is no process-wide client state beyond the
//! connection pool inside `reqwest::Client`.

use std::sync::Arc;

use lexbot_core::agent::engine::ChatEngine;
use lexbot_infra::config::AppConfig;
use lexbot_infra::llm::bedrock::BedrockProvider;

/// Shared application state for the WebSocket server.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub http: reqwest::Client,
    pub engine: ChatEngine,
}

impl AppState {
    /// Initialize the application state from the environment.
    pub fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let engine = ChatEngine::new(config.max_rounds);

        Ok(Self {
            config: Arc::new(config),
            http: BedrockProvider::default_http_client(),
            engine,
        })
    }
}
