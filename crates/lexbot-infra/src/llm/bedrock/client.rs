//! BedrockProvider -- concrete [`ModelProvider`] implementation for AWS
//! Bedrock Claude models.
//!
//! Sends requests to the Bedrock Runtime API using Bearer token
//! authentication. Supports both non-streaming (`invoke`) and streaming
//! (`invoke-with-response-stream`) modes.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only
//! exposed when constructing HTTP request headers.

use std::pin::Pin;
use std::time::Duration;

use futures_util::Stream;
use secrecy::{ExposeSecret, SecretString};

use lexbot_core::llm::provider::ModelProvider;
use lexbot_types::llm::{
    CompletionResponse, LlmError, ModelRequest, StopReason, StreamEvent,
};

use super::streaming::create_bedrock_stream;
use super::types::{BedrockNonStreamResponse, BedrockRequest, ResponseBlock};

/// AWS Bedrock Claude model provider.
pub struct BedrockProvider {
    client: reqwest::Client,
    api_key: SecretString,
    region: String,
    model_id: String,
}

// BedrockProvider intentionally does NOT derive Debug to prevent
// accidental exposure of internal state.

impl BedrockProvider {
    /// The Anthropic API version Bedrock expects in the request body.
    const API_VERSION: &'static str = "bedrock-2023-05-31";

    /// Create a new Bedrock provider.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared reqwest client (carries the request timeout)
    /// * `api_key` - Bedrock bearer token wrapped in SecretString
    /// * `model_id` - Fully qualified Bedrock model id
    ///   (e.g., "anthropic.claude-3-5-sonnet-20240620-v1:0")
    /// * `region` - AWS region (e.g., "us-east-1")
    pub fn new(
        client: reqwest::Client,
        api_key: SecretString,
        model_id: String,
        region: String,
    ) -> Self {
        Self {
            client,
            api_key,
            region,
            model_id,
        }
    }

    /// Build a shared HTTP client with the provider-wide timeout.
    ///
    /// The timeout bounds every model stream and collaborator call; no
    /// finer-grained timer exists in the orchestration loop.
    pub fn default_http_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("failed to create reqwest client")
    }

    /// Build the full Bedrock Runtime URL for a given action.
    fn url(&self, action: &str) -> String {
        format!(
            "https://bedrock-runtime.{}.amazonaws.com/model/{}/{}",
            self.region, self.model_id, action
        )
    }

    /// Convert a generic [`ModelRequest`] into a [`BedrockRequest`].
    fn to_bedrock_request(&self, request: &ModelRequest) -> BedrockRequest {
        BedrockRequest {
            anthropic_version: Self::API_VERSION.to_string(),
            max_tokens: request.max_tokens,
            messages: request.messages.clone(),
            system: request.system.clone(),
            temperature: request.temperature,
            tools: request.tools.clone(),
        }
    }
}

impl ModelProvider for BedrockProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn complete(&self, request: &ModelRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_bedrock_request(request);
        let url = self.url("invoke");

        tracing::debug!(url = %url, model_id = %self.model_id, "Bedrock invoke request");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
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
            tracing::warn!(status = %status, body = %error_body, url = %url, "Bedrock API error response");
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited,
                529 => LlmError::Overloaded(error_body),
                s if s >= 500 => LlmError::Provider {
                    message: format!("Bedrock server error HTTP {status}: {error_body}"),
                },
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let parsed: BedrockNonStreamResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let content = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text.as_str()),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            content,
            stop_reason: parsed.stop_reason.as_deref().map(StopReason::from_wire),
        })
    }

    fn stream(
        &self,
        request: ModelRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
        let body = self.to_bedrock_request(&request);
        let url = self.url("invoke-with-response-stream");

        create_bedrock_stream(&self.client, &url, body, &self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexbot_types::llm::{ChatMessage, MessageRole};
    use lexbot_types::tool::lexbot_toolset;

    fn make_provider() -> BedrockProvider {
        BedrockProvider::new(
            BedrockProvider::default_http_client(),
            SecretString::from("test-not-a-real-key"),
            "anthropic.claude-3-5-sonnet-20240620-v1:0".to_string(),
            "us-east-1".to_string(),
        )
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(make_provider().name(), "bedrock");
    }

    #[test]
    fn test_url_construction() {
        let provider = make_provider();
        assert_eq!(
            provider.url("invoke"),
            "https://bedrock-runtime.us-east-1.amazonaws.com/model/anthropic.claude-3-5-sonnet-20240620-v1:0/invoke"
        );
        assert_eq!(
            provider.url("invoke-with-response-stream"),
            "https://bedrock-runtime.us-east-1.amazonaws.com/model/anthropic.claude-3-5-sonnet-20240620-v1:0/invoke-with-response-stream"
        );
    }

    #[test]
    fn test_to_bedrock_request_carries_tools_and_version() {
        let provider = make_provider();
        let request = ModelRequest {
            messages: vec![ChatMessage::text(MessageRole::User, "Hello")],
            system: Some("Be helpful".to_string()),
            max_tokens: 2048,
            temperature: Some(0.01),
            tools: lexbot_toolset(),
        };

        let body = provider.to_bedrock_request(&request);
        assert_eq!(body.anthropic_version, "bedrock-2023-05-31");
        assert_eq!(body.max_tokens, 2048);
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.tools.len(), 2);
        assert_eq!(body.system.as_deref(), Some("Be helpful"));

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("model").is_none());
    }
}
