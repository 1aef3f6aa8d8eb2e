//! MistralTitleProvider -- [`ModelProvider`] implementation for
//! Mistral-family text-completion models on AWS Bedrock.
//!
//! Used only for session title generation. Mistral models take a raw
//! `prompt` string instead of structured messages, so the request's
//! text blocks are flattened into one prompt before invocation.
//! Streaming is not supported.

use std::pin::Pin;

use futures_util::Stream;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use lexbot_core::llm::provider::ModelProvider;
use lexbot_types::llm::{
    CompletionResponse, ContentBlock, LlmError, ModelRequest, StreamEvent,
};

/// Request body for Bedrock Mistral `invoke`.
#[derive(Debug, Clone, Serialize)]
struct MistralRequest {
    prompt: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// Response body from Bedrock Mistral `invoke`.
#[derive(Debug, Clone, Deserialize)]
struct MistralResponse {
    outputs: Vec<MistralOutput>,
}

#[derive(Debug, Clone, Deserialize)]
struct MistralOutput {
    text: String,
}

/// Bedrock Mistral text-completion provider.
pub struct MistralTitleProvider {
    client: reqwest::Client,
    api_key: SecretString,
    region: String,
    model_id: String,
}

impl MistralTitleProvider {
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

    fn url(&self) -> String {
        format!(
            "https://bedrock-runtime.{}.amazonaws.com/model/{}/invoke",
            self.region, self.model_id
        )
    }

    /// Flatten the request's text blocks into a single prompt string.
    fn flatten_prompt(request: &ModelRequest) -> String {
        request
            .messages
            .iter()
            .flat_map(|m| m.content.iter())
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ModelProvider for MistralTitleProvider {
    fn name(&self) -> &str {
        "bedrock-mistral"
    }

    async fn complete(&self, request: &ModelRequest) -> Result<CompletionResponse, LlmError> {
        let body = MistralRequest {
            prompt: Self::flatten_prompt(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let url = self.url();

        tracing::debug!(url = %url, model_id = %self.model_id, "Mistral invoke request");

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
            tracing::warn!(status = %status, body = %error_body, "Mistral API error response");
            return Err(LlmError::Provider {
                message: format!("HTTP {status}: {error_body}"),
            });
        }

        let parsed: MistralResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let content = parsed
            .outputs
            .into_iter()
            .next()
            .map(|o| o.text)
            .ok_or_else(|| LlmError::Deserialization("response carried no outputs".to_string()))?;

        Ok(CompletionResponse {
            content,
            stop_reason: None,
        })
    }

    fn stream(
        &self,
        _request: ModelRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
        Box::pin(futures_util::stream::once(async {
            Err(LlmError::InvalidRequest(
                "mistral title provider is invoke-only".to_string(),
            ))
        }))
    }
}
