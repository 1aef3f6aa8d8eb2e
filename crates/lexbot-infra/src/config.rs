//! Environment-driven configuration for Lexbot.
//!
//! All settings come from `LEXBOT_*` variables. Two are required (the
//! Bedrock API key and the session-service endpoint); the rest default
//! sensibly. The knowledge-base id is optional at startup but checked
//! per request before any model call -- a chat request without it is
//! rejected with an error frame.

use secrecy::SecretString;

use lexbot_types::error::ConfigError;

/// Default system prompt when `LEXBOT_SYSTEM_PROMPT` is unset.
const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant that answers questions about \
     session laws (acts and resolves) using your search tools. Ground every specific \
     claim in retrieved text and say so when the archive has no answer.";

/// Runtime configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub region: String,
    pub bedrock_api_key: SecretString,
    pub chat_model_id: String,
    pub title_model_id: String,
    pub knowledge_base_id: Option<String>,
    pub statute_bucket: String,
    pub session_endpoint: String,
    pub system_prompt: String,
    pub max_rounds: u32,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingSetting(name))
        };
        let or_default =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let max_rounds = match lookup("LEXBOT_MAX_ROUNDS") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(raw = %raw, "unparseable LEXBOT_MAX_ROUNDS, using default");
                8
            }),
            None => 8,
        };

        Ok(Self {
            region: or_default("LEXBOT_AWS_REGION", "us-east-1"),
            bedrock_api_key: SecretString::from(required("LEXBOT_BEDROCK_API_KEY")?),
            chat_model_id: or_default(
                "LEXBOT_CHAT_MODEL",
                "anthropic.claude-3-5-sonnet-20240620-v1:0",
            ),
            title_model_id: or_default("LEXBOT_TITLE_MODEL", "mistral.mistral-7b-instruct-v0:2"),
            knowledge_base_id: lookup("LEXBOT_KB_ID").filter(|v| !v.is_empty()),
            statute_bucket: or_default("LEXBOT_STATUTE_BUCKET", "lexbot-statutes"),
            session_endpoint: required("LEXBOT_SESSION_ENDPOINT")?,
            system_prompt: or_default("LEXBOT_SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            max_rounds,
        })
    }

    /// The per-request check for the retrieval backend identifier.
    pub fn require_knowledge_base_id(&self) -> Result<&str, ConfigError> {
        self.knowledge_base_id
            .as_deref()
            .ok_or(ConfigError::MissingKnowledgeBaseId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup_from(entries: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LEXBOT_BEDROCK_API_KEY", "test-key"),
            ("LEXBOT_SESSION_ENDPOINT", "https://sessions.internal/rpc"),
        ]))
        .unwrap();

        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.chat_model_id, "anthropic.claude-3-5-sonnet-20240620-v1:0");
        assert_eq!(config.title_model_id, "mistral.mistral-7b-instruct-v0:2");
        assert_eq!(config.statute_bucket, "lexbot-statutes");
        assert_eq!(config.max_rounds, 8);
        assert!(config.knowledge_base_id.is_none());
        assert!(!config.system_prompt.is_empty());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[(
            "LEXBOT_SESSION_ENDPOINT",
            "https://sessions.internal/rpc",
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingSetting("LEXBOT_BEDROCK_API_KEY")
        ));
    }

    #[test]
    fn test_missing_session_endpoint_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[(
            "LEXBOT_BEDROCK_API_KEY",
            "test-key",
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingSetting("LEXBOT_SESSION_ENDPOINT")
        ));
    }

    #[test]
    fn test_knowledge_base_id_required_per_request() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LEXBOT_BEDROCK_API_KEY", "test-key"),
            ("LEXBOT_SESSION_ENDPOINT", "https://sessions.internal/rpc"),
        ]))
        .unwrap();
        assert!(matches!(
            config.require_knowledge_base_id().unwrap_err(),
            ConfigError::MissingKnowledgeBaseId
        ));

        let config = AppConfig::from_lookup(lookup_from(&[
            ("LEXBOT_BEDROCK_API_KEY", "test-key"),
            ("LEXBOT_SESSION_ENDPOINT", "https://sessions.internal/rpc"),
            ("LEXBOT_KB_ID", "KB12345"),
        ]))
        .unwrap();
        assert_eq!(config.require_knowledge_base_id().unwrap(), "KB12345");
    }

    #[test]
    fn test_empty_kb_id_treated_as_absent() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LEXBOT_BEDROCK_API_KEY", "test-key"),
            ("LEXBOT_SESSION_ENDPOINT", "https://sessions.internal/rpc"),
            ("LEXBOT_KB_ID", ""),
        ]))
        .unwrap();
        assert!(config.knowledge_base_id.is_none());
    }

    #[test]
    fn test_overrides_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LEXBOT_BEDROCK_API_KEY", "test-key"),
            ("LEXBOT_SESSION_ENDPOINT", "https://sessions.internal/rpc"),
            ("LEXBOT_AWS_REGION", "eu-west-1"),
            ("LEXBOT_MAX_ROUNDS", "3"),
            ("LEXBOT_SYSTEM_PROMPT", "custom prompt"),
        ]))
        .unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.system_prompt, "custom prompt");
    }

    #[test]
    fn test_unparseable_max_rounds_falls_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LEXBOT_BEDROCK_API_KEY", "test-key"),
            ("LEXBOT_SESSION_ENDPOINT", "https://sessions.internal/rpc"),
            ("LEXBOT_MAX_ROUNDS", "lots"),
        ]))
        .unwrap();
        assert_eq!(config.max_rounds, 8);
    }
}
