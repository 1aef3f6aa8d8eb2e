//! Session title generation via a secondary completion model.
//!
//! A title is computed exactly once, when a session is first persisted,
//! from the user's first message and the generated answer.

use lexbot_types::llm::{ChatMessage, LlmError, MessageRole, ModelRequest};

use crate::llm::box_provider::BoxModelProvider;

/// Output budget for the title completion.
pub const TITLE_MAX_TOKENS: u32 = 25;

/// Build the fixed instructional prompt for the title model.
///
/// The template targets instruct-tuned completion models and ends
/// mid-sentence so the model's continuation is the title itself.
pub fn title_prompt(user_message: &str, answer: &str) -> String {
    format!(
        "<s>[INST]Generate a concise title for this chat session based on the initial \
         user prompt and response. The title should succinctly capture the essence of \
         the chat's main topic without adding extra content.[/INST]\n\
         [INST]{user_message}[/INST]\n\
         {answer} </s>\n\
         Here's your session title:"
    )
}

/// Generate a title for a new session and strip quote characters from
/// the result.
#[tracing::instrument(name = "generate_title", skip_all, fields(provider = %provider.name()))]
pub async fn generate_title(
    provider: &BoxModelProvider,
    user_message: &str,
    answer: &str,
) -> Result<String, LlmError> {
    let request = ModelRequest {
        messages: vec![ChatMessage::text(
            MessageRole::User,
            title_prompt(user_message, answer),
        )],
        system: None,
        max_tokens: TITLE_MAX_TOKENS,
        temperature: None,
        tools: vec![],
    };

    let response = provider.complete(&request).await?;
    Ok(response.content.replace('"', "").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_prompt_embeds_exchange() {
        let prompt = title_prompt("What is the copay?", "The copay is $20.");
        assert!(prompt.contains("[INST]What is the copay?[/INST]"));
        assert!(prompt.contains("The copay is $20."));
        assert!(prompt.ends_with("Here's your session title:"));
    }

    #[test]
    fn test_quote_stripping() {
        // Simulates what generate_title does to the model output.
        let raw = " \"Copay Coverage Question\" ";
        let title = raw.replace('"', "").trim().to_string();
        assert_eq!(title, "Copay Coverage Question");
    }

    #[test]
    fn test_interior_quotes_also_stripped() {
        let raw = "Acts of \"1998\" Chapter Lookup";
        let title = raw.replace('"', "").trim().to_string();
        assert_eq!(title, "Acts of 1998 Chapter Lookup");
    }
}
