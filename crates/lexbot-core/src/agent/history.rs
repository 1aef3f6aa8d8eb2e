//! Model conversation assembly.
//!
//! History is the sole memory of context across rounds: chronological,
//! never reordered. Seeding uses only the most recent prior turns, and
//! every tool execution appends the assistant's call followed by its
//! result, in call order.

use lexbot_types::chat::ConversationTurn;
use lexbot_types::llm::{ChatMessage, ContentBlock, MessageRole};
use lexbot_types::tool::ToolCall;

/// How many prior turns seed the model context.
pub const SEED_TURNS: usize = 2;

/// Fixed prefix nudging the model toward its search tools on every
/// user prompt.
pub const SEARCH_NUDGE_PREFIX: &str =
    "Please use your search tool one or more times based on this latest prompt: ";

/// Build the initial conversation from prior turns and the new prompt.
///
/// Each seed turn expands to a user message and an assistant message in
/// order; the new prompt is appended last with the search nudge prefix.
pub fn assemble_history(turns: &[ConversationTurn], user_message: &str) -> Vec<ChatMessage> {
    let mut history = Vec::with_capacity(turns.len() * 2 + 1);
    for turn in turns {
        history.push(ChatMessage::text(MessageRole::User, turn.user.clone()));
        history.push(ChatMessage::text(
            MessageRole::Assistant,
            turn.chatbot.clone(),
        ));
    }
    history.push(ChatMessage::text(
        MessageRole::User,
        format!("{SEARCH_NUDGE_PREFIX}{user_message}"),
    ));
    history
}

/// The slice of prior turns used for seeding: the last [`SEED_TURNS`].
pub fn seed_turns(turns: &[ConversationTurn]) -> &[ConversationTurn] {
    &turns[turns.len().saturating_sub(SEED_TURNS)..]
}

/// The assistant message recording one tool invocation.
pub fn tool_use_message(call: &ToolCall) -> ChatMessage {
    ChatMessage {
        role: MessageRole::Assistant,
        content: vec![ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.to_string(),
            input: call.input.clone(),
        }],
    }
}

/// The user message carrying one tool's result, correlated by call id.
pub fn tool_result_message(call_id: &str, result: &str) -> ChatMessage {
    ChatMessage {
        role: MessageRole::User,
        content: vec![ContentBlock::ToolResult {
            tool_use_id: call_id.to_string(),
            content: result.to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexbot_types::tool::ToolName;

    fn turn(user: &str, chatbot: &str) -> ConversationTurn {
        ConversationTurn {
            user: user.to_string(),
            chatbot: chatbot.to_string(),
            metadata: vec![],
        }
    }

    #[test]
    fn test_assemble_empty_history() {
        let history = assemble_history(&[], "What is the copay?");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, MessageRole::User);
        match &history[0].content[0] {
            ContentBlock::Text { text } => {
                assert!(text.starts_with(SEARCH_NUDGE_PREFIX));
                assert!(text.ends_with("What is the copay?"));
            }
            other => panic!("expected Text, got {other:?}"),
        }
    }

    #[test]
    fn test_assemble_alternates_roles() {
        let turns = vec![turn("q1", "a1"), turn("q2", "a2")];
        let history = assemble_history(&turns, "q3");
        assert_eq!(history.len(), 5);
        let roles: Vec<MessageRole> = history.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
            ]
        );
    }

    #[test]
    fn test_replay_is_lossless() {
        // Reassembling a loaded history reproduces the same alternating
        // ordering with nothing added or dropped.
        let turns = vec![turn("first", "first answer"), turn("second", "second answer")];
        let once = assemble_history(&turns, "third");
        let twice = assemble_history(&turns, "third");
        assert_eq!(once, twice);
        assert_eq!(once.len(), turns.len() * 2 + 1);
    }

    #[test]
    fn test_seed_turns_takes_last_two() {
        let turns = vec![turn("1", "a"), turn("2", "b"), turn("3", "c")];
        let seed = seed_turns(&turns);
        assert_eq!(seed.len(), 2);
        assert_eq!(seed[0].user, "2");
        assert_eq!(seed[1].user, "3");
    }

    #[test]
    fn test_seed_turns_short_history() {
        let turns = vec![turn("only", "one")];
        assert_eq!(seed_turns(&turns).len(), 1);
        assert!(seed_turns(&[]).is_empty());
    }

    #[test]
    fn test_tool_messages_correlate_by_id() {
        let call = ToolCall {
            id: "toolu_9".to_string(),
            name: ToolName::QueryDb,
            input: serde_json::json!({"query": "copay"}),
        };
        let use_msg = tool_use_message(&call);
        let result_msg = tool_result_message(&call.id, "some passages");

        assert_eq!(use_msg.role, MessageRole::Assistant);
        assert_eq!(result_msg.role, MessageRole::User);

        match (&use_msg.content[0], &result_msg.content[0]) {
            (
                ContentBlock::ToolUse { id, name, .. },
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                },
            ) => {
                assert_eq!(id, "toolu_9");
                assert_eq!(name, "query_db");
                assert_eq!(tool_use_id, id);
                assert_eq!(content, "some passages");
            }
            other => panic!("unexpected blocks: {other:?}"),
        }
    }
}
