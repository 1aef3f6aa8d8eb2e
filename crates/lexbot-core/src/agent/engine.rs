//! The multi-round streaming tool-use loop.
//!
//! `ChatEngine` owns the full lifecycle of one chat request: assemble
//! history, stream the model, act on decoded events via [`RoundState`],
//! execute pending tool calls against the retrieval collaborators,
//! resume with updated history, and -- once the model stops for any
//! reason other than tool use -- flush the end-of-stream sentinel and
//! citations to the client and persist the turn.
//!
//! Each request runs in its own task with no shared mutable state;
//! within a request everything is a strictly sequential cooperative
//! loop. Failures below the engine are degraded in place wherever an
//! answer can still be produced; only failures that make any answer
//! impossible surface as request errors.

use futures_util::StreamExt;

use lexbot_types::chat::{ConversationTurn, InboundChatRequest, SaveOperation};
use lexbot_types::error::SessionStoreError;
use lexbot_types::llm::{ChatMessage, LlmError, ModelRequest};
use lexbot_types::tool::{lexbot_toolset, ToolCall, ToolName};

use crate::agent::history::{self, assemble_history, seed_turns};
use crate::agent::round::{RoundError, RoundState, StepAction};
use crate::agent::title::generate_title;
use crate::llm::box_provider::BoxModelProvider;
use crate::retrieval::KnowledgeRetriever;
use crate::session::SessionStore;
use crate::sink::ConnectionSink;
use crate::statute::StatuteStore;

/// Output budget per model round.
const MODEL_MAX_TOKENS: u32 = 2048;

/// Sampling temperature; near-greedy for factual retrieval answers.
const MODEL_TEMPERATURE: f64 = 0.01;

/// Tool result substituted when a call cannot be serviced.
pub const TOOL_USE_FAILED: &str = "Tool use failed!";

/// Collaborators for one request, constructed per invocation.
///
/// No process-wide client state: every handle the engine touches is
/// passed in explicitly.
pub struct ChatContext<'a, R, D, S> {
    pub provider: &'a BoxModelProvider,
    pub title_provider: &'a BoxModelProvider,
    pub retriever: &'a R,
    pub statutes: &'a D,
    pub sessions: &'a S,
    pub system_prompt: &'a str,
}

/// Errors that end a request.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The model stream failed outright; the loop never starts or is
    /// abandoned mid-round. No retry is attempted.
    #[error("model stream failed: {0}")]
    Stream(#[source] LlmError),

    /// The round cap was hit without a terminal stop reason.
    #[error("tool loop limit exceeded after {rounds} rounds")]
    ToolLoopExceeded { rounds: u32 },

    /// The model violated the tool-input protocol.
    #[error(transparent)]
    Round(#[from] RoundError),

    /// The session service failed or returned a malformed response.
    #[error("session store error: {0}")]
    SessionStore(#[from] SessionStoreError),

    /// The secondary title model failed for a new session.
    #[error("title generation failed: {0}")]
    TitleGeneration(#[source] LlmError),
}

impl EngineError {
    /// The message shown to the client in an error frame.
    pub fn client_message(&self) -> String {
        match self {
            EngineError::SessionStore(SessionStoreError::Protocol(_)) => {
                "Unable to load past messages, please retry your query".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Drives think -> call tool -> resume rounds for one request.
#[derive(Debug, Clone)]
pub struct ChatEngine {
    /// Hard cap on model rounds. Exceeding it is fatal -- termination
    /// must never depend solely on the model's cooperation.
    pub max_rounds: u32,
}

impl Default for ChatEngine {
    fn default() -> Self {
        Self { max_rounds: 8 }
    }
}

impl ChatEngine {
    pub fn new(max_rounds: u32) -> Self {
        Self { max_rounds }
    }

    /// Run the full loop for one inbound chat request.
    ///
    /// Text fragments are delivered to `sink` in receipt order before
    /// the next stream suspension. On success the sink has received the
    /// fragments, the EOF sentinel, and the citation list, and the turn
    /// has been persisted. On error nothing is persisted; the caller is
    /// responsible for surfacing [`EngineError::client_message`] as an
    /// error frame.
    pub async fn execute<R, D, S, K>(
        &self,
        ctx: &ChatContext<'_, R, D, S>,
        sink: &mut K,
        request: &InboundChatRequest,
    ) -> Result<(), EngineError>
    where
        R: KnowledgeRetriever,
        D: StatuteStore,
        S: SessionStore,
        K: ConnectionSink,
    {
        let mut messages = assemble_history(seed_turns(&request.chat_history), &request.user_message);
        let mut state = RoundState::new();
        let mut rounds = 0u32;

        'rounds: loop {
            rounds += 1;
            if rounds > self.max_rounds {
                return Err(EngineError::ToolLoopExceeded {
                    rounds: self.max_rounds,
                });
            }

            tracing::debug!(round = rounds, messages = messages.len(), "starting model stream");
            state.begin_stream();
            let mut stream = ctx.provider.stream(build_model_request(ctx.system_prompt, &messages));

            let mut execute_tools = false;
            while let Some(item) = stream.next().await {
                let event = item.map_err(EngineError::Stream)?;
                match state.apply(event)? {
                    Some(StepAction::EmitText(text)) => {
                        if let Err(err) = sink.push(&text).await {
                            tracing::debug!(error = %err, "dropping text fragment, push failed");
                        }
                    }
                    Some(StepAction::ExecuteTools) => {
                        execute_tools = true;
                        break;
                    }
                    Some(StepAction::Finish) => break 'rounds,
                    None => {}
                }
            }

            if !execute_tools {
                // Stream exhausted without an explicit stop reason;
                // nothing left to resume from, so the answer is final.
                tracing::debug!(round = rounds, "stream ended without stop reason");
                break;
            }

            for call in state.take_pending() {
                let result = dispatch_tool(ctx, &mut state, &call).await;
                messages.push(history::tool_use_message(&call));
                messages.push(history::tool_result_message(&call.id, &result));
            }
            state.complete_round();
        }

        let (answer, sources) = state.into_answer_and_sources();

        if let Err(err) = sink.push_eof().await {
            tracing::warn!(error = %err, "failed to push EOF sentinel");
        }
        if let Err(err) = sink.push_sources(&sources).await {
            tracing::warn!(error = %err, "failed to push citation list");
        }

        persist_turn(ctx, request, answer, sources).await?;

        if let Err(err) = sink.close().await {
            tracing::debug!(error = %err, "failed to close connection");
        }

        Ok(())
    }
}

/// Execute one tool call, returning its result string.
///
/// Failures here are local by contract: the fallback string becomes the
/// tool result and the round continues.
async fn dispatch_tool<R, D, S>(
    ctx: &ChatContext<'_, R, D, S>,
    state: &mut RoundState,
    call: &ToolCall,
) -> String
where
    R: KnowledgeRetriever,
    D: StatuteStore,
    S: SessionStore,
{
    match &call.name {
        ToolName::QueryDb => {
            let query = str_field(&call.input, "query");
            tracing::debug!(call_id = %call.id, query = %query, "dispatching semantic search");
            let passages = ctx.retriever.retrieve(query).await;
            state.add_sources(passages.sources);
            passages.content
        }

        ToolName::GetActOrResolve => {
            let year = str_field(&call.input, "year");
            let chapter = str_field(&call.input, "chapter");
            let law_type = str_field(&call.input, "law_type");
            tracing::debug!(call_id = %call.id, year, chapter, law_type, "dispatching chapter fetch");
            match ctx.statutes.fetch_chapter(year, law_type, chapter).await {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(error = %err, year, chapter, "chapter fetch failed");
                    TOOL_USE_FAILED.to_string()
                }
            }
        }

        ToolName::Other(name) => {
            tracing::warn!(tool = %name, call_id = %call.id, "model invoked unknown tool");
            TOOL_USE_FAILED.to_string()
        }
    }
}

/// Load-or-create the durable session record and append this turn.
async fn persist_turn<R, D, S>(
    ctx: &ChatContext<'_, R, D, S>,
    request: &InboundChatRequest,
    answer: String,
    sources: Vec<lexbot_types::chat::SourceDocument>,
) -> Result<(), EngineError>
where
    R: KnowledgeRetriever,
    D: StatuteStore,
    S: SessionStore,
{
    let existing = ctx
        .sessions
        .load(&request.user_id, &request.session_id)
        .await?;

    let entry = ConversationTurn {
        user: request.user_message.clone(),
        chatbot: answer.clone(),
        metadata: sources,
    };

    match existing {
        None => {
            let title = generate_title(ctx.title_provider, &request.user_message, &answer)
                .await
                .map_err(EngineError::TitleGeneration)?;
            tracing::info!(session_id = %request.session_id, title = %title, "creating session");
            ctx.sessions
                .save(
                    SaveOperation::AddSession,
                    &request.user_id,
                    &request.session_id,
                    &entry,
                    &title,
                )
                .await?;
        }
        Some(_) => {
            ctx.sessions
                .save(
                    SaveOperation::UpdateSession,
                    &request.user_id,
                    &request.session_id,
                    &entry,
                    "",
                )
                .await?;
        }
    }

    Ok(())
}

fn build_model_request(system_prompt: &str, messages: &[ChatMessage]) -> ModelRequest {
    ModelRequest {
        messages: messages.to_vec(),
        system: Some(system_prompt.to_string()),
        max_tokens: MODEL_MAX_TOKENS,
        temperature: Some(MODEL_TEMPERATURE),
        tools: lexbot_toolset(),
    }
}

fn str_field<'a>(input: &'a serde_json::Value, key: &str) -> &'a str {
    input.get(key).and_then(|v| v.as_str()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
