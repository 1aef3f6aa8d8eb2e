//! Per-stream state machine for tool-use rounds.
//!
//! `RoundState` reifies the loop variables of a streaming tool-use
//! consumer into an explicit struct: the phase, the tool call currently
//! being assembled, the queue of finalized calls awaiting execution,
//! the running answer text, and the citation accumulator. `apply` is
//! deterministic given (state, event) and performs no I/O; the engine
//! acts on the returned [`StepAction`].

use lexbot_types::chat::SourceDocument;
use lexbot_types::llm::StreamEvent;
use lexbot_types::tool::{ToolCall, ToolName};

use crate::retrieval::SourceAccumulator;

/// Where the state machine is within one model stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Consuming answer text (initial).
    StreamingText,
    /// Accumulating JSON input for an open tool-use block.
    AssemblingToolInput,
    /// The model stopped for tool use; pending calls await execution.
    ExecutingTools,
    /// Tool results are appended; a new model stream is due.
    RoundComplete,
    /// A terminal stop reason was observed.
    Done,
}

/// What the engine must do after applying one event.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Deliver this fragment to the client before the next suspension.
    EmitText(String),
    /// Execute the pending tool calls, then resume with a new stream.
    ExecuteTools,
    /// The loop is over; flush and persist.
    Finish,
}

/// A tool call mid-assembly.
///
/// `header_pending` marks that the very next input fragment is the
/// structural header following the block start and must be discarded
/// unparsed.
#[derive(Debug)]
struct ToolCallBuffer {
    id: String,
    name: ToolName,
    raw_input: String,
    header_pending: bool,
}

/// Errors from state transitions.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    /// The model closed a tool block whose accumulated input is not
    /// valid JSON.
    #[error("tool '{name}' input is not valid JSON: {source}")]
    ToolInputParse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// State machine consuming decoded stream events for one request.
///
/// The answer text and citation accumulator survive across rounds; the
/// call buffer and pending queue are per-round.
#[derive(Debug)]
pub struct RoundState {
    phase: Phase,
    current: Option<ToolCallBuffer>,
    pending: Vec<ToolCall>,
    answer: String,
    sources: SourceAccumulator,
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundState {
    pub fn new() -> Self {
        Self {
            phase: Phase::StreamingText,
            current: None,
            pending: Vec::new(),
            answer: String::new(),
            sources: SourceAccumulator::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Apply one decoded stream event, returning the action (if any)
    /// the engine must take before consuming the next event.
    pub fn apply(&mut self, event: StreamEvent) -> Result<Option<StepAction>, RoundError> {
        match event {
            StreamEvent::TextDelta { text } => {
                self.answer.push_str(&text);
                Ok(Some(StepAction::EmitText(text)))
            }

            StreamEvent::ToolUseStart { id, name } => {
                // Close out a previous call whose input finished without
                // an intervening stop signal.
                self.finalize_current()?;
                self.current = Some(ToolCallBuffer {
                    id,
                    name: ToolName::from_wire(&name),
                    raw_input: String::new(),
                    header_pending: true,
                });
                self.phase = Phase::AssemblingToolInput;
                Ok(None)
            }

            StreamEvent::ToolInputDelta { partial_json } => {
                if let Some(current) = self.current.as_mut() {
                    if current.header_pending {
                        current.header_pending = false;
                    } else {
                        current.raw_input.push_str(&partial_json);
                    }
                }
                Ok(None)
            }

            StreamEvent::Stop { reason } => {
                if reason.is_tool_use() {
                    self.finalize_current()?;
                    self.phase = Phase::ExecutingTools;
                    Ok(Some(StepAction::ExecuteTools))
                } else {
                    self.phase = Phase::Done;
                    Ok(Some(StepAction::Finish))
                }
            }
        }
    }

    /// Take the finalized calls for execution, in accumulation order.
    pub fn take_pending(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.pending)
    }

    /// Mark tool execution finished; the engine will open a new stream.
    pub fn complete_round(&mut self) {
        self.phase = Phase::RoundComplete;
    }

    /// Reset the per-stream phase at the start of a new model stream.
    pub fn begin_stream(&mut self) {
        self.phase = Phase::StreamingText;
    }

    /// Record citations gathered during tool execution.
    pub fn add_sources(&mut self, sources: impl IntoIterator<Item = SourceDocument>) {
        self.sources.extend(sources);
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Consume the state, yielding the full answer and the deduplicated
    /// citation list.
    pub fn into_answer_and_sources(self) -> (String, Vec<SourceDocument>) {
        (self.answer, self.sources.into_vec())
    }

    fn finalize_current(&mut self) -> Result<(), RoundError> {
        let Some(buffer) = self.current.take() else {
            return Ok(());
        };

        let input = if buffer.raw_input.is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(&buffer.raw_input).map_err(|source| {
                RoundError::ToolInputParse {
                    name: buffer.name.to_string(),
                    source,
                }
            })?
        };

        self.pending.push(ToolCall {
            id: buffer.id,
            name: buffer.name,
            input,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexbot_types::llm::StopReason;

    fn text(t: &str) -> StreamEvent {
        StreamEvent::TextDelta {
            text: t.to_string(),
        }
    }

    fn tool_start(id: &str, name: &str) -> StreamEvent {
        StreamEvent::ToolUseStart {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn input(fragment: &str) -> StreamEvent {
        StreamEvent::ToolInputDelta {
            partial_json: fragment.to_string(),
        }
    }

    fn stop(reason: StopReason) -> StreamEvent {
        StreamEvent::Stop { reason }
    }

    #[test]
    fn test_text_deltas_accumulate_and_emit() {
        let mut state = RoundState::new();
        let action = state.apply(text("Hello, ")).unwrap();
        assert_eq!(action, Some(StepAction::EmitText("Hello, ".to_string())));
        state.apply(text("world.")).unwrap();
        assert_eq!(state.answer(), "Hello, world.");
        assert_eq!(state.phase(), Phase::StreamingText);
    }

    #[test]
    fn test_one_tool_call_assembled_with_header_discarded() {
        let mut state = RoundState::new();
        state.apply(tool_start("toolu_1", "query_db")).unwrap();
        assert_eq!(state.phase(), Phase::AssemblingToolInput);

        // Structural header fragment: discarded unparsed.
        state.apply(input("")).unwrap();
        state.apply(input("{\"query\":")).unwrap();
        state.apply(input("\"copay\"}")).unwrap();

        let action = state.apply(stop(StopReason::ToolUse)).unwrap();
        assert_eq!(action, Some(StepAction::ExecuteTools));
        assert_eq!(state.phase(), Phase::ExecutingTools);

        let calls = state.take_pending();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "toolu_1");
        assert_eq!(calls[0].name, ToolName::QueryDb);
        assert_eq!(calls[0].input["query"], "copay");
    }

    #[test]
    fn test_second_tool_start_finalizes_first() {
        let mut state = RoundState::new();
        state.apply(tool_start("toolu_1", "query_db")).unwrap();
        state.apply(input("")).unwrap();
        state.apply(input("{\"query\":\"acts of 1998\"}")).unwrap();

        state
            .apply(tool_start("toolu_2", "get_act_or_resolve"))
            .unwrap();
        state.apply(input("")).unwrap();
        state
            .apply(input("{\"year\":\"1998\",\"chapter\":\"12\",\"law_type\":\"acts\"}"))
            .unwrap();

        state.apply(stop(StopReason::ToolUse)).unwrap();
        let calls = state.take_pending();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "toolu_1");
        assert_eq!(calls[0].input["query"], "acts of 1998");
        assert_eq!(calls[1].id, "toolu_2");
        assert_eq!(calls[1].name, ToolName::GetActOrResolve);
        assert_eq!(calls[1].input["chapter"], "12");
    }

    #[test]
    fn test_empty_input_parses_as_empty_object() {
        let mut state = RoundState::new();
        state.apply(tool_start("toolu_1", "query_db")).unwrap();
        state.apply(stop(StopReason::ToolUse)).unwrap();
        let calls = state.take_pending();
        assert_eq!(calls[0].input, serde_json::json!({}));
    }

    #[test]
    fn test_invalid_tool_input_is_an_error() {
        let mut state = RoundState::new();
        state.apply(tool_start("toolu_1", "query_db")).unwrap();
        state.apply(input("")).unwrap();
        state.apply(input("{\"query\": truncated")).unwrap();
        let err = state.apply(stop(StopReason::ToolUse)).unwrap_err();
        assert!(err.to_string().contains("query_db"));
    }

    #[test]
    fn test_terminal_stop_finishes() {
        let mut state = RoundState::new();
        state.apply(text("done")).unwrap();
        let action = state.apply(stop(StopReason::EndTurn)).unwrap();
        assert_eq!(action, Some(StepAction::Finish));
        assert_eq!(state.phase(), Phase::Done);
    }

    #[test]
    fn test_unknown_stop_reason_is_terminal() {
        let mut state = RoundState::new();
        let action = state
            .apply(stop(StopReason::Other("guardrail_intervened".to_string())))
            .unwrap();
        assert_eq!(action, Some(StepAction::Finish));
    }

    #[test]
    fn test_text_between_tool_blocks_still_emitted() {
        let mut state = RoundState::new();
        state.apply(tool_start("toolu_1", "query_db")).unwrap();
        state.apply(input("")).unwrap();
        state.apply(input("{}")).unwrap();
        let action = state.apply(text("Checking the index. ")).unwrap();
        assert_eq!(
            action,
            Some(StepAction::EmitText("Checking the index. ".to_string()))
        );
        assert!(state.answer().contains("Checking the index."));
    }

    #[test]
    fn test_input_delta_without_open_call_ignored() {
        let mut state = RoundState::new();
        let action = state.apply(input("{\"stray\": true}")).unwrap();
        assert_eq!(action, None);
        state.apply(stop(StopReason::ToolUse)).unwrap();
        assert!(state.take_pending().is_empty());
    }

    #[test]
    fn test_answer_survives_round_boundary() {
        let mut state = RoundState::new();
        state.apply(text("Part one. ")).unwrap();
        state.apply(tool_start("toolu_1", "query_db")).unwrap();
        state.apply(stop(StopReason::ToolUse)).unwrap();
        state.take_pending();
        state.complete_round();
        assert_eq!(state.phase(), Phase::RoundComplete);

        state.begin_stream();
        assert_eq!(state.phase(), Phase::StreamingText);
        state.apply(text("Part two.")).unwrap();
        assert_eq!(state.answer(), "Part one. Part two.");
    }

    #[test]
    fn test_sources_deduplicated_across_rounds() {
        use lexbot_types::chat::SourceDocument;

        let mut state = RoundState::new();
        state.add_sources([SourceDocument {
            title: "a".to_string(),
            uri: "doc/1".to_string(),
        }]);
        state.add_sources([
            SourceDocument {
                title: "a duplicate".to_string(),
                uri: "doc/1".to_string(),
            },
            SourceDocument {
                title: "b".to_string(),
                uri: "doc/2".to_string(),
            },
        ]);

        let (_, sources) = state.into_answer_and_sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "a");
    }
}
