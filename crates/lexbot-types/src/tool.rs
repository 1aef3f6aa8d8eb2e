//! Tool call types and the tool schemas exposed to the model.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Name of a tool the model may invoke.
///
/// Unrecognized names are preserved so the orchestrator can substitute
/// a failure result instead of aborting the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolName {
    QueryDb,
    GetActOrResolve,
    Other(String),
}

impl ToolName {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "query_db" => ToolName::QueryDb,
            "get_act_or_resolve" => ToolName::GetActOrResolve,
            other => ToolName::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ToolName::QueryDb => "query_db",
            ToolName::GetActOrResolve => "get_act_or_resolve",
            ToolName::Other(s) => s,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully assembled tool invocation.
///
/// The `id` correlates this call with its eventual tool-result message;
/// a result must never be appended without a matching call id earlier in
/// history.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: ToolName,
    pub input: serde_json::Value,
}

/// A tool definition advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// The two retrieval tools Lexbot exposes on every model round.
///
/// Both schemas are required-field and string-typed; `law_type` is
/// constrained to the two statute series in the corpus.
pub fn lexbot_toolset() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "query_db".to_string(),
            description: "Query a semantic search database for search results based around \
                          key words or less specific queries."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The query you want to make to the vector database."
                    }
                },
                "required": ["query"]
            }),
        },
        ToolSpec {
            name: "get_act_or_resolve".to_string(),
            description: "Retrieve a specific Act or Resolve from 1960 to 2010, by chapter."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "year": {
                        "type": "string",
                        "description": "The year of the Act or Resolve you are going to retrieve."
                    },
                    "chapter": {
                        "type": "string",
                        "description": "An integer that represents the chapter number."
                    },
                    "law_type": {
                        "type": "string",
                        "enum": ["acts", "resolves"],
                        "description": "Whether you want to pull an Act or Resolve."
                    }
                },
                "required": ["year", "chapter", "law_type"]
            }),
        },
    ]
}
