//! Semantic retrieval collaborator contract.
//!
//! The retriever is infallible by design: when the backend returns
//! nothing usable (or fails outright), it degrades to a fixed fallback
//! content string so the engine can still produce an answer instead of
//! aborting the request.

pub mod sources;

use lexbot_types::chat::SourceDocument;

pub use sources::SourceAccumulator;

/// Minimum relevance score a retrieved passage must exceed to be
/// trusted as context. Results at or below this are dropped.
pub const CONFIDENCE_FLOOR: f32 = 0.1;

/// Fallback content when the query matched nothing above the floor.
pub const NO_KNOWLEDGE_FALLBACK: &str = "No knowledge available! This query is likely outside \
     the scope of your knowledge. Please provide a general answer but do not attempt to \
     provide specific details.";

/// Fallback content when the retrieval backend itself failed.
pub const SEARCH_UNAVAILABLE_FALLBACK: &str = "No knowledge available! There is something \
     wrong with the search tool. Please tell the user to submit feedback. Please provide a \
     general answer but do not attempt to provide specific details.";

/// One raw result from the semantic index, before filtering.
#[derive(Debug, Clone)]
pub struct RankedPassage {
    pub text: String,
    pub uri: String,
    pub score: f32,
}

/// Assembled retrieval output: context for the model plus deduplicated
/// citations for the client.
#[derive(Debug, Clone)]
pub struct RetrievedPassages {
    pub content: String,
    pub sources: Vec<SourceDocument>,
}

impl RetrievedPassages {
    /// The degraded result used when nothing relevant was found.
    pub fn no_knowledge() -> Self {
        Self {
            content: NO_KNOWLEDGE_FALLBACK.to_string(),
            sources: Vec::new(),
        }
    }

    /// The degraded result used when the backend errored.
    pub fn search_unavailable() -> Self {
        Self {
            content: SEARCH_UNAVAILABLE_FALLBACK.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Trait for the semantic search collaborator.
///
/// Implementations live in lexbot-infra (e.g., `BedrockKnowledgeBase`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait KnowledgeRetriever: Send + Sync {
    /// Retrieve passages relevant to `query`.
    ///
    /// Never fails: backend errors and empty result sets both map to a
    /// fixed fallback content string with an empty source list.
    fn retrieve(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = RetrievedPassages> + Send;
}

/// Assemble raw index results into model context and citations.
///
/// Drops results scored at or below [`CONFIDENCE_FLOOR`], joins the
/// survivors' text and uri into the context block, and deduplicates
/// citations by uri (first-seen title wins). An empty surviving set
/// yields the no-knowledge fallback.
pub fn assemble_passages(results: Vec<RankedPassage>) -> RetrievedPassages {
    let confident: Vec<RankedPassage> = results
        .into_iter()
        .filter(|r| r.score > CONFIDENCE_FLOOR)
        .collect();

    if confident.is_empty() {
        tracing::warn!("no relevant passages above confidence floor");
        return RetrievedPassages::no_knowledge();
    }

    let content = confident
        .iter()
        .map(|r| format!("{}{}", r.text, r.uri))
        .collect::<Vec<_>>()
        .join("\n");

    let mut accumulator = SourceAccumulator::new();
    for result in &confident {
        accumulator.add(SourceDocument {
            title: source_title(&result.uri),
            uri: result.uri.clone(),
        });
    }

    RetrievedPassages {
        content,
        sources: accumulator.into_vec(),
    }
}

/// Derive a display title from a document uri: the final path segment
/// plus the index attribution suffix.
pub fn source_title(uri: &str) -> String {
    let name = uri.rsplit('/').next().unwrap_or(uri);
    format!("{name} (Bedrock Knowledge Base)")
}
