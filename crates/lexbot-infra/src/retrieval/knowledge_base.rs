//! BedrockKnowledgeBase -- [`KnowledgeRetriever`] implementation backed
//! by the Bedrock agent-runtime `retrieve` API.
//!
//! Raw index results are mapped into [`RankedPassage`]s and assembled
//! (confidence filter, uri dedup, fallback selection) by the pure
//! helpers in `lexbot_core::retrieval`. This client never fails its
//! caller: backend errors degrade to the fixed search-unavailable
//! fallback so the engine can still answer.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use lexbot_core::retrieval::{
    assemble_passages, KnowledgeRetriever, RankedPassage, RetrievedPassages,
};
use lexbot_types::error::RetrievalError;

/// How many raw results to request from the index per query.
const NUMBER_OF_RESULTS: u32 = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest {
    retrieval_query: RetrievalQuery,
    retrieval_configuration: RetrievalConfiguration,
}

#[derive(Debug, Serialize)]
struct RetrievalQuery {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfiguration {
    vector_search_configuration: VectorSearchConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VectorSearchConfiguration {
    number_of_results: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_results: Vec<RetrievalResult>,
}

#[derive(Debug, Deserialize)]
struct RetrievalResult {
    content: RetrievalContent,
    location: RetrievalLocation,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct RetrievalContent {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalLocation {
    s3_location: S3Location,
}

#[derive(Debug, Deserialize)]
struct S3Location {
    uri: String,
}

/// Bedrock knowledge-base retrieval client.
pub struct BedrockKnowledgeBase {
    client: reqwest::Client,
    api_key: SecretString,
    region: String,
    knowledge_base_id: String,
}

impl BedrockKnowledgeBase {
    pub fn new(
        client: reqwest::Client,
        api_key: SecretString,
        knowledge_base_id: String,
        region: String,
    ) -> Self {
        Self {
            client,
            api_key,
            region,
            knowledge_base_id,
        }
    }

    fn url(&self) -> String {
        format!(
            "https://bedrock-agent-runtime.{}.amazonaws.com/knowledgebases/{}/retrieve",
            self.region, self.knowledge_base_id
        )
    }

    async fn query_index(&self, query: &str) -> Result<Vec<RankedPassage>, RetrievalError> {
        let body = RetrieveRequest {
            retrieval_query: RetrievalQuery {
                text: query.to_string(),
            },
            retrieval_configuration: RetrievalConfiguration {
                vector_search_configuration: VectorSearchConfiguration {
                    number_of_results: NUMBER_OF_RESULTS,
                },
            },
        };

        let response = self
            .client
            .post(self.url())
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Backend(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Backend(format!(
                "HTTP {status}: {error_body}"
            )));
        }

        let parsed: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Malformed(e.to_string()))?;

        Ok(parsed
            .retrieval_results
            .into_iter()
            .map(|r| RankedPassage {
                text: r.content.text,
                uri: r.location.s3_location.uri,
                score: r.score,
            })
            .collect())
    }
}

impl KnowledgeRetriever for BedrockKnowledgeBase {
    async fn retrieve(&self, query: &str) -> RetrievedPassages {
        tracing::debug!(kb_id = %self.knowledge_base_id, "querying knowledge base");
        match self.query_index(query).await {
            Ok(results) => assemble_passages(results),
            Err(err) => {
                tracing::error!(error = %err, kb_id = %self.knowledge_base_id, "could not retrieve knowledge base documents");
                RetrievedPassages::search_unavailable()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieve_request_wire_shape() {
        let body = RetrieveRequest {
            retrieval_query: RetrievalQuery {
                text: "copay".to_string(),
            },
            retrieval_configuration: RetrievalConfiguration {
                vector_search_configuration: VectorSearchConfiguration {
                    number_of_results: NUMBER_OF_RESULTS,
                },
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["retrievalQuery"]["text"], "copay");
        assert_eq!(
            json["retrievalConfiguration"]["vectorSearchConfiguration"]["numberOfResults"],
            10
        );
    }

    #[test]
    fn test_retrieve_response_parsing() {
        let json = r#"{
            "retrievalResults": [
                {
                    "content": {"text": "Copays are $20."},
                    "location": {"s3Location": {"uri": "s3://corpus/plans/chapter-1.txt"}},
                    "score": 0.72
                },
                {
                    "content": {"text": "Unscored result."},
                    "location": {"s3Location": {"uri": "s3://corpus/plans/chapter-2.txt"}}
                }
            ]
        }"#;
        let parsed: RetrieveResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.retrieval_results.len(), 2);
        assert_eq!(parsed.retrieval_results[0].score, 0.72);
        // Missing score defaults to 0.0 and falls below the floor.
        assert_eq!(parsed.retrieval_results[1].score, 0.0);
    }

    #[test]
    fn test_retrieve_response_empty_results_default() {
        let parsed: RetrieveResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.retrieval_results.is_empty());
    }

    #[test]
    fn test_url_construction() {
        let kb = BedrockKnowledgeBase::new(
            reqwest::Client::new(),
            SecretString::from("test-key"),
            "KB12345".to_string(),
            "us-east-1".to_string(),
        );
        assert_eq!(
            kb.url(),
            "https://bedrock-agent-runtime.us-east-1.amazonaws.com/knowledgebases/KB12345/retrieve"
        );
    }
}
