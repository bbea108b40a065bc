// ABOUTME: Elasticsearch-backed context retrieval over the HTTP search API
// ABOUTME: Full-text search on per-chatbot indexes with failure absorbed upstream
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{ContextAssembler, RetrievedChunk};
use crate::errors::{AppError, AppResult};

/// Each chatbot owns one index, named by its ID
const INDEX_PREFIX: &str = "chatbot_";

/// Elasticsearch document retriever
#[derive(Debug, Clone)]
pub struct ElasticsearchRetriever {
    base_url: String,
    client: Client,
}

impl ElasticsearchRetriever {
    /// Create a retriever against the given Elasticsearch base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client: Client::new(),
        }
    }

    /// Index name for a chatbot
    fn index_name(chatbot_id: &str) -> String {
        format!("{INDEX_PREFIX}{chatbot_id}")
    }

    /// Parse `hits.hits` from a search response body
    fn parse_hits(body: &Value) -> Vec<RetrievedChunk> {
        let Some(hits) = body["hits"]["hits"].as_array() else {
            return Vec::new();
        };

        hits.iter()
            .map(|hit| {
                let source = &hit["_source"];
                #[allow(clippy::cast_possible_truncation)]
                let score = hit["_score"].as_f64().unwrap_or(0.0) as f32;
                RetrievedChunk {
                    file_path: source["file_path"].as_str().unwrap_or("").to_owned(),
                    text: source["text"].as_str().unwrap_or("").to_owned(),
                    score,
                }
            })
            .collect()
    }
}

#[async_trait]
impl ContextAssembler for ElasticsearchRetriever {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    #[instrument(skip(self, query))]
    async fn gather(
        &self,
        chatbot_id: &str,
        query: &str,
        limit: usize,
    ) -> AppResult<Vec<RetrievedChunk>> {
        let index = Self::index_name(chatbot_id);
        let url = format!("{}/{index}/_search", self.base_url);

        let search_body = json!({
            "size": limit,
            "query": {
                "match": {
                    "text": query
                }
            },
            "_source": ["text", "file_path"]
        });

        let response = self
            .client
            .post(&url)
            .json(&search_body)
            .send()
            .await
            .map_err(|e| {
                AppError::retrieval_unavailable(format!("Elasticsearch unreachable: {e}"))
            })?;

        let status = response.status();

        // A missing index means no documents were ingested for this chatbot.
        if status.as_u16() == 404 {
            debug!(%index, "Index not found, returning empty context");
            return Ok(Vec::new());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::retrieval_unavailable(format!(
                "Elasticsearch search failed ({status}): {body}"
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::retrieval_unavailable(format!("Invalid search response: {e}"))
        })?;

        let chunks = Self::parse_hits(&body);
        debug!(%index, count = chunks.len(), "Retrieved context chunks");
        Ok(chunks)
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> AppResult<()> {
        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| {
                AppError::retrieval_unavailable(format!("Elasticsearch unreachable: {e}"))
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::retrieval_unavailable(format!(
                "Elasticsearch ping returned {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_index_name() {
        assert_eq!(
            ElasticsearchRetriever::index_name("abc-123"),
            "chatbot_abc-123"
        );
    }

    #[test]
    fn test_parse_hits() {
        let body = json!({
            "hits": {
                "hits": [
                    {"_score": 1.5, "_source": {"text": "first", "file_path": "a.md"}},
                    {"_score": 0.5, "_source": {"text": "second", "file_path": "b.md"}}
                ]
            }
        });
        let chunks = ElasticsearchRetriever::parse_hits(&body);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].file_path, "a.md");
        assert_eq!(chunks[0].text, "first");
        assert!((chunks[0].score - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_hits_empty_body() {
        assert!(ElasticsearchRetriever::parse_hits(&json!({})).is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let retriever = ElasticsearchRetriever::new("http://localhost:9200/");
        assert_eq!(retriever.base_url, "http://localhost:9200");
    }
}
