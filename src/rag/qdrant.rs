//! Qdrant retrieval over the REST API.
//!
//! The query is embedded first, then sent to
//! `POST /collections/{name}/points/search`. Payload fields written by the
//! ingestion pipeline (`content`, `source_url`, `chapter`, `section`) are
//! lifted into the chunk record; every other payload key is kept as metadata.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::embedding::Embedder;
use super::store::{RawChunk, RetrievalClient};
use crate::core::config::VectorStoreConfig;
use crate::core::errors::ApiError;

const API_KEY_HEADER: &str = "api-key";

pub struct QdrantRetriever {
    url: String,
    api_key: String,
    collection_name: String,
    embedder: Arc<dyn Embedder>,
    client: Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f64,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

impl QdrantRetriever {
    pub fn new(
        config: &VectorStoreConfig,
        embedder: Arc<dyn Embedder>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            collection_name: config.collection_name.clone(),
            embedder,
            client,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.url, self.collection_name)
    }
}

#[async_trait]
impl RetrievalClient for QdrantRetriever {
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn search(
        &self,
        query: &str,
        filters: &HashMap<String, Value>,
        top_k: usize,
    ) -> Result<Vec<RawChunk>, ApiError> {
        let vector = self.embedder.embed_query(query).await?;

        let mut body = json!({
            "vector": vector,
            "limit": top_k,
            "with_payload": true,
        });
        if let Some(filter) = build_filter(filters) {
            body["filter"] = filter;
        }

        let url = format!("{}/points/search", self.collection_url());
        let res = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::upstream(self.name(), e))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::upstream(
                self.name(),
                format!("search failed with {}: {}", status, text),
            ));
        }

        let payload: SearchResponse = res
            .json()
            .await
            .map_err(|e| ApiError::upstream(self.name(), e))?;

        let retrieved_at = Utc::now();
        let chunks = payload
            .result
            .into_iter()
            .map(|point| point_to_chunk(point, retrieved_at))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| ApiError::upstream(self.name(), reason))?;

        tracing::debug!(
            collection = %self.collection_name,
            hits = chunks.len(),
            "Qdrant search completed"
        );
        Ok(chunks)
    }

    async fn validate_connection(&self) -> Result<bool, ApiError> {
        let res = self
            .client
            .get(self.collection_url())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| ApiError::upstream(self.name(), e))?;
        Ok(res.status().is_success())
    }
}

/// Builds a Qdrant `must` filter. Arrays match any of their values; nulls
/// are ignored. Keys are sorted so the request body is deterministic.
fn build_filter(filters: &HashMap<String, Value>) -> Option<Value> {
    let mut keys: Vec<&String> = filters.keys().collect();
    keys.sort();

    let must: Vec<Value> = keys
        .into_iter()
        .filter_map(|key| match &filters[key] {
            Value::Null => None,
            Value::Array(values) => Some(json!({ "key": key, "match": { "any": values } })),
            value => Some(json!({ "key": key, "match": { "value": value } })),
        })
        .collect();

    if must.is_empty() {
        None
    } else {
        Some(json!({ "must": must }))
    }
}

/// Maps a REST `ScoredPoint`. Search goes through the REST port with the
/// shared reqwest client instead of `qdrant-client`, which only speaks gRPC.
/// A point without a source URL cannot be attributed and fails the search.
fn point_to_chunk(
    point: ScoredPoint,
    retrieved_at: chrono::DateTime<Utc>,
) -> Result<RawChunk, String> {
    let mut payload = point.payload.unwrap_or_default();

    let id = match point.id {
        Value::String(s) => s,
        other => other.to_string(),
    };

    let content = take_text(&mut payload, &["content", "text"]).unwrap_or_default();
    let source_url = take_text(&mut payload, &["source_url", "url"])
        .ok_or_else(|| format!("point {} has no source_url in its payload", id))?;
    let chapter = take_text(&mut payload, &["chapter"]);
    let section = take_text(&mut payload, &["section"]);
    let confidence_score = payload
        .remove("confidence_score")
        .and_then(|v| v.as_f64());

    Ok(RawChunk {
        id,
        content,
        source_url,
        chapter,
        section,
        similarity_score: point.score,
        confidence_score,
        retrieval_timestamp: retrieved_at,
        metadata: Some(payload.into_iter().collect()),
    })
}

/// Removes the first present key and renders it as text. Numbers are
/// stringified so `chapter: 3` and `chapter: "3"` read the same.
fn take_text(payload: &mut Map<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        match payload.remove(*key) {
            Some(Value::String(s)) => return Some(s),
            Some(Value::Number(n)) => return Some(n.to_string()),
            Some(Value::Null) | None => continue,
            Some(other) => return Some(other.to_string()),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, ApiError> {
            Ok(vec![0.5, 0.25])
        }
    }

    fn retriever(url: String) -> QdrantRetriever {
        let config = VectorStoreConfig {
            url,
            api_key: "qd-key".to_string(),
            collection_name: "book_content".to_string(),
        };
        QdrantRetriever::new(&config, Arc::new(FixedEmbedder), Duration::from_secs(5))
            .expect("client builds")
    }

    #[test]
    fn filter_uses_match_value_and_match_any() {
        let mut filters = HashMap::new();
        filters.insert("section".to_string(), json!("intro"));
        filters.insert("chapter".to_string(), json!("1"));
        filters.insert("tags".to_string(), json!(["ros", "slam"]));
        filters.insert("ignored".to_string(), Value::Null);

        let filter = build_filter(&filters).expect("filter");

        assert_eq!(
            filter,
            json!({ "must": [
                { "key": "chapter", "match": { "value": "1" } },
                { "key": "section", "match": { "value": "intro" } },
                { "key": "tags", "match": { "any": ["ros", "slam"] } }
            ]})
        );
    }

    #[test]
    fn empty_filters_produce_no_filter() {
        assert_eq!(build_filter(&HashMap::new()), None);
    }

    #[tokio::test]
    async fn search_maps_scored_points_into_chunks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/collections/book_content/points/search")
            .match_header("api-key", "qd-key")
            .match_body(Matcher::PartialJson(json!({
                "vector": [0.5, 0.25],
                "limit": 3,
                "with_payload": true,
                "filter": { "must": [ { "key": "chapter", "match": { "value": "2" } } ] }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "result": [
                        {
                            "id": 7,
                            "score": 0.91,
                            "payload": {
                                "content": "Forward kinematics maps joints to poses.",
                                "source_url": "https://book.example/ch2",
                                "chapter": 2,
                                "section": "2.1",
                                "title": "Kinematics"
                            }
                        },
                        {
                            "id": "5f0c7a2e-0000-4000-8000-000000000000",
                            "score": 0.64,
                            "payload": { "text": "Alt field name.", "url": "https://book.example/ch2b" }
                        }
                    ],
                    "status": "ok",
                    "time": 0.002
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut filters = HashMap::new();
        filters.insert("chapter".to_string(), json!("2"));

        let chunks = retriever(server.url())
            .search("kinematics", &filters, 3)
            .await
            .expect("search");

        mock.assert_async().await;
        assert_eq!(chunks.len(), 2);

        let first = &chunks[0];
        assert_eq!(first.id, "7");
        assert_eq!(first.content, "Forward kinematics maps joints to poses.");
        assert_eq!(first.source_url, "https://book.example/ch2");
        assert_eq!(first.chapter.as_deref(), Some("2"));
        assert_eq!(first.section.as_deref(), Some("2.1"));
        assert_eq!(first.similarity_score, 0.91);
        let metadata = first.metadata.as_ref().expect("metadata");
        assert_eq!(metadata.get("title"), Some(&json!("Kinematics")));
        assert!(!metadata.contains_key("content"));

        let second = &chunks[1];
        assert_eq!(second.id, "5f0c7a2e-0000-4000-8000-000000000000");
        assert_eq!(second.content, "Alt field name.");
        assert_eq!(second.source_url, "https://book.example/ch2b");
        assert_eq!(second.chapter, None);
    }

    #[tokio::test]
    async fn point_without_source_url_fails_the_search() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/collections/book_content/points/search")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "result": [
                        { "id": 1, "score": 0.8, "payload": { "content": "Orphan chunk." } }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = retriever(server.url())
            .search("q", &HashMap::new(), 5)
            .await
            .unwrap_err();

        match err {
            ApiError::Upstream(message) => {
                assert!(message.contains("qdrant"));
                assert!(message.contains("source_url"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_error_status_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/collections/book_content/points/search")
            .with_status(404)
            .with_body(r#"{"status":{"error":"Collection not found"}}"#)
            .create_async()
            .await;

        let err = retriever(server.url())
            .search("q", &HashMap::new(), 5)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Upstream(ref m) if m.contains("404")));
    }

    #[tokio::test]
    async fn validate_connection_checks_collection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/collections/book_content")
            .match_header("api-key", "qd-key")
            .with_status(200)
            .with_body(r#"{"result":{"status":"green"},"status":"ok"}"#)
            .create_async()
            .await;

        assert!(retriever(server.url()).validate_connection().await.unwrap());
    }

    #[tokio::test]
    async fn validate_connection_reports_missing_collection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/collections/book_content")
            .with_status(404)
            .create_async()
            .await;

        assert!(!retriever(server.url()).validate_connection().await.unwrap());
    }
}
