//! Query embedding via the Cohere embed API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::core::config::EmbeddingConfig;
use crate::core::errors::ApiError;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Embed a single search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ApiError>;
}

#[derive(Clone)]
pub struct CohereEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl CohereEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    pub fn from_config(config: &EmbeddingConfig, timeout: Duration) -> Result<Self, ApiError> {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.model.clone(),
            timeout,
        )
    }
}

#[async_trait]
impl Embedder for CohereEmbedder {
    fn name(&self) -> &str {
        "cohere"
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let url = format!("{}/v1/embed", self.base_url);
        let body = json!({
            "texts": [text],
            "model": self.model,
            "input_type": "search_query",
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::upstream(self.name(), e))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::upstream(
                self.name(),
                format!("embed failed with {}: {}", status, text),
            ));
        }

        let payload: EmbedResponse = res
            .json()
            .await
            .map_err(|e| ApiError::upstream(self.name(), e))?;

        payload
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::upstream(self.name(), "embed returned no vectors"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn embedder(url: String) -> CohereEmbedder {
        CohereEmbedder::new(url, "co-key", "embed-multilingual-v3.0", Duration::from_secs(5))
            .expect("client builds")
    }

    #[tokio::test]
    async fn embeds_query_with_search_input_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/embed")
            .match_header("authorization", "Bearer co-key")
            .match_body(Matcher::PartialJson(json!({
                "texts": ["What is SLAM?"],
                "model": "embed-multilingual-v3.0",
                "input_type": "search_query"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"e1","embeddings":[[0.1,0.2,0.3]],"texts":["What is SLAM?"]}"#)
            .create_async()
            .await;

        let vector = embedder(server.url())
            .embed_query("What is SLAM?")
            .await
            .expect("embedding");

        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_embedding_list_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/embed")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embeddings":[]}"#)
            .create_async()
            .await;

        let err = embedder(server.url()).embed_query("q").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[tokio::test]
    async fn rejected_key_is_an_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/embed")
            .with_status(401)
            .with_body("invalid api token")
            .create_async()
            .await;

        let err = embedder(server.url()).embed_query("q").await.unwrap_err();
        match err {
            ApiError::Upstream(message) => assert!(message.contains("cohere")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
