//! Client for a standalone retrieval service reachable over HTTP.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::store::{RawChunk, RetrievalClient};
use crate::core::config::RetrievalConfig;
use crate::core::errors::ApiError;

pub struct HttpRetrievalClient {
    url: String,
    client: Client,
}

/// The service may answer with a bare list or wrap it in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum SearchPayload {
    List(Vec<RawChunk>),
    Wrapped {
        #[serde(alias = "results")]
        chunks: Vec<RawChunk>,
    },
}

impl SearchPayload {
    fn into_chunks(self) -> Vec<RawChunk> {
        match self {
            SearchPayload::List(chunks) => chunks,
            SearchPayload::Wrapped { chunks } => chunks,
        }
    }
}

impl HttpRetrievalClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn from_config(config: &RetrievalConfig) -> Result<Self, ApiError> {
        Self::new(config.api_url.clone(), config.timeout())
    }
}

#[async_trait]
impl RetrievalClient for HttpRetrievalClient {
    fn name(&self) -> &str {
        "retrieval-service"
    }

    async fn search(
        &self,
        query: &str,
        filters: &HashMap<String, Value>,
        top_k: usize,
    ) -> Result<Vec<RawChunk>, ApiError> {
        let body = json!({
            "query": query,
            "filters": filters,
            "top_k": top_k,
        });

        let res = self
            .client
            .post(&self.url)
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

        let payload: SearchPayload = res
            .json()
            .await
            .map_err(|e| ApiError::upstream(self.name(), e))?;
        Ok(payload.into_chunks())
    }

    async fn validate_connection(&self) -> Result<bool, ApiError> {
        let res = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ApiError::upstream(self.name(), e))?;
        // 405 from a POST-only route still counts as reachable.
        Ok(!res.status().is_server_error())
    }
}
