use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::CompletionProvider;
use super::types::ChatRequest;
use crate::core::config::LlmConfig;
use crate::core::errors::ApiError;

/// Chat-completion client for OpenRouter or any other OpenAI-compatible
/// endpoint.
#[derive(Clone)]
pub struct OpenRouterProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenRouterProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/models", self.base_url);
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
        }

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
                format!("chat completion failed with {}: {}", status, text),
            ));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::upstream(self.name(), e))?;

        extract_content(&payload).map_err(|reason| ApiError::upstream(self.name(), reason))
    }
}

/// Reads `choices[0].message.content`. In-band `error` objects and bodies
/// without a text content are failures even under a 2xx status.
fn extract_content(payload: &Value) -> Result<String, String> {
    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(format!("chat completion returned an error: {}", message));
    }

    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "chat completion returned no message content".to_string())
}
