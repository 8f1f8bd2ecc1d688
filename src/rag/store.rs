//! RetrievalClient trait: the seam between the agent and whatever service
//! performs vector search over the textbook.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;

/// A chunk record as returned by a retrieval backend, before it is mapped
/// into the agent's `RetrievedChunk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChunk {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub content: String,
    pub source_url: String,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    pub similarity_score: f64,
    /// Falls back to the similarity score when the backend does not supply it.
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default = "Utc::now", deserialize_with = "flexible_timestamp")]
    pub retrieval_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, Value>>,
}

/// Abstract trait for retrieval backends.
///
/// Errors from `search` are fatal for the request that issued them; the
/// agent does not retry.
#[async_trait]
pub trait RetrievalClient: Send + Sync {
    /// backend name used in logs and error messages
    fn name(&self) -> &str;

    /// Return up to `top_k` chunks relevant to `query`, restricted by
    /// `filters` (metadata key → required value).
    async fn search(
        &self,
        query: &str,
        filters: &HashMap<String, Value>,
        top_k: usize,
    ) -> Result<Vec<RawChunk>, ApiError>;

    /// Check that the backend is reachable.
    async fn validate_connection(&self) -> Result<bool, ApiError>;
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Accepts RFC 3339 timestamps as well as ISO timestamps without an offset,
/// which are taken to be UTC.
fn flexible_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid retrieval_timestamp: {}", raw))
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
