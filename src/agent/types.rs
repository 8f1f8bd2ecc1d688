use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;
use crate::rag::RawChunk;

/// Metadata filters forwarded to the retrieval collaborator.
pub type Filters = HashMap<String, Value>;

pub const DEFAULT_TOP_K: usize = 5;
pub const MAX_TOP_K: usize = 50;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Search across the whole book.
    #[default]
    #[serde(alias = "GENERAL")]
    General,
    /// Search restricted to `chapter_filter`.
    #[serde(alias = "CHAPTER_SPECIFIC")]
    ChapterSpecific,
    /// Answer from caller-supplied context only; no retrieval.
    #[serde(alias = "USER_CONTEXT")]
    UserContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub query: String,
    #[serde(default)]
    pub query_type: QueryType,
    #[serde(default)]
    pub chapter_filter: Option<String>,
    #[serde(default)]
    pub filters: Option<Filters>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub user_context: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl AgentRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            query_type: QueryType::General,
            chapter_filter: None,
            filters: None,
            top_k: DEFAULT_TOP_K,
            user_context: None,
            conversation_id: None,
        }
    }

    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    pub fn with_chapter_filter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter_filter = Some(chapter.into());
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_user_context(mut self, context: impl Into<String>) -> Self {
        self.user_context = Some(context.into());
        self
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.query.trim().is_empty() {
            return Err(ApiError::BadRequest("query must not be empty".to_string()));
        }
        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(ApiError::BadRequest(format!(
                "top_k must be between 1 and {}",
                MAX_TOP_K
            )));
        }
        Ok(())
    }

    /// Caller-supplied context, if any non-empty text was sent.
    pub fn user_context_text(&self) -> Option<&str> {
        self.user_context.as_deref().filter(|ctx| !ctx.is_empty())
    }
}

/// A chunk of textbook content returned by retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub content: String,
    pub source_url: String,
    pub chapter: Option<String>,
    pub section: Option<String>,
    pub similarity_score: f64,
    pub confidence_score: f64,
    pub retrieval_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl From<RawChunk> for RetrievedChunk {
    fn from(raw: RawChunk) -> Self {
        let similarity_score = clamp_unit(raw.similarity_score);
        let confidence_score = raw
            .confidence_score
            .map(clamp_unit)
            .unwrap_or(similarity_score);
        Self {
            id: raw.id,
            content: raw.content,
            source_url: raw.source_url,
            chapter: raw.chapter,
            section: raw.section,
            similarity_score,
            confidence_score,
            retrieval_timestamp: raw.retrieval_timestamp,
            metadata: raw.metadata.unwrap_or_default(),
        }
    }
}

fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub response: String,
    pub query: String,
    pub retrieved_chunks: Vec<RetrievedChunk>,
    pub source_attribution: BTreeSet<String>,
    pub confidence_score: f64,
    pub query_type: QueryType,
    pub conversation_id: String,
    pub has_sufficient_context: bool,
    pub hallucination_prevention_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

impl ConversationSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            history: Vec::new(),
        }
    }
}
