use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::prompt::{build_context_text, build_prompt};
use super::types::{
    AgentRequest, AgentResponse, ConversationSession, Filters, QueryType, RetrievedChunk,
};
use super::validator::{ResponseValidator, ValidationReport, NO_CONTEXT_CONFIDENCE};
use crate::core::config::AgentConfig;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, CompletionProvider};
use crate::rag::RetrievalClient;
use crate::session::SessionStore;

/// Sampling temperature for answers.
pub const COMPLETION_TEMPERATURE: f64 = 0.3;

/// What retrieval, if any, a request calls for.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalPlan {
    Search(Filters),
    Skip,
}

impl RetrievalPlan {
    pub fn for_request(request: &AgentRequest) -> Self {
        match request.query_type {
            QueryType::General => Self::Search(request.filters.clone().unwrap_or_default()),
            QueryType::ChapterSpecific => match request.chapter_filter.as_deref() {
                Some(chapter) if !chapter.is_empty() => {
                    // Request filters are applied last and may replace `chapter`.
                    let mut filters = Filters::new();
                    filters.insert("chapter".to_string(), Value::String(chapter.to_string()));
                    if let Some(extra) = &request.filters {
                        filters.extend(extra.clone());
                    }
                    Self::Search(filters)
                }
                _ => Self::Search(Filters::new()),
            },
            QueryType::UserContext => Self::Skip,
        }
    }
}

/// Settings the pipeline reads on every request.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub instructions: String,
    pub max_response_tokens: u32,
}

impl PipelineSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            instructions: config.agent.instructions.clone(),
            max_response_tokens: config.llm.max_response_tokens,
        }
    }
}

/// Orchestrates retrieval, prompt assembly, completion and validation for a
/// single chat request, and owns the conversation sessions.
pub struct RagAgentService {
    retrieval: Arc<dyn RetrievalClient>,
    completion: Arc<dyn CompletionProvider>,
    sessions: Arc<dyn SessionStore>,
    settings: PipelineSettings,
    validator: ResponseValidator,
}

impl RagAgentService {
    pub fn new(
        config: &AgentConfig,
        retrieval: Arc<dyn RetrievalClient>,
        completion: Arc<dyn CompletionProvider>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            retrieval,
            completion,
            sessions,
            settings: PipelineSettings::from_config(config),
            validator: ResponseValidator::from_thresholds(&config.thresholds),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn process_request(&self, request: &AgentRequest) -> Result<AgentResponse, ApiError> {
        request.validate()?;

        tracing::info!(
            query_type = ?request.query_type,
            "Processing request: {}...",
            preview(&request.query, 50)
        );

        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(|| format!("conv_{}", Utc::now().timestamp()));

        let raw_chunks = match RetrievalPlan::for_request(request) {
            RetrievalPlan::Search(filters) => self
                .retrieval
                .search(&request.query, &filters, request.top_k)
                .await
                .map_err(|err| {
                    tracing::error!(%conversation_id, "Retrieval failed: {}", err);
                    err
                })?,
            RetrievalPlan::Skip => {
                tracing::info!("Processing in user context mode - no retrieval performed");
                Vec::new()
            }
        };

        let retrieved_chunks: Vec<RetrievedChunk> =
            raw_chunks.into_iter().map(RetrievedChunk::from).collect();
        let source_attribution: BTreeSet<String> = retrieved_chunks
            .iter()
            .map(|chunk| chunk.source_url.clone())
            .collect();

        let context_text = build_context_text(request, &retrieved_chunks);
        let prompt = build_prompt(&request.query, &context_text);

        let chat_request = ChatRequest::new(vec![
            ChatMessage::system(self.settings.instructions.clone()),
            ChatMessage::user(prompt),
        ])
        .with_max_tokens(self.settings.max_response_tokens)
        .with_temperature(COMPLETION_TEMPERATURE);

        let answer = self
            .completion
            .chat(chat_request, &self.settings.model)
            .await
            .map_err(|err| {
                tracing::error!(%conversation_id, "Completion failed: {}", err);
                err
            })?;

        let confidence_score = confidence_from_chunks(&retrieved_chunks);
        let has_sufficient_context =
            !retrieved_chunks.is_empty() || request.query_type == QueryType::UserContext;
        let chunk_count = retrieved_chunks.len();

        let response = AgentResponse {
            response: answer,
            query: request.query.clone(),
            retrieved_chunks,
            source_attribution,
            confidence_score,
            query_type: request.query_type,
            conversation_id,
            has_sufficient_context,
            hallucination_prevention_applied: true,
        };

        let report = self.validator.validate(&response);
        if !report.is_valid {
            tracing::warn!("Response validation issues: {:?}", report.issues);
        }

        tracing::info!(
            conversation_id = %response.conversation_id,
            "Request processed successfully. Confidence: {:.2}, Chunks: {}",
            confidence_score,
            chunk_count
        );
        Ok(response)
    }

    pub fn validate_response(&self, response: &AgentResponse) -> ValidationReport {
        self.validator.validate(response)
    }

    pub async fn create_conversation_session(&self) -> Result<ConversationSession, ApiError> {
        let session = ConversationSession::new(Uuid::new_v4().to_string());
        self.sessions.insert(session.clone()).await?;
        tracing::info!("Created new conversation session: {}", session.id);
        Ok(session)
    }

    pub async fn get_conversation_session(
        &self,
        session_id: &str,
    ) -> Result<Option<ConversationSession>, ApiError> {
        let session = self.sessions.get(session_id).await?;
        if session.is_some() {
            tracing::info!("Retrieved conversation session: {}", session_id);
        } else {
            tracing::warn!("Conversation session not found: {}", session_id);
        }
        Ok(session)
    }

    pub async fn clear_conversation(&self, session_id: &str) -> Result<bool, ApiError> {
        let removed = self.sessions.remove(session_id).await?;
        if removed {
            tracing::info!("Cleared conversation session: {}", session_id);
        }
        Ok(removed)
    }

    /// Health probe for the retrieval backend. Errors are logged and
    /// reported as `false`.
    pub async fn validate_retrieval_connection(&self) -> bool {
        match self.retrieval.validate_connection().await {
            Ok(connected) => connected,
            Err(err) => {
                tracing::error!("Retrieval connection validation failed: {}", err);
                false
            }
        }
    }

    pub async fn validate_completion_connection(&self) -> bool {
        match self.completion.health_check().await {
            Ok(healthy) => healthy,
            Err(err) => {
                tracing::error!(
                    "{} health check failed: {}",
                    self.completion.name(),
                    err
                );
                false
            }
        }
    }
}

/// Mean similarity of the retrieved chunks capped at 1.0, or the
/// no-context floor when nothing was retrieved.
pub fn confidence_from_chunks(chunks: &[RetrievedChunk]) -> f64 {
    if chunks.is_empty() {
        return NO_CONTEXT_CONFIDENCE;
    }
    let total: f64 = chunks.iter().map(|chunk| chunk.similarity_score).sum();
    (total / chunks.len() as f64).min(1.0)
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
