use std::sync::Arc;

use crate::agent::RagAgentService;
use crate::core::config::{AgentConfig, RetrievalBackend};
use crate::llm::{CompletionProvider, OpenRouterProvider};
use crate::rag::{CohereEmbedder, HttpRetrievalClient, QdrantRetriever, RetrievalClient};
use crate::session::InMemorySessionStore;

pub mod error;

use error::InitializationError;

/// State shared by every route: the loaded configuration and the agent
/// service with its collaborators already wired in.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AgentConfig>,
    pub agent: Arc<RagAgentService>,
}

impl AppState {
    pub fn new(config: AgentConfig, agent: RagAgentService) -> Self {
        Self {
            config: Arc::new(config),
            agent: Arc::new(agent),
        }
    }

    /// Builds the retrieval client for the configured backend, the
    /// completion provider and the session store, then probes retrieval.
    /// An unreachable retrieval backend is logged, not fatal.
    pub async fn initialize(config: AgentConfig) -> Result<Arc<Self>, InitializationError> {
        let retrieval = build_retrieval_client(&config)?;
        let completion: Arc<dyn CompletionProvider> =
            Arc::new(OpenRouterProvider::from_config(&config.llm));
        let sessions = Arc::new(InMemorySessionStore::new());

        let agent = RagAgentService::new(&config, retrieval, completion, sessions);

        if agent.validate_retrieval_connection().await {
            tracing::info!("Retrieval backend reachable");
        } else {
            tracing::warn!("Retrieval backend is not reachable; chat requests may fail");
        }

        tracing::info!(
            agent = %config.agent.name,
            model = %config.llm.model,
            "RAG agent service initialized"
        );

        Ok(Arc::new(Self::new(config, agent)))
    }
}

fn build_retrieval_client(
    config: &AgentConfig,
) -> Result<Arc<dyn RetrievalClient>, InitializationError> {
    let timeout = config.retrieval.timeout();
    match config.retrieval.backend {
        RetrievalBackend::Qdrant => {
            let embedder = CohereEmbedder::from_config(&config.embedding, timeout)
                .map_err(|e| InitializationError::Embedding(e.into()))?;
            let retriever = QdrantRetriever::new(&config.vector_store, Arc::new(embedder), timeout)
                .map_err(|e| InitializationError::Retrieval(e.into()))?;
            tracing::info!(
                collection = %config.vector_store.collection_name,
                "Using Qdrant retrieval"
            );
            Ok(Arc::new(retriever))
        }
        RetrievalBackend::Http => {
            let client = HttpRetrievalClient::from_config(&config.retrieval)
                .map_err(|e| InitializationError::Retrieval(e.into()))?;
            tracing::info!(url = %config.retrieval.api_url, "Using HTTP retrieval service");
            Ok(Arc::new(client))
        }
    }
}
