pub mod prompt;
pub mod service;
pub mod types;
pub mod validator;

pub use service::{RagAgentService, RetrievalPlan};
pub use types::{
    AgentRequest, AgentResponse, ConversationSession, ConversationTurn, QueryType, RetrievedChunk,
};
pub use validator::{ResponseValidator, ValidationReport};
