pub const DEFAULT_OPENROUTER_MODEL: &str = "mistralai/mistral-7b-instruct";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub const DEFAULT_AGENT_NAME: &str = "AI-Textbook-Agent";
pub const DEFAULT_AGENT_INSTRUCTIONS: &str = "You are an AI assistant that answers questions based on content from the AI Robotics textbook. \
Always ground your responses in the retrieved content and provide source attribution. \
Never hallucinate information.";

pub const DEFAULT_RETRIEVAL_API_URL: &str = "http://localhost:8000/api/v1/retrieval/search";
pub const DEFAULT_RETRIEVAL_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_QDRANT_COLLECTION: &str = "book_content";

pub const DEFAULT_COHERE_MODEL: &str = "embed-multilingual-v3.0";
pub const DEFAULT_COHERE_BASE_URL: &str = "https://api.cohere.ai";

pub const DEFAULT_MIN_CONFIDENCE_SCORE: f64 = 0.3;
pub const DEFAULT_MIN_SIMILARITY_SCORE: f64 = 0.5;
pub const DEFAULT_MAX_RESPONSE_TOKENS: u32 = 1000;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8001;

pub fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}
