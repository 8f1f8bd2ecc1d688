pub mod defaults;
pub mod env;
pub mod redact;
pub mod settings;
pub mod validation;

pub use settings::{
    AgentConfig, AgentSettings, EmbeddingConfig, LlmConfig, RetrievalBackend, RetrievalConfig,
    ServerConfig, Thresholds, VectorStoreConfig,
};
pub use validation::ConfigError;
