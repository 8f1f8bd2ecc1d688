use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::defaults::*;
use super::redact::redact_sensitive_values;
use super::validation::{
    read_bool, read_f64, read_list, read_required, read_string, read_string_or, read_u64,
    with_legacy_aliases, ConfigError, Lookup,
};

#[derive(Debug, Clone, Serialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_response_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSettings {
    pub name: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalBackend {
    /// Embed with Cohere and search Qdrant directly.
    Qdrant,
    /// Delegate to a remote retrieval service.
    Http,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalConfig {
    pub backend: RetrievalBackend,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VectorStoreConfig {
    pub url: String,
    pub api_key: String,
    pub collection_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Thresholds {
    pub min_confidence_score: f64,
    pub min_similarity_score: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_confidence_score: DEFAULT_MIN_CONFIDENCE_SCORE,
            min_similarity_score: DEFAULT_MIN_SIMILARITY_SCORE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub allowed_origins: Vec<String>,
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Complete runtime configuration, resolved once at start-up and handed to
/// each component that needs it.
#[derive(Debug, Clone, Serialize)]
pub struct AgentConfig {
    pub llm: LlmConfig,
    pub agent: AgentSettings,
    pub retrieval: RetrievalConfig,
    pub vector_store: VectorStoreConfig,
    pub embedding: EmbeddingConfig,
    pub thresholds: Thresholds,
    pub server: ServerConfig,
}

impl AgentConfig {
    /// Reads the process environment. Call [`super::env::load_env_files`]
    /// first if `.env` files should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key/value source.
    ///
    /// Every missing mandatory key is collected before failing, so the error
    /// names all of them.
    pub fn from_lookup(lookup: &Lookup<'_>) -> Result<Self, ConfigError> {
        let aliased = with_legacy_aliases(lookup);
        let lookup: &Lookup<'_> = &aliased;
        let mut missing = Vec::new();

        let llm_api_key = read_required(lookup, "OPENROUTER_API_KEY", &mut missing);
        let qdrant_url = read_required(lookup, "QDRANT_URL", &mut missing);
        let qdrant_api_key = read_required(lookup, "QDRANT_API_KEY", &mut missing);
        let cohere_api_key = read_required(lookup, "COHERE_API_KEY", &mut missing);

        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables(missing));
        }

        let backend = match read_string(lookup, "RETRIEVAL_BACKEND")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("qdrant") => RetrievalBackend::Qdrant,
            Some("http") => RetrievalBackend::Http,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "RETRIEVAL_BACKEND".to_string(),
                    value: other.to_string(),
                    reason: "expected qdrant or http".to_string(),
                })
            }
        };

        let allowed_origins = match read_list(lookup, "CORS_ALLOWED_ORIGINS") {
            origins if origins.is_empty() => default_local_origins(),
            origins => origins,
        };

        Ok(Self {
            llm: LlmConfig {
                api_key: llm_api_key,
                model: read_string_or(lookup, "OPENROUTER_MODEL", DEFAULT_OPENROUTER_MODEL),
                base_url: read_string_or(lookup, "OPENROUTER_BASE_URL", DEFAULT_OPENROUTER_BASE_URL),
                max_response_tokens: read_u64(
                    lookup,
                    "MAX_RESPONSE_TOKENS",
                    u64::from(DEFAULT_MAX_RESPONSE_TOKENS),
                    1,
                    32_768,
                )? as u32,
            },
            agent: AgentSettings {
                name: read_string_or(lookup, "AGENT_NAME", DEFAULT_AGENT_NAME),
                instructions: read_string_or(lookup, "AGENT_INSTRUCTIONS", DEFAULT_AGENT_INSTRUCTIONS),
            },
            retrieval: RetrievalConfig {
                backend,
                api_url: read_string_or(lookup, "RETRIEVAL_API_URL", DEFAULT_RETRIEVAL_API_URL),
                timeout_secs: read_u64(
                    lookup,
                    "RETRIEVAL_TIMEOUT",
                    DEFAULT_RETRIEVAL_TIMEOUT_SECS,
                    1,
                    3_600,
                )?,
            },
            vector_store: VectorStoreConfig {
                url: qdrant_url,
                api_key: qdrant_api_key,
                collection_name: read_string_or(
                    lookup,
                    "QDRANT_COLLECTION_NAME",
                    DEFAULT_QDRANT_COLLECTION,
                ),
            },
            embedding: EmbeddingConfig {
                api_key: cohere_api_key,
                model: read_string_or(lookup, "COHERE_MODEL", DEFAULT_COHERE_MODEL),
                base_url: read_string_or(lookup, "COHERE_BASE_URL", DEFAULT_COHERE_BASE_URL),
            },
            thresholds: Thresholds {
                min_confidence_score: read_f64(
                    lookup,
                    "MIN_CONFIDENCE_SCORE",
                    DEFAULT_MIN_CONFIDENCE_SCORE,
                    0.0,
                    1.0,
                )?,
                min_similarity_score: read_f64(
                    lookup,
                    "MIN_SIMILARITY_SCORE",
                    DEFAULT_MIN_SIMILARITY_SCORE,
                    0.0,
                    1.0,
                )?,
            },
            server: ServerConfig {
                host: read_string_or(lookup, "AGENT_HOST", DEFAULT_HOST),
                port: read_u64(lookup, "AGENT_PORT", u64::from(DEFAULT_PORT), 0, 65_535)? as u16,
                debug: read_bool(lookup, "AGENT_DEBUG", true)?,
                allowed_origins,
                log_dir: read_string(lookup, "LOG_DIR").map(PathBuf::from),
            },
        })
    }

    /// JSON view of the configuration with secrets masked.
    pub fn redacted(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(value) => redact_sensitive_values(&value),
            Err(_) => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("QDRANT_URL", "https://qdrant.example"),
            ("QDRANT_API_KEY", "qdrant-secret"),
            ("COHERE_API_KEY", "cohere-secret"),
        ]
    }

    fn load(pairs: &[(&str, &str)]) -> Result<AgentConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AgentConfig::from_lookup(&|key: &str| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let config = load(&required()).expect("config should load");

        assert_eq!(config.llm.model, "mistralai/mistral-7b-instruct");
        assert_eq!(config.llm.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.llm.max_response_tokens, 1000);
        assert_eq!(config.agent.name, "AI-Textbook-Agent");
        assert!(config.agent.instructions.contains("Never hallucinate"));
        assert_eq!(config.retrieval.backend, RetrievalBackend::Qdrant);
        assert_eq!(config.retrieval.timeout_secs, 30);
        assert_eq!(config.vector_store.collection_name, "book_content");
        assert_eq!(config.embedding.model, "embed-multilingual-v3.0");
        assert_eq!(config.thresholds.min_confidence_score, 0.3);
        assert_eq!(config.thresholds.min_similarity_score, 0.5);
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8001");
        assert!(config.server.debug);
        assert!(config.server.log_dir.is_none());
        assert_eq!(config.server.allowed_origins, default_local_origins());
    }

    #[test]
    fn blank_cors_setting_falls_back_to_local_origins() {
        let mut pairs = required();
        pairs.push(("CORS_ALLOWED_ORIGINS", " , "));

        let config = load(&pairs).expect("config should load");

        assert_eq!(config.server.allowed_origins, default_local_origins());
    }

    #[test]
    fn missing_mandatory_keys_are_all_reported() {
        let err = load(&[("QDRANT_URL", "https://qdrant.example")]).unwrap_err();

        assert_eq!(
            err,
            ConfigError::MissingVariables(vec![
                "OPENROUTER_API_KEY".to_string(),
                "QDRANT_API_KEY".to_string(),
                "COHERE_API_KEY".to_string(),
            ])
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = required();
        pairs.extend([
            ("OPENROUTER_MODEL", "openai/gpt-4o-mini"),
            ("MAX_RESPONSE_TOKENS", "512"),
            ("RETRIEVAL_BACKEND", "HTTP"),
            ("RETRIEVAL_TIMEOUT", "5"),
            ("MIN_SIMILARITY_SCORE", "0.7"),
            ("AGENT_PORT", "9000"),
            ("AGENT_DEBUG", "false"),
            ("CORS_ALLOWED_ORIGINS", "https://book.example"),
            ("LOG_DIR", "/tmp/agent-logs"),
        ]);

        let config = load(&pairs).expect("config should load");

        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert_eq!(config.llm.max_response_tokens, 512);
        assert_eq!(config.retrieval.backend, RetrievalBackend::Http);
        assert_eq!(config.retrieval.timeout(), Duration::from_secs(5));
        assert_eq!(config.thresholds.min_similarity_score, 0.7);
        assert_eq!(config.server.port, 9000);
        assert!(!config.server.debug);
        assert_eq!(config.server.allowed_origins, vec!["https://book.example".to_string()]);
        assert_eq!(config.server.log_dir, Some(PathBuf::from("/tmp/agent-logs")));
    }

    #[test]
    fn fastapi_server_names_are_honoured() {
        let mut pairs = required();
        pairs.extend([
            ("FASTAPI_HOST", "127.0.0.1"),
            ("FASTAPI_PORT", "8080"),
            ("FASTAPI_DEBUG", "false"),
        ]);

        let config = load(&pairs).expect("config should load");

        assert_eq!(config.server.bind_addr(), "127.0.0.1:8080");
        assert!(!config.server.debug);
    }

    #[test]
    fn agent_server_names_win_over_fastapi_names() {
        let mut pairs = required();
        pairs.extend([("AGENT_PORT", "9000"), ("FASTAPI_PORT", "8080")]);

        let config = load(&pairs).expect("config should load");

        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn invalid_numbers_name_the_variable() {
        let mut pairs = required();
        pairs.push(("MIN_CONFIDENCE_SCORE", "high"));

        let err = load(&pairs).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "MIN_CONFIDENCE_SCORE"
        ));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut pairs = required();
        pairs.push(("RETRIEVAL_BACKEND", "pinecone"));

        assert!(matches!(
            load(&pairs),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "RETRIEVAL_BACKEND"
        ));
    }

    #[test]
    fn redacted_view_masks_api_keys() {
        let config = load(&required()).expect("config should load");

        let redacted = config.redacted();

        assert_eq!(redacted["llm"]["api_key"], "****");
        assert_eq!(redacted["vector_store"]["api_key"], "****");
        assert_eq!(redacted["embedding"]["api_key"], "****");
        assert_eq!(redacted["llm"]["max_response_tokens"], 1000);
        assert_eq!(redacted["vector_store"]["url"], "https://qdrant.example");
    }
}
