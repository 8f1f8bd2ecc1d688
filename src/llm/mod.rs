pub mod openrouter;
pub mod provider;
pub mod types;

pub use openrouter::OpenRouterProvider;
pub use provider::CompletionProvider;
pub use types::{ChatMessage, ChatRequest};
