use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to initialize embedding client: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Failed to initialize retrieval client: {0}")]
    Retrieval(#[source] anyhow::Error),
}
