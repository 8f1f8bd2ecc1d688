//! Retrieval collaborators.
//!
//! - `RetrievalClient`: trait the agent searches through
//! - `QdrantRetriever`: Cohere query embedding + Qdrant REST search
//! - `HttpRetrievalClient`: delegates to a standalone retrieval service

mod embedding;
mod http;
mod qdrant;
mod store;

pub use embedding::{CohereEmbedder, Embedder};
pub use http::HttpRetrievalClient;
pub use qdrant::QdrantRetriever;
pub use store::{RawChunk, RetrievalClient};
