//! Embeddings and vector indexes for apirec.
//!
//! This crate provides:
//! - Embedding generation via the Zhipu embeddings API, with dimension
//!   checks and bounded retry ([`EmbeddingService`])
//! - The [`VectorIndex`] abstraction with a local (in-process, optionally
//!   file-backed) implementation and a Pinecone client

pub mod embeddings;
pub mod error;
pub mod index;
pub mod local;
pub mod pinecone;
pub mod retry;

pub use embeddings::{cosine_similarity, EmbeddingProvider, EmbeddingService, ZhipuEmbeddings};
pub use error::{EmbeddingError, IndexError};
pub use index::{sort_matches, IndexSpec, IndexedEntry, QueryMatch, VectorIndex};
pub use local::LocalIndex;
pub use pinecone::PineconeIndex;
pub use retry::RetryConfig;
