//! Persistence for trained embeddings
//!
//! Embeddings are expensive to train, so they are kept on disk keyed by the
//! tenant and the training parameters.

pub mod cache;

pub use cache::{CacheError, CacheMetadata, CacheResult, CachedEmbeddings, EmbeddingCache};
