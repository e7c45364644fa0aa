//! Node embeddings for importance sampling
//!
//! Embeddings are trained with node2vec over the tenant's structural
//! relationships. Vector magnitude serves as an importance proxy.

pub mod generator;
pub mod importance;

use crate::graph::StoreError;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tenantgraph_algorithms::Node2VecError;
use thiserror::Error;

pub use generator::{EmbeddingGenerator, STRUCTURAL_RELATIONSHIPS};
pub use importance::get_node_importance_scores;

/// Embed errors
#[derive(Error, Debug)]
pub enum EmbedError {
    /// No structural relationships to train on
    #[error("Tenant {0} has no structural graph to embed")]
    EmptyGraph(String),

    /// Store access failed while building the training graph
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Walk generation or skip-gram training failed
    #[error("Training failed: {0}")]
    Training(#[from] Node2VecError),
}

pub type EmbedResult<T> = Result<T, EmbedError>;

/// Node id -> fixed-length vector
pub type Embeddings = HashMap<String, Vec<f32>>;

/// Parameters that identify a trained embedding set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbeddingParams {
    pub dimensions: usize,
    pub walk_length: usize,
    pub num_walks: usize,
}

/// Anything that can produce embeddings for a tenant
pub trait EmbeddingSource: Send + Sync {
    /// Parameters the produced embeddings are keyed by
    fn params(&self) -> EmbeddingParams;

    /// Train embeddings; blocks until done
    fn generate(&self, tenant_id: &str, rng: &mut dyn RngCore) -> EmbedResult<Embeddings>;
}
