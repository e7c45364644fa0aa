//! node2vec embedding generation over structural relationships

use super::{EmbedError, EmbedResult, EmbeddingParams, EmbeddingSource, Embeddings};
use crate::algo::structural_view;
use crate::config::EmbeddingConfig;
use crate::graph::GraphBackend;
use rand::RngCore;
use tenantgraph_algorithms::{node2vec, GraphView};
use tracing::{debug, info};

/// Relationship types that shape the embedding graph
pub const STRUCTURAL_RELATIONSHIPS: &[&str] = &[
    "CONTAINS",
    "USES_IDENTITY",
    "CONNECTED_TO",
    "DEPENDS_ON",
    "USES_SUBNET",
    "SECURED_BY",
    "USES_SERVICE",
    "MANAGES",
];

/// Trains node embeddings for a tenant's resources
pub struct EmbeddingGenerator<B: GraphBackend> {
    backend: B,
    config: EmbeddingConfig,
}

impl<B: GraphBackend> EmbeddingGenerator<B> {
    pub fn new(backend: B, config: EmbeddingConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Undirected view over the tenant's structural relationships
    pub fn structural_graph(&self, tenant_id: &str) -> EmbedResult<GraphView> {
        let mut session = self.backend.session()?;
        Ok(structural_view(&mut *session, tenant_id, STRUCTURAL_RELATIONSHIPS)?)
    }

    /// Train one vector per node of the structural graph.
    ///
    /// Nodes without structural relationships get no embedding. A tenant
    /// with no structural relationships at all is an error.
    pub fn generate_embeddings(
        &self,
        tenant_id: &str,
        rng: &mut dyn RngCore,
    ) -> EmbedResult<Embeddings> {
        let view = self.structural_graph(tenant_id)?;
        if view.node_count == 0 {
            return Err(EmbedError::EmptyGraph(tenant_id.to_string()));
        }

        info!(
            tenant_id,
            nodes = view.node_count,
            edges = view.edge_count() / 2,
            dimensions = self.config.dimensions,
            "training node embeddings"
        );
        let seed = rng.next_u64();
        let vectors = node2vec(&view, &self.config.to_node2vec(), seed)?;
        debug!(tenant_id, vectors = vectors.len(), "embedding training finished");

        Ok(view.index_to_node.into_iter().zip(vectors).collect())
    }
}

impl<B: GraphBackend> EmbeddingSource for EmbeddingGenerator<B> {
    fn params(&self) -> EmbeddingParams {
        EmbeddingParams {
            dimensions: self.config.dimensions,
            walk_length: self.config.walk_length,
            num_walks: self.config.num_walks,
        }
    }

    fn generate(&self, tenant_id: &str, rng: &mut dyn RngCore) -> EmbedResult<Embeddings> {
        self.generate_embeddings(tenant_id, rng)
    }
}
