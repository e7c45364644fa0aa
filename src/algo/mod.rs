//! Graph algorithms module
//!
//! The algorithms live in the `tenantgraph-algorithms` crate and operate on a
//! dense [`GraphView`]. This module provides the integration/adapter layer
//! that builds views from store sessions.

pub mod community;

use crate::graph::{AdjacencyRecord, StoreResult, StoreSession};
use tenantgraph_algorithms::GraphView;

// Re-export algorithms
pub use community::{CommunityDetector, CommunityMetadata};
pub use tenantgraph_algorithms::{
    connected_components, degree_centrality, node2vec, ComponentsResult, Node2VecConfig,
};

/// Build an undirected view from adjacency records.
///
/// Every id that appears as a record key or as a neighbour becomes a node.
pub fn view_from_adjacency(records: &[AdjacencyRecord]) -> GraphView {
    let nodes = records.iter().map(|(id, _)| id.clone());
    let edges = records
        .iter()
        .flat_map(|(id, neighbours)| neighbours.iter().map(move |n| (id.clone(), n.clone())));
    GraphView::undirected(nodes, edges)
}

/// Build an undirected view over the tenant's relationships of the given types
pub fn structural_view<S>(
    session: &mut S,
    tenant_id: &str,
    relationship_types: &[&str],
) -> StoreResult<GraphView>
where
    S: StoreSession + ?Sized,
{
    let edges = session.structural_edges(tenant_id, relationship_types)?;
    Ok(GraphView::undirected(Vec::new(), edges))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_from_adjacency_includes_neighbours() {
        let records = vec![
            ("a".to_string(), vec!["b".to_string()]),
            ("c".to_string(), vec![]),
        ];
        let view = view_from_adjacency(&records);
        assert_eq!(view.node_count, 3);
        assert!(view.node_to_index.contains_key("b"));

        let a = view.node_to_index["a"];
        let b = view.node_to_index["b"];
        assert!(view.has_edge(a, b));
        assert!(view.has_edge(b, a));
    }
}
