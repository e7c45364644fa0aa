//! Shared utilities for graph algorithms
//!
//! Provides a read-only, optimized view of the graph topology for algorithm execution.

use std::collections::HashMap;

/// Node Identifier type (resource id as stored in the tenant graph)
pub type NodeId = String;

/// A dense, integer-indexed view of the graph topology using Compressed Sparse Row (CSR) format.
///
/// Neighbour slices are sorted and deduplicated, so membership checks can use
/// binary search.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to NodeId
    pub index_to_node: Vec<NodeId>,
    /// Mapping from NodeId to dense index
    pub node_to_index: HashMap<NodeId, usize>,

    /// Outgoing edges CSR structure
    /// Offsets into `out_targets`. Size = node_count + 1
    pub out_offsets: Vec<usize>,
    /// Contiguous array of target node indices
    pub out_targets: Vec<usize>,

    /// Incoming edges CSR structure (Compressed Sparse Column effectively)
    /// Offsets into `in_sources`. Size = node_count + 1
    pub in_offsets: Vec<usize>,
    /// Contiguous array of source node indices
    pub in_sources: Vec<usize>,

    /// Whether every edge was inserted in both directions
    pub undirected: bool,
}

impl GraphView {
    /// Get the out-degree of a node (by index)
    pub fn out_degree(&self, idx: usize) -> usize {
        self.out_offsets[idx + 1] - self.out_offsets[idx]
    }

    /// Get the in-degree of a node (by index)
    pub fn in_degree(&self, idx: usize) -> usize {
        self.in_offsets[idx + 1] - self.in_offsets[idx]
    }

    /// Number of distinct neighbours, direction ignored and self-loops excluded.
    ///
    /// On a directed view a reciprocal pair `u -> v`, `v -> u` counts once.
    pub fn degree(&self, idx: usize) -> usize {
        if self.undirected {
            return self.out_degree(idx);
        }
        let mut neighbours: Vec<usize> = self
            .successors(idx)
            .iter()
            .chain(self.predecessors(idx))
            .copied()
            .filter(|&other| other != idx)
            .collect();
        neighbours.sort_unstable();
        neighbours.dedup();
        neighbours.len()
    }

    /// Get outgoing neighbors (successors) of a node
    pub fn successors(&self, idx: usize) -> &[usize] {
        let start = self.out_offsets[idx];
        let end = self.out_offsets[idx + 1];
        &self.out_targets[start..end]
    }

    /// Get incoming neighbors (predecessors) of a node
    pub fn predecessors(&self, idx: usize) -> &[usize] {
        let start = self.in_offsets[idx];
        let end = self.in_offsets[idx + 1];
        &self.in_sources[start..end]
    }

    /// True if `to` is a successor of `from`
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.successors(from).binary_search(&to).is_ok()
    }

    /// Number of stored (directed) adjacency entries
    pub fn edge_count(&self) -> usize {
        self.out_targets.len()
    }

    /// Build a directed view. Nodes referenced only by edges are appended after `nodes`.
    pub fn directed<I, E>(nodes: I, edges: E) -> Self
    where
        I: IntoIterator<Item = NodeId>,
        E: IntoIterator<Item = (NodeId, NodeId)>,
    {
        Self::build(nodes, edges, false)
    }

    /// Build an undirected view: each edge is stored in both directions, self-loops dropped.
    pub fn undirected<I, E>(nodes: I, edges: E) -> Self
    where
        I: IntoIterator<Item = NodeId>,
        E: IntoIterator<Item = (NodeId, NodeId)>,
    {
        Self::build(nodes, edges, true)
    }

    fn build<I, E>(nodes: I, edges: E, undirected: bool) -> Self
    where
        I: IntoIterator<Item = NodeId>,
        E: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut index_to_node = Vec::new();
        let mut node_to_index = HashMap::new();

        let mut intern = |id: NodeId, index_to_node: &mut Vec<NodeId>| -> usize {
            if let Some(&idx) = node_to_index.get(&id) {
                return idx;
            }
            let idx = index_to_node.len();
            node_to_index.insert(id.clone(), idx);
            index_to_node.push(id);
            idx
        };

        for id in nodes {
            intern(id, &mut index_to_node);
        }

        let mut pairs = Vec::new();
        for (source, target) in edges {
            let u = intern(source, &mut index_to_node);
            let v = intern(target, &mut index_to_node);
            if undirected {
                if u == v {
                    continue;
                }
                pairs.push((u, v));
                pairs.push((v, u));
            } else {
                pairs.push((u, v));
            }
        }

        let node_count = index_to_node.len();
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        for (u, v) in pairs {
            outgoing[u].push(v);
            incoming[v].push(u);
        }
        for list in outgoing.iter_mut().chain(incoming.iter_mut()) {
            list.sort_unstable();
            list.dedup();
        }

        let mut view = Self::from_adjacency_list(index_to_node, outgoing, incoming);
        view.undirected = undirected;
        view
    }

    /// Build a view from per-node adjacency lists of dense indices
    pub fn from_adjacency_list(
        index_to_node: Vec<NodeId>,
        outgoing: Vec<Vec<usize>>,
        incoming: Vec<Vec<usize>>,
    ) -> Self {
        let node_count = index_to_node.len();
        let node_to_index = index_to_node
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();

        let mut out_offsets = Vec::with_capacity(node_count + 1);
        let mut out_targets = Vec::new();
        let mut in_offsets = Vec::with_capacity(node_count + 1);
        let mut in_sources = Vec::new();

        out_offsets.push(0);
        for neighbors in outgoing {
            out_targets.extend(neighbors);
            out_offsets.push(out_targets.len());
        }

        in_offsets.push(0);
        for sources in incoming {
            in_sources.extend(sources);
            in_offsets.push(in_sources.len());
        }

        GraphView {
            node_count,
            index_to_node,
            node_to_index,
            out_offsets,
            out_targets,
            in_offsets,
            in_sources,
            undirected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<NodeId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_directed_view() {
        let view = GraphView::directed(
            ids(&["a", "b", "c"]),
            vec![("a".to_string(), "b".to_string()), ("b".to_string(), "c".to_string())],
        );

        assert_eq!(view.node_count, 3);
        let a = view.node_to_index["a"];
        let b = view.node_to_index["b"];
        let c = view.node_to_index["c"];

        assert!(view.has_edge(a, b));
        assert!(!view.has_edge(b, a));
        assert_eq!(view.out_degree(b), 1);
        assert_eq!(view.in_degree(b), 1);
        assert_eq!(view.predecessors(c), &[b]);
        assert_eq!(view.degree(b), 2);
    }

    #[test]
    fn test_undirected_view_dedups_and_drops_self_loops() {
        let view = GraphView::undirected(
            Vec::new(),
            vec![
                ("x".to_string(), "y".to_string()),
                ("y".to_string(), "x".to_string()),
                ("x".to_string(), "x".to_string()),
            ],
        );

        assert_eq!(view.node_count, 2);
        let x = view.node_to_index["x"];
        let y = view.node_to_index["y"];
        assert_eq!(view.successors(x), &[y]);
        assert_eq!(view.successors(y), &[x]);
        assert_eq!(view.degree(x), 1);
        assert_eq!(view.edge_count(), 2);
    }
}
