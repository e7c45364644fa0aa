//! Centrality measures

use super::common::{GraphView, NodeId};
use std::collections::HashMap;

/// Degree centrality: distinct neighbours / (n - 1), direction ignored.
///
/// A single-node graph scores 1.0 for its node, matching the usual convention.
pub fn degree_centrality(view: &GraphView) -> HashMap<NodeId, f64> {
    let n = view.node_count;
    if n == 0 {
        return HashMap::new();
    }
    if n == 1 {
        return HashMap::from([(view.index_to_node[0].clone(), 1.0)]);
    }

    let scale = 1.0 / (n - 1) as f64;
    (0..n)
        .map(|idx| (view.index_to_node[idx].clone(), view.degree(idx) as f64 * scale))
        .collect()
}
