//! Community detection algorithms
//!
//! Connected components over a `GraphView`, ignoring edge direction.

use super::common::{GraphView, NodeId};
use std::collections::HashMap;

/// Result of the connected components algorithm
#[derive(Debug, Clone)]
pub struct ComponentsResult {
    /// Components ordered by descending size; members sorted by id
    pub components: Vec<Vec<NodeId>>,
    /// Map of NodeId -> position in `components`
    pub node_component: HashMap<NodeId, usize>,
}

impl ComponentsResult {
    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Weakly connected components via iterative flood fill.
///
/// Uses an explicit stack, so deep chains cannot overflow the call stack.
/// Equal-sized components are ordered by their smallest member id.
pub fn connected_components(view: &GraphView) -> ComponentsResult {
    let n = view.node_count;
    let mut visited = vec![false; n];
    let mut components: Vec<Vec<NodeId>> = Vec::new();
    let mut stack = Vec::new();

    for start in 0..n {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);

        let mut members = Vec::new();
        while let Some(idx) = stack.pop() {
            members.push(view.index_to_node[idx].clone());
            for &next in view.successors(idx).iter().chain(view.predecessors(idx)) {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }

        members.sort();
        components.push(members);
    }

    components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

    let mut node_component = HashMap::with_capacity(n);
    for (component_id, members) in components.iter().enumerate() {
        for id in members {
            node_component.insert(id.clone(), component_id);
        }
    }

    ComponentsResult {
        components,
        node_component,
    }
}
