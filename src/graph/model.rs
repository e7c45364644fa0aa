//! In-memory graph exchanged between components
//!
//! Order of nodes and edges is preserved but carries no meaning. A node id may
//! appear only once per tenant.

use super::edge::Edge;
use super::node::Node;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised while assembling a graph
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {id} already exists in tenant {tenant_id}")]
    DuplicateNode { tenant_id: String, id: String },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Nodes and edges of a (possibly filtered or sampled) tenant graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphParts")]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: HashMap<(String, String), usize>,
}

#[derive(Deserialize)]
struct GraphParts {
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

impl TryFrom<GraphParts> for GraphModel {
    type Error = GraphError;

    fn try_from(parts: GraphParts) -> GraphResult<Self> {
        GraphModel::from_parts(parts.nodes, parts.edges)
    }
}

impl GraphModel {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from parts, rejecting duplicate node ids
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> GraphResult<Self> {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node)?;
        }
        graph.edges = edges;
        Ok(graph)
    }

    /// Add a node; fails if the tenant already has a node with this id
    pub fn add_node(&mut self, node: Node) -> GraphResult<()> {
        let key = (node.tenant_id.clone(), node.id.clone());
        if self.index.contains_key(&key) {
            return Err(GraphError::DuplicateNode {
                tenant_id: node.tenant_id,
                id: node.id,
            });
        }
        self.index.insert(key, self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Add an edge. Endpoints are not required to exist.
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Look up a node by tenant and id
    pub fn find(&self, tenant_id: &str, id: &str) -> Option<&Node> {
        self.index
            .get(&(tenant_id.to_string(), id.to_string()))
            .map(|&idx| &self.nodes[idx])
    }

    /// Set of all node ids
    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Keep nodes accepted by `keep` and the edges whose endpoints both survive
    pub fn retain_nodes<F>(&self, mut keep: F) -> GraphModel
    where
        F: FnMut(&Node) -> bool,
    {
        let nodes: Vec<Node> = self.nodes.iter().filter(|n| keep(n)).cloned().collect();
        let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges = self
            .edges
            .iter()
            .filter(|e| kept.contains(e.source_id.as_str()) && kept.contains(e.target_id.as_str()))
            .cloned()
            .collect();

        let mut graph = GraphModel::new();
        for node in nodes {
            let key = (node.tenant_id.clone(), node.id.clone());
            graph.index.insert(key, graph.nodes.len());
            graph.nodes.push(node);
        }
        graph.edges = edges;
        graph
    }

    /// Serialize for downstream consumers
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize; duplicate ids are rejected
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
