//! Relationship implementation for the tenant graph
//!
//! Edges use `source_id` / `target_id` as their canonical endpoint names.

use super::property::PropertyMap;
use super::types::{NodeId, RelationshipType};
use serde::{Deserialize, Serialize};

/// A directed relationship between two resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node (edge goes FROM this node)
    pub source_id: NodeId,

    /// Target node (edge goes TO this node)
    pub target_id: NodeId,

    /// Type of relationship (e.g., "CONTAINS", "DEPENDS_ON")
    pub relationship_type: RelationshipType,

    /// Properties associated with this edge
    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub properties: PropertyMap,
}

impl Edge {
    /// Create a new directed edge
    pub fn new(
        source_id: impl Into<NodeId>,
        target_id: impl Into<NodeId>,
        relationship_type: impl Into<RelationshipType>,
    ) -> Self {
        Edge {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type: relationship_type.into(),
            properties: PropertyMap::new(),
        }
    }

    /// True if the relationship type is one of `types`
    pub fn is_any_of(&self, types: &[&str]) -> bool {
        types.contains(&self.relationship_type.as_str())
    }
}
