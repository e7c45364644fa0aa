//! Tenant resource graph
//!
//! Implements the property graph data model shared by every component:
//! - Resource nodes with a type, owning tenant, tags and attributes
//! - Directed, typed relationships (`source_id` -> `target_id`)
//! - `GraphModel`, the in-memory graph handed to downstream consumers
//! - The store interface with scoped sessions, plus an in-memory store

pub mod edge;
pub mod model;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use model::{GraphError, GraphModel, GraphResult};
pub use node::{resource_group_segment, Node};
pub use property::{PropertyMap, PropertyValue};
pub use store::{
    AdjacencyRecord, GraphBackend, MemoryGraphStore, StoreError, StoreResult, StoreSession,
};
pub use types::{Label, NodeId, RelationshipType, ResourceType, DERIVED_FROM, ORIGINAL_LABEL};
