//! Resource node implementation
//!
//! A node is one discovered resource: identity, type, owning tenant, tags
//! and an open attribute map.

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId, ResourceType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Attribute naming a node's parent resource
pub const PARENT_ID: &str = "parent_id";

/// Attribute listing ids a node depends on
pub const DEPENDS_ON: &str = "depends_on";

/// Attribute consulted when the id carries no resource-group segment
pub const RESOURCE_GROUP: &str = "resource_group";

/// A resource node in the tenant graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Identifier, unique within the tenant
    pub id: NodeId,

    /// Resource category
    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    /// Owning tenant
    pub tenant_id: String,

    /// Tags; `Original` marks un-abstracted source nodes
    #[serde(default)]
    pub labels: BTreeSet<Label>,

    /// Open attribute map
    #[serde(default)]
    pub properties: PropertyMap,
}

impl Node {
    /// Create a new node without labels or properties
    pub fn new(
        id: impl Into<NodeId>,
        resource_type: impl Into<ResourceType>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Node {
            id: id.into(),
            resource_type: resource_type.into(),
            tenant_id: tenant_id.into(),
            labels: BTreeSet::new(),
            properties: PropertyMap::new(),
        }
    }

    /// Builder-style label addition
    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.labels.insert(label.into());
        self
    }

    /// Builder-style property addition
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Check if node has a specific label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.as_str() == label)
    }

    /// True for un-abstracted source nodes
    pub fn is_original(&self) -> bool {
        self.labels.contains(&Label::original())
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Parent reference from the `parent_id` attribute
    pub fn parent_id(&self) -> Option<&str> {
        self.get_property(PARENT_ID).and_then(PropertyValue::as_string)
    }

    /// Ids listed in an array-valued `depends_on` attribute
    pub fn depends_on(&self) -> Vec<&str> {
        self.get_property(DEPENDS_ON)
            .map(PropertyValue::string_items)
            .unwrap_or_default()
    }

    /// Resource group taken from the hierarchical id
    /// (`.../resourceGroups/<name>/...`), else from the `resource_group` attribute.
    pub fn resource_group(&self) -> Option<&str> {
        resource_group_segment(&self.id)
            .or_else(|| self.get_property(RESOURCE_GROUP).and_then(PropertyValue::as_string))
    }
}

/// Extract the segment following `resourceGroups` (key matched case-insensitively).
pub fn resource_group_segment(id: &str) -> Option<&str> {
    let mut segments = id.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if segment.eq_ignore_ascii_case("resourceGroups") {
            return segments.next();
        }
    }
    None
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.tenant_id == other.tenant_id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.tenant_id.hash(state);
        self.id.hash(state);
    }
}
