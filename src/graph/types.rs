//! Core type definitions for the tenant resource graph

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource identifier, unique within a tenant
pub type NodeId = String;

/// Label marking un-abstracted source nodes
pub const ORIGINAL_LABEL: &str = "Original";

/// Relationship type of linkage edges written by the abstraction run
pub const DERIVED_FROM: &str = "DERIVED_FROM";

/// Node label (e.g., "Original", "Production")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Label(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `Original` tag
    pub fn original() -> Self {
        Label::new(ORIGINAL_LABEL)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label(s)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label(s.to_string())
    }
}

/// Resource category (e.g., "Microsoft.Compute/virtualMachines")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    pub fn new(resource_type: impl Into<String>) -> Self {
        ResourceType(resource_type.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ResourceType {
    fn from(s: String) -> Self {
        ResourceType(s)
    }
}

impl From<&str> for ResourceType {
    fn from(s: &str) -> Self {
        ResourceType(s.to_string())
    }
}

/// Relationship type (e.g., "CONTAINS", "DEPENDS_ON")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RelationshipType(String);

impl RelationshipType {
    pub fn new(relationship_type: impl Into<String>) -> Self {
        RelationshipType(relationship_type.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RelationshipType {
    fn from(s: String) -> Self {
        RelationshipType(s)
    }
}

impl From<&str> for RelationshipType {
    fn from(s: &str) -> Self {
        RelationshipType(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let label = Label::new("Original");
        assert_eq!(label.as_str(), "Original");
        assert_eq!(format!("{}", label), "Original");
        assert_eq!(label, Label::original());

        let label2: Label = "Production".into();
        assert_eq!(label2.as_str(), "Production");
    }

    #[test]
    fn test_resource_type() {
        let rt = ResourceType::new("Microsoft.Network/virtualNetworks");
        assert_eq!(rt.as_str(), "Microsoft.Network/virtualNetworks");
        assert!(ResourceType::from("A") < ResourceType::from("B"));
    }

    #[test]
    fn test_relationship_type_serde_is_transparent() {
        let rel = RelationshipType::new("CONTAINS");
        assert_eq!(serde_json::to_string(&rel).unwrap(), "\"CONTAINS\"");
    }
}
