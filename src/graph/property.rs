//! Attribute values for resource nodes and relationships
//!
//! Values serialize untagged, so a node's attribute map reads as the plain
//! JSON discovery emitted. The engine itself only interprets string values
//! (`parent_id`, `resource_group`) and arrays of strings (`depends_on`);
//! everything else is carried through untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Any JSON-shaped attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Map(HashMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// String elements of an array value; non-string elements are skipped.
    pub fn string_items(&self) -> Vec<&str> {
        match self {
            PropertyValue::Array(arr) => arr.iter().filter_map(PropertyValue::as_string).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(items: Vec<&str>) -> Self {
        PropertyValue::Array(items.into_iter().map(PropertyValue::from).collect())
    }
}

/// Attribute map for nodes and edges
pub type PropertyMap = HashMap<String, PropertyValue>;
