//! Subset filter definition and its compact textual form

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Filter parsing errors
#[derive(Error, Debug, PartialEq)]
pub enum SubsetError {
    #[error("Unknown filter key: {0}")]
    UnknownKey(String),

    #[error("Malformed filter clause '{0}', expected key=value")]
    MalformedClause(String),
}

pub type SubsetResult<T> = Result<T, SubsetError>;

/// Inclusion predicates, OR-combined within and across fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsetFilter {
    /// Explicit node ids
    pub node_ids: Vec<String>,
    /// Resource type wildcard patterns (case-insensitive)
    pub resource_types: Vec<String>,
    /// Node labels
    pub labels: Vec<String>,
    /// Resource groups; matched exactly and never closed over dependencies
    pub resource_groups: Vec<String>,
    /// Free-form query; not supported, contributes no matches
    pub query: Option<String>,
}

impl SubsetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_resource_types<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_types.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn with_resource_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// True if any predicate is set (the query field counts)
    pub fn has_predicates(&self) -> bool {
        !self.node_ids.is_empty()
            || !self.resource_types.is_empty()
            || !self.labels.is_empty()
            || !self.resource_groups.is_empty()
            || self.query.is_some()
    }

    /// Parse `key=v1,v2;key=...`.
    ///
    /// Keys: `node_ids`/`ids`, `types`/`resource_types`, `labels`,
    /// `resource_groups`/`rgs`, `query`. Keys are case-insensitive and
    /// repeated keys accumulate. The query value is taken verbatim.
    pub fn parse(input: &str) -> SubsetResult<Self> {
        let mut filter = SubsetFilter::new();

        for clause in input.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            let (key, value) = clause
                .split_once('=')
                .ok_or_else(|| SubsetError::MalformedClause(clause.to_string()))?;
            let key = key.trim().to_ascii_lowercase();
            let values = value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            match key.as_str() {
                "node_ids" | "ids" => filter.node_ids.extend(values),
                "types" | "resource_types" => filter.resource_types.extend(values),
                "labels" => filter.labels.extend(values),
                "resource_groups" | "rgs" => filter.resource_groups.extend(values),
                "query" => {
                    let query = value.trim();
                    if !query.is_empty() {
                        filter.query = Some(query.to_string());
                    }
                }
                _ => return Err(SubsetError::UnknownKey(key)),
            }
        }

        Ok(filter)
    }
}

impl FromStr for SubsetFilter {
    type Err = SubsetError;

    fn from_str(s: &str) -> SubsetResult<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_keys() {
        let text = "node_ids=a, b;Types=Microsoft.Compute/*;labels=prod;rgs=rg1,rg2;query=MATCH (n)";
        let filter: SubsetFilter = text.parse().unwrap();
        assert_eq!(filter.node_ids, vec!["a", "b"]);
        assert_eq!(filter.resource_types, vec!["Microsoft.Compute/*"]);
        assert_eq!(filter.labels, vec!["prod"]);
        assert_eq!(filter.resource_groups, vec!["rg1", "rg2"]);
        assert_eq!(filter.query.as_deref(), Some("MATCH (n)"));
    }

    #[test]
    fn test_parse_skips_empty_values() {
        let filter = SubsetFilter::parse("ids=a,,b,;labels=;").unwrap();
        assert_eq!(filter.node_ids, vec!["a", "b"]);
        assert!(filter.labels.is_empty());
        assert!(filter.has_predicates());
    }

    #[test]
    fn test_parse_empty_input() {
        let filter = SubsetFilter::parse("  ").unwrap();
        assert!(!filter.has_predicates());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            SubsetFilter::parse("colour=red").unwrap_err(),
            SubsetError::UnknownKey("colour".to_string())
        );
        assert_eq!(
            SubsetFilter::parse("ids").unwrap_err(),
            SubsetError::MalformedClause("ids".to_string())
        );
    }

    #[test]
    fn test_builder() {
        let filter = SubsetFilter::new()
            .with_node_ids(["x"])
            .with_resource_groups(vec!["rg".to_string()]);
        assert_eq!(filter.node_ids, vec!["x"]);
        assert_eq!(filter.resource_groups, vec!["rg"]);
        assert!(filter.query.is_none());
    }
}
