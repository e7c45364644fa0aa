//! Community detection over a tenant's non-Original nodes
//!
//! A community is one connected component, edge direction ignored.

use super::view_from_adjacency;
use crate::graph::{GraphBackend, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tenantgraph_algorithms::connected_components;
use tracing::{debug, info};

/// Summary of one community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityMetadata {
    /// Number of ids in the community
    pub size: usize,
    /// Per-type counts for ids known to the store
    pub type_counts: BTreeMap<String, usize>,
    /// Most frequent type; ties go to the lexicographically smallest
    pub dominant_type: Option<String>,
}

/// Partitions a tenant's resources into connected components
pub struct CommunityDetector<B: GraphBackend> {
    backend: B,
}

impl<B: GraphBackend> CommunityDetector<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Connected components, largest first. Equal sizes are ordered by
    /// their smallest member id.
    pub fn detect_communities(&self, tenant_id: &str) -> StoreResult<Vec<BTreeSet<String>>> {
        let records = {
            let mut session = self.backend.session()?;
            session.adjacency(tenant_id)?
        };

        let view = view_from_adjacency(&records);
        let result = connected_components(&view);
        info!(
            tenant_id,
            nodes = view.node_count,
            communities = result.len(),
            "detected communities"
        );

        Ok(result
            .components
            .into_iter()
            .map(|members| members.into_iter().collect())
            .collect())
    }

    /// Size, type histogram and dominant type of a set of ids
    pub fn get_community_metadata(
        &self,
        tenant_id: &str,
        node_ids: &BTreeSet<String>,
    ) -> StoreResult<CommunityMetadata> {
        let ids: Vec<String> = node_ids.iter().cloned().collect();
        let types = {
            let mut session = self.backend.session()?;
            session.resource_types(tenant_id, &ids)?
        };

        let mut type_counts: BTreeMap<String, usize> = BTreeMap::new();
        for resource_type in types.into_values() {
            *type_counts.entry(resource_type).or_insert(0) += 1;
        }

        let mut dominant: Option<(&String, usize)> = None;
        for (ty, &count) in &type_counts {
            if dominant.map_or(true, |(_, best)| count > best) {
                dominant = Some((ty, count));
            }
        }
        let dominant_type = dominant.map(|(ty, _)| ty.clone());
        debug!(tenant_id, size = node_ids.len(), ?dominant_type, "community metadata");

        Ok(CommunityMetadata {
            size: node_ids.len(),
            type_counts,
            dominant_type,
        })
    }
}
