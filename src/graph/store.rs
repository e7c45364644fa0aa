//! Graph store interface and in-memory implementation
//!
//! All store access goes through a scoped [`StoreSession`]. A session is
//! released when dropped, which covers early returns and `?` propagation.

use super::edge::Edge;
use super::model::{GraphModel, GraphResult};
use super::node::Node;
use super::types::{NodeId, DERIVED_FROM};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while talking to the graph store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Per-node adjacency record: a non-Original node and its non-Original neighbours
pub type AdjacencyRecord = (NodeId, Vec<NodeId>);

/// Queries and writes the abstraction engine needs from the store.
///
/// Reads only consider non-Original nodes.
pub trait StoreSession {
    /// Node counts per resource type
    fn count_by_type(&mut self, tenant_id: &str) -> StoreResult<IndexMap<String, usize>>;

    /// Ids of all nodes of one type
    fn ids_by_type(&mut self, tenant_id: &str, resource_type: &str) -> StoreResult<Vec<NodeId>>;

    /// Per node, the ids reachable from it by any relationship
    fn adjacency(&mut self, tenant_id: &str) -> StoreResult<Vec<AdjacencyRecord>>;

    /// `(source, target)` pairs for relationships of the given types
    fn structural_edges(
        &mut self,
        tenant_id: &str,
        relationship_types: &[&str],
    ) -> StoreResult<Vec<(NodeId, NodeId)>>;

    /// Resource type of each known id; unknown ids are omitted
    fn resource_types(
        &mut self,
        tenant_id: &str,
        ids: &[NodeId],
    ) -> StoreResult<HashMap<NodeId, String>>;

    /// Write a derived-from linkage for each id; returns how many were written
    fn create_linkage(&mut self, tenant_id: &str, ids: &[NodeId]) -> StoreResult<usize>;

    /// Remove every linkage of the tenant; returns how many were removed
    fn clear_linkage(&mut self, tenant_id: &str) -> StoreResult<usize>;
}

/// A graph store handing out scoped sessions
pub trait GraphBackend: Send + Sync {
    fn session(&self) -> StoreResult<Box<dyn StoreSession + '_>>;
}

impl<T: GraphBackend + ?Sized> GraphBackend for std::sync::Arc<T> {
    fn session(&self) -> StoreResult<Box<dyn StoreSession + '_>> {
        (**self).session()
    }
}

/// One tenant's data inside [`MemoryGraphStore`]
#[derive(Debug, Default)]
struct TenantGraph {
    graph: GraphModel,
    /// Type index for fast lookups
    type_index: BTreeMap<String, BTreeSet<NodeId>>,
    /// Linkage edges; duplicates are kept on purpose
    linkages: Vec<Edge>,
}

/// In-memory graph store
///
/// Holds one [`GraphModel`] per tenant and counts open sessions so callers can
/// verify every session was released.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    tenants: RwLock<HashMap<String, TenantGraph>>,
    open_sessions: AtomicUsize,
    sessions_opened: AtomicUsize,
}

impl MemoryGraphStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to its tenant's graph
    pub fn add_node(&self, node: Node) -> GraphResult<()> {
        let mut tenants = self.tenants.write().unwrap_or_else(|e| e.into_inner());
        let tenant = tenants.entry(node.tenant_id.clone()).or_default();
        let id = node.id.clone();
        let resource_type = node.resource_type.to_string();
        let original = node.is_original();
        tenant.graph.add_node(node)?;
        if !original {
            tenant.type_index.entry(resource_type).or_default().insert(id);
        }
        Ok(())
    }

    /// Add an edge to a tenant's graph
    pub fn add_edge(&self, tenant_id: &str, edge: Edge) {
        let mut tenants = self.tenants.write().unwrap_or_else(|e| e.into_inner());
        tenants.entry(tenant_id.to_string()).or_default().graph.add_edge(edge);
    }

    /// Load every node and edge of `graph`.
    ///
    /// Ids are only unique per tenant, so an edge goes to every tenant that
    /// holds both endpoints. An edge whose endpoints share no tenant goes to
    /// the tenants holding its source.
    pub fn load_graph(&self, graph: &GraphModel) -> GraphResult<()> {
        let mut owners: HashMap<&str, Vec<&str>> = HashMap::new();
        for node in graph.nodes() {
            owners.entry(node.id.as_str()).or_default().push(node.tenant_id.as_str());
            self.add_node(node.clone())?;
        }

        for edge in graph.edges() {
            let Some(sources) = owners.get(edge.source_id.as_str()) else {
                debug!(source = %edge.source_id, "skipping edge from unknown node");
                continue;
            };
            let targets = owners.get(edge.target_id.as_str());
            let shared: Vec<&str> = sources
                .iter()
                .copied()
                .filter(|t| targets.is_some_and(|ts| ts.contains(t)))
                .collect();
            let tenants = if shared.is_empty() { sources.clone() } else { shared };
            for tenant_id in tenants {
                self.add_edge(tenant_id, edge.clone());
            }
        }
        Ok(())
    }

    /// Snapshot of a tenant's graph
    pub fn tenant_graph(&self, tenant_id: &str) -> Option<GraphModel> {
        let tenants = self.tenants.read().unwrap_or_else(|e| e.into_inner());
        tenants.get(tenant_id).map(|t| t.graph.clone())
    }

    /// Number of linkage edges stored for a tenant
    pub fn linkage_count(&self, tenant_id: &str) -> usize {
        let tenants = self.tenants.read().unwrap_or_else(|e| e.into_inner());
        tenants.get(tenant_id).map(|t| t.linkages.len()).unwrap_or(0)
    }

    /// Linkage edges stored for a tenant
    pub fn linkages(&self, tenant_id: &str) -> Vec<Edge> {
        let tenants = self.tenants.read().unwrap_or_else(|e| e.into_inner());
        tenants.get(tenant_id).map(|t| t.linkages.clone()).unwrap_or_default()
    }

    /// Sessions currently held by callers
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Sessions handed out since creation
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
}

impl GraphBackend for MemoryGraphStore {
    fn session(&self) -> StoreResult<Box<dyn StoreSession + '_>> {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession { store: self }))
    }
}

/// Session over a [`MemoryGraphStore`]; each call takes the lock briefly
struct MemorySession<'a> {
    store: &'a MemoryGraphStore,
}

impl Drop for MemorySession<'_> {
    fn drop(&mut self) {
        self.store.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemorySession<'_> {
    fn read<T>(&self, tenant_id: &str, f: impl FnOnce(&TenantGraph) -> T) -> T
    where
        T: Default,
    {
        let tenants = self.store.tenants.read().unwrap_or_else(|e| e.into_inner());
        tenants.get(tenant_id).map(f).unwrap_or_default()
    }
}

impl StoreSession for MemorySession<'_> {
    fn count_by_type(&mut self, tenant_id: &str) -> StoreResult<IndexMap<String, usize>> {
        Ok(self.read(tenant_id, |t| {
            t.type_index
                .iter()
                .filter(|(_, ids)| !ids.is_empty())
                .map(|(ty, ids)| (ty.clone(), ids.len()))
                .collect()
        }))
    }

    fn ids_by_type(&mut self, tenant_id: &str, resource_type: &str) -> StoreResult<Vec<NodeId>> {
        Ok(self.read(tenant_id, |t| {
            t.type_index
                .get(resource_type)
                .map(|ids| ids.iter().cloned().collect())
                .unwrap_or_default()
        }))
    }

    fn adjacency(&mut self, tenant_id: &str) -> StoreResult<Vec<AdjacencyRecord>> {
        Ok(self.read(tenant_id, |t| {
            let candidates: BTreeSet<&str> = t
                .graph
                .nodes()
                .iter()
                .filter(|n| !n.is_original())
                .map(|n| n.id.as_str())
                .collect();

            let mut neighbours: BTreeMap<&str, BTreeSet<&str>> =
                candidates.iter().map(|&id| (id, BTreeSet::new())).collect();
            for edge in t.graph.edges() {
                let (s, d) = (edge.source_id.as_str(), edge.target_id.as_str());
                if candidates.contains(s) && candidates.contains(d) && s != d {
                    neighbours.entry(s).or_default().insert(d);
                }
            }

            neighbours
                .into_iter()
                .map(|(id, set)| (id.to_string(), set.into_iter().map(str::to_string).collect()))
                .collect()
        }))
    }

    fn structural_edges(
        &mut self,
        tenant_id: &str,
        relationship_types: &[&str],
    ) -> StoreResult<Vec<(NodeId, NodeId)>> {
        Ok(self.read(tenant_id, |t| {
            let originals: BTreeSet<&str> = t
                .graph
                .nodes()
                .iter()
                .filter(|n| n.is_original())
                .map(|n| n.id.as_str())
                .collect();

            t.graph
                .edges()
                .iter()
                .filter(|e| e.is_any_of(relationship_types))
                .filter(|e| {
                    !originals.contains(e.source_id.as_str())
                        && !originals.contains(e.target_id.as_str())
                })
                .map(|e| (e.source_id.clone(), e.target_id.clone()))
                .collect()
        }))
    }

    fn resource_types(
        &mut self,
        tenant_id: &str,
        ids: &[NodeId],
    ) -> StoreResult<HashMap<NodeId, String>> {
        Ok(self.read(tenant_id, |t| {
            ids.iter()
                .filter_map(|id| {
                    t.graph
                        .find(tenant_id, id)
                        .filter(|n| !n.is_original())
                        .map(|n| (id.clone(), n.resource_type.to_string()))
                })
                .collect()
        }))
    }

    fn create_linkage(&mut self, tenant_id: &str, ids: &[NodeId]) -> StoreResult<usize> {
        let mut tenants = self.store.tenants.write().unwrap_or_else(|e| e.into_inner());
        let Some(tenant) = tenants.get_mut(tenant_id) else {
            return Ok(0);
        };

        let mut created = 0;
        for id in ids {
            if tenant.graph.find(tenant_id, id).is_some() {
                tenant.linkages.push(Edge::new(id.clone(), id.clone(), DERIVED_FROM));
                created += 1;
            }
        }
        debug!(tenant_id, created, "created linkage edges");
        Ok(created)
    }

    fn clear_linkage(&mut self, tenant_id: &str) -> StoreResult<usize> {
        let mut tenants = self.store.tenants.write().unwrap_or_else(|e| e.into_inner());
        let removed = tenants
            .get_mut(tenant_id)
            .map(|t| std::mem::take(&mut t.linkages).len())
            .unwrap_or(0);
        debug!(tenant_id, removed, "cleared linkage edges");
        Ok(removed)
    }
}
