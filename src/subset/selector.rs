//! Subset selection over a [`GraphModel`]

use super::filter::SubsetFilter;
use super::pattern::TypePattern;
use crate::graph::{GraphModel, Node};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Applies [`SubsetFilter`]s to graphs
#[derive(Debug, Default, Clone, Copy)]
pub struct SubsetSelector;

impl SubsetSelector {
    pub fn new() -> Self {
        Self
    }

    /// Induced subgraph of the filter's matches plus their dependency closure.
    ///
    /// An unset filter returns the graph unchanged; no matches yields an
    /// empty graph.
    pub fn apply(&self, graph: &GraphModel, filter: &SubsetFilter) -> GraphModel {
        if !filter.has_predicates() {
            return graph.clone();
        }

        let mut closed_seeds: BTreeSet<&str> = BTreeSet::new();
        let known = graph.node_ids();

        for id in &filter.node_ids {
            if known.contains(id.as_str()) {
                closed_seeds.insert(id.as_str());
            }
        }

        let patterns = compile_patterns(&filter.resource_types);
        if !patterns.is_empty() {
            closed_seeds.extend(
                graph
                    .nodes()
                    .iter()
                    .filter(|n| patterns.iter().any(|p| p.matches(n.resource_type.as_str())))
                    .map(|n| n.id.as_str()),
            );
        }

        if !filter.labels.is_empty() {
            closed_seeds.extend(
                graph
                    .nodes()
                    .iter()
                    .filter(|n| filter.labels.iter().any(|l| n.has_label(l)))
                    .map(|n| n.id.as_str()),
            );
        }

        if let Some(query) = &filter.query {
            warn!(query = %query, "free-form subset queries are not supported; ignoring");
        }

        let mut included = if closed_seeds.is_empty() {
            BTreeSet::new()
        } else {
            Self::closure(graph, closed_seeds.iter().copied())
        };

        // Resource groups are exact-match only, no closure
        let mut group_matches = 0;
        if !filter.resource_groups.is_empty() {
            for node in graph.nodes() {
                if in_groups(node, &filter.resource_groups) && included.insert(node.id.clone()) {
                    group_matches += 1;
                }
            }
        }

        let subset = graph.retain_nodes(|n| included.contains(&n.id));
        info!(
            seeds = closed_seeds.len(),
            group_matches,
            nodes = subset.node_count(),
            edges = subset.edge_count(),
            "applied subset filter"
        );
        subset
    }

    /// Smallest superset of `seeds` closed under outgoing edges, `parent_id`
    /// and `depends_on` references. Only ids present in `graph` are added.
    pub fn closure<'a, I>(graph: &GraphModel, seeds: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut by_id: FxHashMap<&str, &Node> = FxHashMap::default();
        for node in graph.nodes() {
            by_id.entry(node.id.as_str()).or_insert(node);
        }

        let mut out_edges: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
        for edge in graph.edges() {
            out_edges
                .entry(edge.source_id.as_str())
                .or_default()
                .push(edge.target_id.as_str());
        }

        let mut included: FxHashSet<&str> = FxHashSet::default();
        let mut frontier: Vec<&str> = Vec::new();
        for id in seeds {
            if let Some((&known, _)) = by_id.get_key_value(id) {
                if included.insert(known) {
                    frontier.push(known);
                }
            }
        }

        let mut rounds = 0;
        while !frontier.is_empty() {
            rounds += 1;
            let mut next = Vec::new();
            for id in frontier {
                for referenced in references(id, &by_id, &out_edges) {
                    if let Some((&known, _)) = by_id.get_key_value(referenced) {
                        if included.insert(known) {
                            next.push(known);
                        }
                    }
                }
            }
            frontier = next;
        }

        debug!(rounds, size = included.len(), "dependency closure reached fixed point");
        included.into_iter().map(str::to_string).collect()
    }
}

/// Ids a node points at: edge targets, its parent and its dependencies
fn references<'a>(
    id: &'a str,
    by_id: &FxHashMap<&'a str, &'a Node>,
    out_edges: &FxHashMap<&'a str, Vec<&'a str>>,
) -> Vec<&'a str> {
    let mut refs: Vec<&str> = out_edges.get(id).cloned().unwrap_or_default();
    if let Some(&node) = by_id.get(id) {
        refs.extend(node.parent_id());
        refs.extend(node.depends_on());
    }
    refs
}

fn compile_patterns(patterns: &[String]) -> Vec<TypePattern> {
    patterns
        .iter()
        .filter_map(|p| match TypePattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(
                    pattern = %p,
                    error = %e,
                    "invalid resource type pattern; treating as non-matching"
                );
                None
            }
        })
        .collect()
}

fn in_groups(node: &Node, groups: &[String]) -> bool {
    node.resource_group()
        .map(|rg| groups.iter().any(|g| g == rg))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{DEPENDS_ON, PARENT_ID};
    use crate::graph::Edge;

    fn chain() -> GraphModel {
        GraphModel::from_parts(
            vec![
                Node::new("A", "VM", "t").with_property(DEPENDS_ON, vec!["B"]),
                Node::new("B", "NIC", "t").with_property(DEPENDS_ON, vec!["C"]),
                Node::new("C", "VNet", "t"),
                Node::new("D", "Disk", "t"),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_depends_on_chain() {
        let filter = SubsetFilter::new().with_node_ids(["A"]);
        let subset = SubsetSelector::new().apply(&chain(), &filter);
        let ids: BTreeSet<&str> = subset.node_ids().into_iter().collect();
        assert_eq!(ids, BTreeSet::from(["A", "B", "C"]));
    }

    #[test]
    fn test_closure_follows_edges_and_parent() {
        let graph = GraphModel::from_parts(
            vec![
                Node::new("vm", "VM", "t").with_property(PARENT_ID, "rg"),
                Node::new("rg", "ResourceGroup", "t"),
                Node::new("nic", "NIC", "t"),
                Node::new("other", "VM", "t"),
            ],
            vec![Edge::new("vm", "nic", "USES"), Edge::new("other", "vm", "USES")],
        )
        .unwrap();

        let closed = SubsetSelector::closure(&graph, ["vm"]);
        assert_eq!(closed, BTreeSet::from(["nic".to_string(), "rg".to_string(), "vm".to_string()]));
    }

    #[test]
    fn test_closure_is_idempotent() {
        let graph = chain();
        let once = SubsetSelector::closure(&graph, ["B"]);
        let twice = SubsetSelector::closure(&graph, once.iter().map(String::as_str));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_references_are_ignored() {
        let graph = GraphModel::from_parts(
            vec![Node::new("A", "VM", "t").with_property(DEPENDS_ON, vec!["ghost"])],
            vec![],
        )
        .unwrap();
        let closed = SubsetSelector::closure(&graph, ["A", "nope"]);
        assert_eq!(closed, BTreeSet::from(["A".to_string()]));
    }

    #[test]
    fn test_cycle_terminates() {
        let graph = GraphModel::from_parts(
            vec![Node::new("a", "X", "t"), Node::new("b", "X", "t")],
            vec![Edge::new("a", "b", "DEPENDS_ON"), Edge::new("b", "a", "DEPENDS_ON")],
        )
        .unwrap();
        assert_eq!(SubsetSelector::closure(&graph, ["a"]).len(), 2);
    }

    #[test]
    fn test_empty_filter_returns_input() {
        let graph = chain();
        let subset = SubsetSelector::new().apply(&graph, &SubsetFilter::new());
        assert_eq!(subset.node_count(), graph.node_count());
    }

    #[test]
    fn test_no_match_is_empty_graph() {
        let filter = SubsetFilter::new().with_resource_types(["Storage*"]);
        let subset = SubsetSelector::new().apply(&chain(), &filter);
        assert!(subset.is_empty());
    }

    #[test]
    fn test_query_only_contributes_nothing() {
        let filter = SubsetFilter::new().with_query("MATCH (n) RETURN n");
        let subset = SubsetSelector::new().apply(&chain(), &filter);
        assert_eq!(subset.node_count(), 0);
    }

    #[test]
    fn test_type_pattern_and_label_union() {
        let graph = GraphModel::from_parts(
            vec![
                Node::new("vm", "Microsoft.Compute/virtualMachines", "t"),
                Node::new("kv", "Microsoft.KeyVault/vaults", "t").with_label("prod"),
                Node::new("sa", "Microsoft.Storage/storageAccounts", "t"),
            ],
            vec![Edge::new("vm", "sa", "USES")],
        )
        .unwrap();
        let filter = SubsetFilter::new()
            .with_resource_types(["microsoft.compute/*", "bad["])
            .with_labels(["prod"]);

        let subset = SubsetSelector::new().apply(&graph, &filter);
        let ids: BTreeSet<&str> = subset.node_ids().into_iter().collect();
        assert_eq!(ids, BTreeSet::from(["kv", "sa", "vm"]));
        assert_eq!(subset.edge_count(), 1);
    }

    #[test]
    fn test_resource_group_excludes_dependencies() {
        const VM1: &str = "/subscriptions/s/resourceGroups/rg-a/providers/X/vm1";
        const VNET: &str = "/subscriptions/s/resourceGroups/rg-b/providers/X/vnet";
        let graph = GraphModel::from_parts(
            vec![
                Node::new(VM1, "VM", "t").with_property(DEPENDS_ON, vec![VNET]),
                Node::new(VNET, "VNet", "t"),
                Node::new("loose", "Disk", "t").with_property("resource_group", "rg-a"),
            ],
            vec![Edge::new(VM1, VNET, "USES_SUBNET")],
        )
        .unwrap();

        let filter = SubsetFilter::new().with_resource_groups(["rg-a"]);
        let subset = SubsetSelector::new().apply(&graph, &filter);
        assert_eq!(subset.node_count(), 2);
        assert!(subset.nodes().iter().all(|n| n.resource_group() == Some("rg-a")));
        assert_eq!(subset.edge_count(), 0);
    }

    #[test]
    fn test_output_preserves_input_order() {
        let filter = SubsetFilter::new().with_node_ids(["C", "A"]);
        let subset = SubsetSelector::new().apply(&chain(), &filter);
        let order: Vec<&str> = subset.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }
}
