use std::collections::BTreeSet;
use std::sync::Arc;
use tenantgraph::graph::node::{DEPENDS_ON, PARENT_ID};
use tenantgraph::graph::Label;
use tenantgraph::{
    CommunityDetector, Edge, GraphModel, MemoryGraphStore, Node, SubsetFilter, SubsetSelector,
};

fn ids(graph: &GraphModel) -> BTreeSet<String> {
    graph.nodes().iter().map(|n| n.id.clone()).collect()
}

#[test]
fn test_three_disjoint_clusters() {
    let mut graph = GraphModel::new();
    for (cluster, size) in [("web", 5), ("db", 3), ("cache", 2)] {
        for i in 0..size {
            graph.add_node(Node::new(format!("{cluster}-{i}"), "VM", "t")).unwrap();
        }
        // Star around member 0, mixed directions
        for i in 1..size {
            let (hub, member) = (format!("{cluster}-0"), format!("{cluster}-{i}"));
            if i % 2 == 0 {
                graph.add_edge(Edge::new(hub, member, "CONNECTED_TO"));
            } else {
                graph.add_edge(Edge::new(member, hub, "DEPENDS_ON"));
            }
        }
    }
    let store = Arc::new(MemoryGraphStore::new());
    store.load_graph(&graph).unwrap();

    let detector = CommunityDetector::new(store.clone());
    let communities = detector.detect_communities("t").unwrap();
    let sizes: Vec<usize> = communities.iter().map(BTreeSet::len).collect();
    assert_eq!(sizes, vec![5, 3, 2]);
    assert!(communities[1].iter().all(|id| id.starts_with("db-")));

    let all: BTreeSet<&String> = communities.iter().flatten().collect();
    assert_eq!(all.len(), 10);

    let meta = detector.get_community_metadata("t", &communities[0]).unwrap();
    assert_eq!(meta.size, 5);
    assert_eq!(meta.dominant_type.as_deref(), Some("VM"));
    assert_eq!(store.open_sessions(), 0);
}

#[test]
fn test_communities_skip_original_bridges() {
    let store = MemoryGraphStore::new();
    store.add_node(Node::new("a", "VM", "t")).unwrap();
    store.add_node(Node::new("b", "VM", "t")).unwrap();
    store.add_node(Node::new("bridge", "VNet", "t").with_label(Label::original())).unwrap();
    store.add_edge("t", Edge::new("a", "bridge", "CONNECTED_TO"));
    store.add_edge("t", Edge::new("bridge", "b", "CONNECTED_TO"));

    let communities = CommunityDetector::new(store).detect_communities("t").unwrap();
    assert_eq!(communities.len(), 2);
    assert!(communities.iter().all(|c| c.len() == 1));
}

#[test]
fn test_dependency_chain_closure() {
    let graph = GraphModel::from_parts(
        vec![
            Node::new("A", "VM", "t").with_property(DEPENDS_ON, vec!["B"]),
            Node::new("B", "NIC", "t").with_property(DEPENDS_ON, vec!["C"]),
            Node::new("C", "Subnet", "t"),
            Node::new("Z", "VM", "t"),
        ],
        vec![],
    )
    .unwrap();

    let filter: SubsetFilter = "node_ids=A".parse().unwrap();
    let subset = SubsetSelector::new().apply(&graph, &filter);
    let expected: BTreeSet<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
    assert_eq!(ids(&subset), expected);

    let closed = SubsetSelector::closure(&graph, ["A"]);
    let reclosed = SubsetSelector::closure(&graph, closed.iter().map(String::as_str));
    assert_eq!(closed, reclosed);
}

#[test]
fn test_resource_group_never_leaks() {
    let rg = |g: &str, name: &str| {
        format!("/subscriptions/s1/resourceGroups/{g}/providers/Microsoft.Compute/{name}")
    };
    let graph = GraphModel::from_parts(
        vec![
            Node::new(rg("rg-app", "vm1"), "VM", "t")
                .with_property(DEPENDS_ON, vec![rg("rg-net", "vnet").as_str()])
                .with_property(PARENT_ID, rg("rg-shared", "plan")),
            Node::new(rg("rg-app", "disk1"), "Disk", "t"),
            Node::new(rg("rg-net", "vnet"), "VNet", "t"),
            Node::new(rg("rg-shared", "plan"), "Plan", "t"),
        ],
        vec![Edge::new(rg("rg-app", "vm1"), rg("rg-app", "disk1"), "DEPENDS_ON")],
    )
    .unwrap();

    let filter = SubsetFilter::new().with_resource_groups(["rg-app"]);
    let subset = SubsetSelector::new().apply(&graph, &filter);
    assert_eq!(subset.node_count(), 2);
    assert!(subset.nodes().iter().all(|n| n.resource_group() == Some("rg-app")));
    assert_eq!(subset.edge_count(), 1);

    // The same node picked by id does pull in its dependencies
    let by_id = SubsetFilter::new().with_node_ids([rg("rg-app", "vm1")]);
    assert_eq!(SubsetSelector::new().apply(&graph, &by_id).node_count(), 4);
}

#[test]
fn test_subset_output_round_trips_as_json() {
    let graph = GraphModel::from_parts(
        vec![
            Node::new("vm", "Microsoft.Compute/virtualMachines", "t")
                .with_property(PARENT_ID, "rg"),
            Node::new("rg", "Microsoft.Resources/resourceGroups", "t"),
            Node::new("kv", "Microsoft.KeyVault/vaults", "t"),
        ],
        vec![Edge::new("vm", "rg", "CONTAINS")],
    )
    .unwrap();

    let filter: SubsetFilter = "types=Microsoft.Compute/*".parse().unwrap();
    let subset = SubsetSelector::new().apply(&graph, &filter);
    let json = subset.to_json().unwrap();
    let back = GraphModel::from_json(&json).unwrap();

    assert_eq!(ids(&back), ids(&subset));
    assert_eq!(back.edges(), subset.edges());
    assert!(json.contains("\"source_id\""));
}
