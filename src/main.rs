use anyhow::Context;
use std::sync::Arc;
use tenantgraph::graph::node::DEPENDS_ON;
use tenantgraph::{
    AbstractionOrchestrator, CommunityDetector, Edge, EngineConfig, MemoryGraphStore, Node,
    SamplingStrategy,
    SubsetFilter, SubsetSelector,
};
use tracing_subscriber::EnvFilter;

const TENANT: &str = "demo-tenant";

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("tenantgraph v{}", tenantgraph::version());
    println!("==========================================");

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => EngineConfig::default(),
    };

    let store = Arc::new(MemoryGraphStore::new());
    build_demo_tenant(&store)?;

    demo_communities(&store)?;
    demo_subset(&store)?;
    demo_abstraction(&store, &config)?;

    Ok(())
}

/// 100 VMs, 50 storage accounts and 10 virtual networks in 10 resource groups
fn build_demo_tenant(store: &MemoryGraphStore) -> anyhow::Result<()> {
    let rg = |i: usize| format!("/subscriptions/demo/resourceGroups/rg-{}", i % 10);

    for i in 0..10 {
        store.add_node(Node::new(format!("{}/vnet-{i}", rg(i)), "VNet", TENANT))?;
    }
    for i in 0..50 {
        let id = format!("{}/storage-{i}", rg(i));
        store.add_node(Node::new(id, "Storage", TENANT))?;
    }
    for i in 0..100 {
        let vm = format!("{}/vm-{i}", rg(i));
        let vnet = format!("{}/vnet-{}", rg(i), i % 10);
        let storage = format!("{}/storage-{}", rg(i), i % 50);
        let node = Node::new(vm.clone(), "VM", TENANT)
            .with_property(DEPENDS_ON, vec![vnet.as_str()]);
        store.add_node(node)?;
        store.add_edge(TENANT, Edge::new(vm.clone(), vnet, "CONNECTED_TO"));
        store.add_edge(TENANT, Edge::new(vm, storage, "USES_SERVICE"));
    }

    println!("✓ Loaded tenant {TENANT} with 160 resources");
    Ok(())
}

fn demo_communities(store: &Arc<MemoryGraphStore>) -> anyhow::Result<()> {
    println!("\n=== Communities ===");
    let detector = CommunityDetector::new(store.clone());
    let communities = detector.detect_communities(TENANT)?;
    println!("Found {} communities", communities.len());

    for (i, community) in communities.iter().take(3).enumerate() {
        let meta = detector.get_community_metadata(TENANT, community)?;
        println!(
            "  #{i}: {} resources, dominant type {}",
            meta.size,
            meta.dominant_type.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn demo_subset(store: &MemoryGraphStore) -> anyhow::Result<()> {
    println!("\n=== Subset selection ===");
    let graph = store.tenant_graph(TENANT).context("demo tenant missing")?;
    let selector = SubsetSelector::new();

    let filters = [
        "ids=/subscriptions/demo/resourceGroups/rg-3/vm-3",
        "resource_groups=rg-3",
        "types=v*",
    ];
    for text in filters {
        let filter: SubsetFilter = text.parse()?;
        let subset = selector.apply(&graph, &filter);
        println!("  {text}: {} nodes, {} edges", subset.node_count(), subset.edge_count());
    }
    Ok(())
}

fn demo_abstraction(store: &Arc<MemoryGraphStore>, config: &EngineConfig) -> anyhow::Result<()> {
    println!("\n=== Abstraction ===");
    for strategy in [SamplingStrategy::Uniform, SamplingStrategy::Importance] {
        let mut config = config.clone();
        config.sampling.strategy = strategy;

        let orchestrator = AbstractionOrchestrator::from_config(store.clone(), &config)?;
        let stats = orchestrator.abstract_tenant(TENANT, 16, Some(42), true)?;
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }
    println!("Open sessions after runs: {}", store.open_sessions());
    Ok(())
}
