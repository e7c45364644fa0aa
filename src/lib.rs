//! tenantgraph
//!
//! Graph abstraction and analysis for cloud tenant resource graphs: produces
//! smaller, type-faithful samples of a tenant's graph and the structural
//! analyses used to partition or filter it.
//!
//! # Components
//!
//! - [`graph`]: property graph model, store interface and in-memory store
//! - [`algo`]: community detection over connected components
//! - [`subset`]: predicate-based subset selection with dependency closure
//! - [`embed`]: node2vec embeddings and importance scores
//! - [`persistence`]: on-disk embedding cache
//! - [`sampling`]: type-stratified uniform and importance-weighted sampling
//! - [`abstraction`]: orchestration of sampling runs and linkage edges
//!
//! ## Example Usage
//!
//! ```rust
//! use tenantgraph::graph::{MemoryGraphStore, Node};
//! use tenantgraph::{AbstractionOrchestrator, EngineConfig};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryGraphStore::new());
//! for i in 0..20 {
//!     store.add_node(Node::new(format!("vm-{i}"), "VM", "tenant-a")).unwrap();
//! }
//! for i in 0..5 {
//!     store.add_node(Node::new(format!("disk-{i}"), "Disk", "tenant-a")).unwrap();
//! }
//!
//! let config = EngineConfig::default();
//! let orchestrator = AbstractionOrchestrator::from_config(store.clone(), &config).unwrap();
//! let stats = orchestrator.abstract_tenant("tenant-a", 5, Some(42), true).unwrap();
//!
//! assert_eq!(stats.actual_size, 5);
//! assert_eq!(stats.type_distribution["VM"], 4);
//! assert_eq!(store.linkage_count("tenant-a"), 5);
//! ```

pub mod abstraction;
pub mod algo;
pub mod config;
pub mod embed;
pub mod error;
pub mod graph;
pub mod persistence;
pub mod sampling;
pub mod subset;

// Re-export main types for convenience
pub use abstraction::{AbstractionOrchestrator, AbstractionStats};
pub use algo::{CommunityDetector, CommunityMetadata};
pub use config::{ConfigError, EngineConfig, SamplingStrategy};
pub use embed::{EmbedError, EmbeddingGenerator, EmbeddingSource, Embeddings};
pub use error::{AbstractionError, AbstractionResult};
pub use graph::{Edge, GraphBackend, GraphModel, MemoryGraphStore, Node, StoreSession};
pub use persistence::{CacheError, EmbeddingCache};
pub use sampling::{ImportanceSampler, SampleOutcome, Sampler, StrategyUsed, StratifiedSampler};
pub use subset::{SubsetFilter, SubsetSelector};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
