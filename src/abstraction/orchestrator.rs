//! Drives a [`Sampler`] against the store and records linkage edges

use crate::config::{EngineConfig, SamplingStrategy};
use crate::embed::EmbeddingGenerator;
use crate::error::{AbstractionError, AbstractionResult};
use crate::graph::GraphBackend;
use crate::persistence::EmbeddingCache;
use crate::sampling::{ImportanceSampler, Sampler, StrategyUsed, StratifiedSampler};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Result of one abstraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractionStats {
    pub tenant_id: String,
    /// Requested sample size
    pub target_size: usize,
    /// Ids actually sampled
    pub actual_size: usize,
    /// Sampled ids per type
    pub type_distribution: IndexMap<String, usize>,
    /// Strategy that produced the sample
    pub strategy: StrategyUsed,
    /// Linkage edges written
    pub linkages_created: usize,
}

/// Validates requests, samples, and writes linkage edges
pub struct AbstractionOrchestrator<B: GraphBackend> {
    backend: B,
    sampler: Box<dyn Sampler>,
}

impl<B: GraphBackend> AbstractionOrchestrator<B> {
    pub fn new(backend: B, sampler: Box<dyn Sampler>) -> Self {
        Self { backend, sampler }
    }

    pub fn sampler(&self) -> &dyn Sampler {
        self.sampler.as_ref()
    }

    /// Sample `sample_size` resources of a tenant and link each sampled id
    /// to its source node.
    ///
    /// A fixed `seed` makes the run repeatable. Without `clear_existing`,
    /// repeated runs accumulate duplicate linkage edges.
    pub fn abstract_tenant(
        &self,
        tenant_id: &str,
        sample_size: usize,
        seed: Option<u64>,
        clear_existing: bool,
    ) -> AbstractionResult<AbstractionStats> {
        if sample_size == 0 {
            return Err(AbstractionError::Validation("sample size must be positive".to_string()));
        }
        if tenant_id.trim().is_empty() {
            return Err(AbstractionError::Validation("tenant id must not be empty".to_string()));
        }

        let distribution = self.sampler.get_type_distribution(tenant_id)?;
        let total_resources: usize = distribution.values().sum();
        if total_resources == 0 {
            return Err(AbstractionError::Validation(format!(
                "tenant {tenant_id} has no resources"
            )));
        }

        info!(
            tenant_id,
            sample_size,
            total_resources,
            types = distribution.len(),
            sampler = self.sampler.name(),
            "starting abstraction"
        );

        if clear_existing {
            let mut session = self.backend.session()?;
            let removed = session.clear_linkage(tenant_id)?;
            info!(tenant_id, removed, "cleared existing linkage edges");
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let outcome =
            self.sampler.sample_by_type(tenant_id, sample_size, total_resources, &mut rng)?;

        let ids = outcome.ids();
        let linkages_created = {
            let mut session = self.backend.session()?;
            session.create_linkage(tenant_id, &ids)?
        };

        let stats = AbstractionStats {
            tenant_id: tenant_id.to_string(),
            target_size: sample_size,
            actual_size: outcome.len(),
            type_distribution: outcome.type_distribution(),
            strategy: outcome.strategy,
            linkages_created,
        };
        info!(
            tenant_id,
            target_size = stats.target_size,
            actual_size = stats.actual_size,
            linkages_created,
            "abstraction complete"
        );
        Ok(stats)
    }
}

impl<B> AbstractionOrchestrator<B>
where
    B: GraphBackend + Clone + 'static,
{
    /// Build the orchestrator and the sampler named by `config`
    pub fn from_config(backend: B, config: &EngineConfig) -> AbstractionResult<Self> {
        config.validate()?;
        let stratified = StratifiedSampler::new(backend.clone(), config.sampling.clone());

        let sampler: Box<dyn Sampler> = match config.sampling.strategy {
            SamplingStrategy::Uniform => Box::new(stratified),
            SamplingStrategy::Importance => {
                let generator = EmbeddingGenerator::new(backend.clone(), config.embedding.clone());
                let cache = if config.cache.enabled {
                    Some(EmbeddingCache::open(&config.cache.directory)?)
                } else {
                    None
                };
                Box::new(ImportanceSampler::new(stratified, generator, cache)?)
            }
        };

        Ok(Self::new(backend, sampler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::graph::{Edge, MemoryGraphStore, Node};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn tenant_store() -> Arc<MemoryGraphStore> {
        let store = MemoryGraphStore::new();
        for (ty, count) in [("VM", 100), ("Storage", 50), ("VNet", 10)] {
            for i in 0..count {
                store.add_node(Node::new(format!("{ty}-{i}"), ty, "tenant-1")).unwrap();
            }
        }
        for i in 0..100 {
            let vnet = format!("VNet-{}", i % 10);
            store.add_edge("tenant-1", Edge::new(format!("VM-{i}"), vnet, "CONNECTED_TO"));
        }
        Arc::new(store)
    }

    fn uniform(store: Arc<MemoryGraphStore>) -> AbstractionOrchestrator<Arc<MemoryGraphStore>> {
        AbstractionOrchestrator::from_config(store, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_validation_errors() {
        let orchestrator = uniform(tenant_store());
        assert!(matches!(
            orchestrator.abstract_tenant("tenant-1", 0, None, false),
            Err(AbstractionError::Validation(_))
        ));
        assert!(matches!(
            orchestrator.abstract_tenant("  ", 5, None, false),
            Err(AbstractionError::Validation(_))
        ));
        assert!(matches!(
            orchestrator.abstract_tenant("nobody", 5, None, false),
            Err(AbstractionError::Validation(_))
        ));
    }

    #[test]
    fn test_stats_and_linkage() {
        let store = tenant_store();
        let orchestrator = uniform(store.clone());

        let stats = orchestrator.abstract_tenant("tenant-1", 16, Some(7), false).unwrap();
        assert_eq!(stats.target_size, 16);
        assert_eq!(stats.actual_size, 16);
        assert_eq!(stats.linkages_created, 16);
        assert_eq!(stats.strategy, StrategyUsed::Uniform);
        assert_eq!(store.linkage_count("tenant-1"), 16);
        assert_eq!(store.open_sessions(), 0);
    }

    #[test]
    fn test_repeat_runs_duplicate_unless_cleared() {
        let store = tenant_store();
        let orchestrator = uniform(store.clone());

        orchestrator.abstract_tenant("tenant-1", 10, Some(1), false).unwrap();
        orchestrator.abstract_tenant("tenant-1", 10, Some(1), false).unwrap();
        assert_eq!(store.linkage_count("tenant-1"), 20);

        orchestrator.abstract_tenant("tenant-1", 10, Some(1), true).unwrap();
        assert_eq!(store.linkage_count("tenant-1"), 10);
    }

    #[test]
    fn test_seeded_runs_are_repeatable() {
        let store = tenant_store();
        let orchestrator = uniform(store.clone());

        orchestrator.abstract_tenant("tenant-1", 12, Some(99), true).unwrap();
        let first = store.linkages("tenant-1");
        orchestrator.abstract_tenant("tenant-1", 12, Some(99), true).unwrap();
        assert_eq!(store.linkages("tenant-1"), first);
    }

    #[test]
    fn test_importance_strategy_from_config() {
        let dir = TempDir::new().unwrap();
        let mut config = EngineConfig::default();
        config.sampling.strategy = SamplingStrategy::Importance;
        config.embedding.dimensions = 8;
        config.embedding.walk_length = 5;
        config.embedding.num_walks = 3;
        config.embedding.workers = 2;
        config.cache = CacheConfig { enabled: true, directory: dir.path().to_path_buf() };

        let store = tenant_store();
        let orchestrator = AbstractionOrchestrator::from_config(store.clone(), &config).unwrap();
        assert_eq!(orchestrator.sampler().name(), "importance");

        let stats = orchestrator.abstract_tenant("tenant-1", 16, Some(3), false).unwrap();
        assert_eq!(stats.actual_size, 16);
        assert!(matches!(stats.strategy, StrategyUsed::ImportanceWeighted { .. }));

        let cache = EmbeddingCache::open(dir.path()).unwrap();
        assert_eq!(cache.entries().unwrap().len(), 1);
        assert_eq!(store.open_sessions(), 0);
    }
}
