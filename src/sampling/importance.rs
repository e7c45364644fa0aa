//! Importance-weighted sampling within each resource type
//!
//! Draw probabilities blend a uniform share with each node's embedding
//! importance:
//!
//! ```text
//! p[i] ∝ (1 - w) / n + w * importance[i] / Σ importance
//! ```
//!
//! `w = 0` is plain uniform sampling.

use super::stratified::{uniform_sample, StratifiedSampler};
use super::{SampleOutcome, Sampler, StrategyUsed};
use crate::config::{ConfigError, ConfigResult};
use crate::embed::{get_node_importance_scores, EmbeddingSource, Embeddings};
use crate::error::AbstractionResult;
use crate::graph::GraphBackend;
use crate::persistence::EmbeddingCache;
use indexmap::IndexMap;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Stratified sampler that prefers structurally important nodes.
///
/// Quotas come from the wrapped [`StratifiedSampler`]; embeddings come from
/// the cache when present, otherwise from the [`EmbeddingSource`].
pub struct ImportanceSampler<B: GraphBackend, S: EmbeddingSource> {
    stratified: StratifiedSampler<B>,
    source: S,
    cache: Option<EmbeddingCache>,
    importance_weight: f64,
}

impl<B: GraphBackend, S: EmbeddingSource> ImportanceSampler<B, S> {
    /// Create a sampler; the importance weight comes from the stratified
    /// sampler's config and must lie in [0, 1]
    pub fn new(
        stratified: StratifiedSampler<B>,
        source: S,
        cache: Option<EmbeddingCache>,
    ) -> ConfigResult<Self> {
        let importance_weight = stratified.config().importance_weight;
        if !(0.0..=1.0).contains(&importance_weight) {
            return Err(ConfigError::Invalid {
                field: "sampling.importance_weight",
                reason: format!("{importance_weight} is outside [0, 1]"),
            });
        }
        Ok(Self {
            stratified,
            source,
            cache,
            importance_weight,
        })
    }

    pub fn importance_weight(&self) -> f64 {
        self.importance_weight
    }

    /// Cached embeddings, or freshly generated ones (then cached).
    ///
    /// A failing cache write is logged and ignored.
    pub fn load_or_generate_embeddings(
        &self,
        tenant_id: &str,
        rng: &mut dyn RngCore,
    ) -> AbstractionResult<Embeddings> {
        let params = self.source.params();
        let (dimensions, walk_length, num_walks) =
            (params.dimensions, params.walk_length, params.num_walks);
        if let Some(cache) = &self.cache {
            if let Some(embeddings) = cache.get(tenant_id, dimensions, walk_length, num_walks) {
                info!(tenant_id, nodes = embeddings.len(), "using cached embeddings");
                return Ok(embeddings);
            }
        }

        let embeddings = self.source.generate(tenant_id, rng)?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(tenant_id, &embeddings, dimensions, walk_length, num_walks) {
                warn!(tenant_id, error = %e, "failed to cache embeddings");
            }
        }
        Ok(embeddings)
    }

    fn weighted_by_type(
        &self,
        tenant_id: &str,
        quotas: &IndexMap<String, usize>,
        importance: &HashMap<String, f64>,
        rng: &mut dyn RngCore,
    ) -> AbstractionResult<SampleOutcome> {
        let mut samples = IndexMap::with_capacity(quotas.len());
        let mut uniform_fallback_types = Vec::new();

        for (resource_type, &quota) in quotas {
            let ids = self.stratified.type_ids(tenant_id, resource_type)?;
            let weighted = weighted_sample(&ids, importance, quota, self.importance_weight, rng);
            let sampled = match weighted {
                Ok(sampled) => sampled,
                Err(e) => {
                    warn!(
                        tenant_id,
                        resource_type = %resource_type,
                        error = %e,
                        "weighted sampling failed; using uniform sample for this type"
                    );
                    uniform_fallback_types.push(resource_type.clone());
                    uniform_sample(&ids, quota, rng)
                }
            };
            debug!(
                tenant_id,
                resource_type = %resource_type,
                quota,
                sampled = sampled.len(),
                "sampled type by importance"
            );
            samples.insert(resource_type.clone(), sampled);
        }

        Ok(SampleOutcome {
            samples,
            strategy: StrategyUsed::ImportanceWeighted { uniform_fallback_types },
        })
    }
}

impl<B: GraphBackend, S: EmbeddingSource> Sampler for ImportanceSampler<B, S> {
    fn name(&self) -> &'static str {
        "importance"
    }

    fn get_type_distribution(&self, tenant_id: &str) -> AbstractionResult<IndexMap<String, usize>> {
        Ok(self.stratified.get_type_distribution(tenant_id)?)
    }

    fn sample_by_type(
        &self,
        tenant_id: &str,
        sample_size: usize,
        total_resources: usize,
        rng: &mut dyn RngCore,
    ) -> AbstractionResult<SampleOutcome> {
        let embeddings = match self.load_or_generate_embeddings(tenant_id, rng) {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!(
                    tenant_id,
                    error = %e,
                    "embeddings unavailable; falling back to uniform sampling"
                );
                let mut outcome =
                    self.stratified
                        .sample_by_type(tenant_id, sample_size, total_resources, rng)?;
                outcome.strategy = StrategyUsed::UniformFallback { reason: e.to_string() };
                return Ok(outcome);
            }
        };

        let importance = get_node_importance_scores(&embeddings, None);
        let quotas = self.stratified.plan(tenant_id, sample_size, total_resources)?;
        let outcome = self.weighted_by_type(tenant_id, &quotas, &importance, rng)?;

        info!(
            tenant_id,
            sample_size,
            sampled = outcome.len(),
            importance_weight = self.importance_weight,
            "importance-weighted sample complete"
        );
        Ok(outcome)
    }
}

/// Draw `min(quota, ids.len())` distinct ids using blended weights.
///
/// Draws `min(2 * quota, n)` times with replacement, keeps first
/// occurrences in draw order, then fills any shortfall uniformly from ids
/// not drawn yet. Ids missing from `importance` score zero; if every score
/// is zero the blend is uniform. A negative or non-finite score is an
/// [`WeightedError::InvalidWeight`].
pub fn weighted_sample(
    ids: &[String],
    importance: &HashMap<String, f64>,
    quota: usize,
    importance_weight: f64,
    rng: &mut dyn RngCore,
) -> Result<Vec<String>, WeightedError> {
    let n = ids.len();
    let want = quota.min(n);
    if want == 0 {
        return Ok(Vec::new());
    }

    let scores: Vec<f64> = ids
        .iter()
        .map(|id| importance.get(id).copied().unwrap_or(0.0))
        .collect();
    if scores.iter().any(|s| !s.is_finite() || *s < 0.0) {
        return Err(WeightedError::InvalidWeight);
    }
    let score_total: f64 = scores.iter().sum();
    let uniform = 1.0 / n as f64;

    let mut weights: Vec<f64> = if score_total > 0.0 {
        scores
            .iter()
            .map(|s| (1.0 - importance_weight) * uniform + importance_weight * s / score_total)
            .collect()
    } else {
        vec![uniform; n]
    };
    let weight_total: f64 = weights.iter().sum();
    if weight_total > 0.0 {
        weights.iter_mut().for_each(|w| *w /= weight_total);
    }
    let distribution = WeightedIndex::new(&weights)?;

    let draws = (2 * quota).min(n);
    let mut seen = HashSet::with_capacity(draws);
    let mut picked = Vec::with_capacity(want);
    for _ in 0..draws {
        let idx = distribution.sample(rng);
        if seen.insert(idx) {
            picked.push(idx);
        }
    }
    picked.truncate(want);

    if picked.len() < want {
        let unseen: Vec<usize> = (0..n).filter(|i| !seen.contains(i)).collect();
        let missing = want - picked.len();
        picked.extend(unseen.choose_multiple(rng, missing).copied());
    }

    Ok(picked.into_iter().map(|idx| ids[idx].clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingConfig;
    use crate::embed::{EmbedError, EmbedResult, EmbeddingParams};
    use crate::graph::{MemoryGraphStore, Node};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("n{i}")).collect()
    }

    /// Fixed embeddings: node `n{i}` has magnitude `i`
    struct FixedSource {
        calls: AtomicUsize,
        embeddings: Embeddings,
    }

    impl FixedSource {
        fn new(ids: &[String]) -> Self {
            let embeddings = ids
                .iter()
                .enumerate()
                .map(|(i, id)| (id.clone(), vec![i as f32, 0.0]))
                .collect();
            Self { calls: AtomicUsize::new(0), embeddings }
        }

        fn with_vector(mut self, id: &str, vector: Vec<f32>) -> Self {
            self.embeddings.insert(id.to_string(), vector);
            self
        }
    }

    impl EmbeddingSource for FixedSource {
        fn params(&self) -> EmbeddingParams {
            EmbeddingParams { dimensions: 2, walk_length: 5, num_walks: 3 }
        }

        fn generate(&self, _tenant_id: &str, _rng: &mut dyn RngCore) -> EmbedResult<Embeddings> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.embeddings.clone())
        }
    }

    struct FailingSource;

    impl EmbeddingSource for FailingSource {
        fn params(&self) -> EmbeddingParams {
            EmbeddingParams { dimensions: 2, walk_length: 5, num_walks: 3 }
        }

        fn generate(&self, tenant_id: &str, _rng: &mut dyn RngCore) -> EmbedResult<Embeddings> {
            Err(EmbedError::EmptyGraph(tenant_id.to_string()))
        }
    }

    fn store() -> Arc<MemoryGraphStore> {
        let store = MemoryGraphStore::new();
        for id in ids(40) {
            store.add_node(Node::new(id, "VM", "t")).unwrap();
        }
        for i in 0..10 {
            store.add_node(Node::new(format!("d{i}"), "Disk", "t")).unwrap();
        }
        Arc::new(store)
    }

    fn sampling(weight: f64) -> SamplingConfig {
        SamplingConfig { importance_weight: weight, ..Default::default() }
    }

    #[test]
    fn test_exact_count_and_distinct() {
        let ids = ids(10);
        let importance: HashMap<String, f64> = HashMap::from([("n3".to_string(), 1.0)]);
        let mut rng = StdRng::seed_from_u64(11);

        for quota in [1, 4, 9, 10, 25] {
            let sampled = weighted_sample(&ids, &importance, quota, 0.9, &mut rng).unwrap();
            assert_eq!(sampled.len(), quota.min(10));
            assert_eq!(sampled.iter().collect::<HashSet<_>>().len(), sampled.len());
        }
        assert!(weighted_sample(&[], &importance, 3, 0.5, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_zero_weight_is_uniform() {
        let ids = ids(10);
        let importance: HashMap<String, f64> =
            ids.iter().enumerate().map(|(i, id)| (id.clone(), i as f64)).collect();
        let mut rng = StdRng::seed_from_u64(2024);
        let mut hits: HashMap<String, usize> = HashMap::new();

        let trials = 3000;
        for _ in 0..trials {
            for id in weighted_sample(&ids, &importance, 3, 0.0, &mut rng).unwrap() {
                *hits.entry(id).or_insert(0) += 1;
            }
        }
        // Each id is expected in 30% of trials
        for id in &ids {
            let rate = hits.get(id).copied().unwrap_or(0) as f64 / trials as f64;
            assert!((rate - 0.3).abs() < 0.05, "{id}: {rate}");
        }
    }

    #[test]
    fn test_full_weight_prefers_important_nodes() {
        let ids = ids(20);
        let importance: HashMap<String, f64> =
            HashMap::from([("n0".to_string(), 1.0), ("n1".to_string(), 1.0)]);
        let mut rng = StdRng::seed_from_u64(8);

        for _ in 0..50 {
            let sampled = weighted_sample(&ids, &importance, 1, 1.0, &mut rng).unwrap();
            assert!(sampled[0] == "n0" || sampled[0] == "n1", "{sampled:?}");
        }
    }

    #[test]
    fn test_negative_weights_error() {
        let ids = ids(3);
        let importance: HashMap<String, f64> =
            HashMap::from([("n0".to_string(), 10.0), ("n1".to_string(), -8.0)]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(weighted_sample(&ids, &importance, 2, 0.5, &mut rng).is_err());
    }

    #[test]
    fn test_non_finite_score_rejected() {
        let ids = ids(4);
        let importance: HashMap<String, f64> =
            HashMap::from([("n0".to_string(), 0.5), ("n2".to_string(), f64::NAN)]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            weighted_sample(&ids, &importance, 2, 0.5, &mut rng),
            Err(WeightedError::InvalidWeight)
        );
    }

    #[test]
    fn test_failing_type_falls_back_alone() {
        // One disk has a NaN embedding, so only the Disk type loses its weights
        let source = FixedSource::new(&ids(40)).with_vector("d3", vec![f32::NAN, 0.0]);
        let stratified = StratifiedSampler::new(store(), sampling(0.8));
        let sampler = ImportanceSampler::new(stratified, source, None).unwrap();
        let mut rng = StdRng::seed_from_u64(12);

        let outcome = sampler.sample_by_type("t", 10, 50, &mut rng).unwrap();
        assert_eq!(
            outcome.strategy,
            StrategyUsed::ImportanceWeighted { uniform_fallback_types: vec!["Disk".to_string()] }
        );
        assert_eq!(outcome.samples["VM"].len(), 8);
        assert_eq!(outcome.samples["Disk"].len(), 2);
        assert!(outcome.samples["Disk"].iter().all(|id| id.starts_with('d')));
        let distinct: HashSet<&String> = outcome.samples["Disk"].iter().collect();
        assert_eq!(distinct.len(), 2);
    }

    #[test]
    fn test_weight_out_of_range_rejected() {
        let stratified = StratifiedSampler::new(store(), sampling(1.2));
        assert!(ImportanceSampler::new(stratified, FailingSource, None).is_err());
    }

    #[test]
    fn test_embedding_failure_falls_back_to_uniform() {
        let stratified = StratifiedSampler::new(store(), sampling(0.5));
        let sampler = ImportanceSampler::new(stratified, FailingSource, None).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let outcome = sampler.sample_by_type("t", 10, 50, &mut rng).unwrap();
        assert_eq!(outcome.len(), 10);
        assert!(matches!(
            outcome.strategy,
            StrategyUsed::UniformFallback { ref reason } if reason.contains("no structural graph")
        ));
    }

    #[test]
    fn test_weighted_outcome_and_cache_reuse() {
        let dir = TempDir::new().unwrap();
        let cache = EmbeddingCache::open(dir.path()).unwrap();
        let source = FixedSource::new(&ids(40));
        let stratified = StratifiedSampler::new(store(), sampling(0.7));
        let sampler = ImportanceSampler::new(stratified, source, Some(cache)).unwrap();

        let mut rng = StdRng::seed_from_u64(4);
        let first = sampler.sample_by_type("t", 10, 50, &mut rng).unwrap();
        let second = sampler.sample_by_type("t", 10, 50, &mut rng).unwrap();

        assert_eq!(first.len(), 10);
        assert_eq!(second.type_distribution(), first.type_distribution());
        assert_eq!(sampler.source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            first.strategy,
            StrategyUsed::ImportanceWeighted { uniform_fallback_types: vec![] }
        );
        // Disks have no embeddings, so they are sampled with the uniform share only
        assert_eq!(first.samples["Disk"].len(), 2);
    }
}
