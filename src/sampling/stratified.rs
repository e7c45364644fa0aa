//! Uniform sampling within each resource type

use super::quota::{calculate_quotas, validate_distribution_within};
use super::{SampleOutcome, Sampler, StrategyUsed};
use crate::config::SamplingConfig;
use crate::error::AbstractionResult;
use crate::graph::{GraphBackend, StoreResult};
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::{debug, info};

/// Stratified sampler drawing uniformly within each type
pub struct StratifiedSampler<B: GraphBackend> {
    backend: B,
    config: SamplingConfig,
}

impl<B: GraphBackend> StratifiedSampler<B> {
    pub fn new(backend: B, config: SamplingConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Resource count per type, ordered by type name
    pub fn get_type_distribution(&self, tenant_id: &str) -> StoreResult<IndexMap<String, usize>> {
        let mut distribution = {
            let mut session = self.backend.session()?;
            session.count_by_type(tenant_id)?
        };
        distribution.sort_keys();
        Ok(distribution)
    }

    /// All ids of one type
    pub fn type_ids(&self, tenant_id: &str, resource_type: &str) -> StoreResult<Vec<String>> {
        let mut session = self.backend.session()?;
        session.ids_by_type(tenant_id, resource_type)
    }

    /// Quotas for a tenant, checked against the tolerance (advisory)
    pub fn plan(
        &self,
        tenant_id: &str,
        sample_size: usize,
        total_resources: usize,
    ) -> StoreResult<IndexMap<String, usize>> {
        let distribution = self.get_type_distribution(tenant_id)?;
        let quotas = calculate_quotas(&distribution, sample_size.min(total_resources));
        validate_distribution_within(&distribution, &quotas, self.config.max_delta());
        debug!(tenant_id, ?quotas, "sampling plan");
        Ok(quotas)
    }

    /// Uniform sample without replacement of `min(quota, available)` ids
    pub fn sample_type(
        &self,
        tenant_id: &str,
        resource_type: &str,
        quota: usize,
        rng: &mut dyn RngCore,
    ) -> StoreResult<Vec<String>> {
        let ids = self.type_ids(tenant_id, resource_type)?;
        Ok(uniform_sample(&ids, quota, rng))
    }
}

/// `min(quota, ids.len())` distinct ids chosen uniformly
pub(crate) fn uniform_sample(ids: &[String], quota: usize, rng: &mut dyn RngCore) -> Vec<String> {
    ids.choose_multiple(rng, quota.min(ids.len())).cloned().collect()
}

impl<B: GraphBackend> Sampler for StratifiedSampler<B> {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn get_type_distribution(&self, tenant_id: &str) -> AbstractionResult<IndexMap<String, usize>> {
        Ok(StratifiedSampler::get_type_distribution(self, tenant_id)?)
    }

    fn sample_by_type(
        &self,
        tenant_id: &str,
        sample_size: usize,
        total_resources: usize,
        rng: &mut dyn RngCore,
    ) -> AbstractionResult<SampleOutcome> {
        let quotas = self.plan(tenant_id, sample_size, total_resources)?;

        let mut samples = IndexMap::with_capacity(quotas.len());
        for (resource_type, &quota) in &quotas {
            let ids = self.sample_type(tenant_id, resource_type, quota, rng)?;
            debug!(
                tenant_id,
                resource_type = %resource_type,
                quota,
                sampled = ids.len(),
                "sampled type uniformly"
            );
            samples.insert(resource_type.clone(), ids);
        }

        let outcome = SampleOutcome {
            samples,
            strategy: StrategyUsed::Uniform,
        };
        info!(
            tenant_id,
            sample_size,
            sampled = outcome.len(),
            "uniform stratified sample complete"
        );
        Ok(outcome)
    }
}
