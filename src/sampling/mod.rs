//! Type-stratified sampling strategies
//!
//! Both strategies share the quota calculation and differ only in how ids
//! are drawn within a type:
//! - [`StratifiedSampler`]: uniform without replacement
//! - [`ImportanceSampler`]: weighted by embedding importance, falling back
//!   to uniform when embeddings are unavailable

pub mod importance;
pub mod quota;
pub mod stratified;

use crate::error::AbstractionResult;
use indexmap::IndexMap;
use rand::RngCore;
use serde::{Deserialize, Serialize};

pub use importance::{weighted_sample, ImportanceSampler};
pub use quota::{calculate_quotas, validate_distribution, validate_distribution_within};
pub use stratified::StratifiedSampler;

/// Which strategy actually produced a sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyUsed {
    /// Uniform sampling was requested
    Uniform,
    /// Importance weighting ran; listed types fell back to uniform individually
    ImportanceWeighted { uniform_fallback_types: Vec<String> },
    /// Embeddings were unavailable, so the whole sample is uniform
    UniformFallback { reason: String },
}

/// Sampled ids per type plus the strategy that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleOutcome {
    pub samples: IndexMap<String, Vec<String>>,
    pub strategy: StrategyUsed,
}

impl SampleOutcome {
    /// Total number of sampled ids
    pub fn len(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sampled id count per type
    pub fn type_distribution(&self) -> IndexMap<String, usize> {
        self.samples.iter().map(|(ty, ids)| (ty.clone(), ids.len())).collect()
    }

    /// Every sampled id, in type order
    pub fn ids(&self) -> Vec<String> {
        self.samples.values().flatten().cloned().collect()
    }
}

/// A strategy for drawing a type-stratified sample
pub trait Sampler: Send + Sync {
    /// Short strategy name for logs
    fn name(&self) -> &'static str;

    /// Resource count per type, ordered by type name
    fn get_type_distribution(&self, tenant_id: &str) -> AbstractionResult<IndexMap<String, usize>>;

    /// Draw about `min(sample_size, total_resources)` ids, stratified by type
    fn sample_by_type(
        &self,
        tenant_id: &str,
        sample_size: usize,
        total_resources: usize,
        rng: &mut dyn RngCore,
    ) -> AbstractionResult<SampleOutcome>;
}
