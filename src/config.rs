//! Engine configuration
//!
//! Loaded from YAML; every field has a default so a partial (or empty)
//! document is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tenantgraph_algorithms::{Node2VecConfig, SkipGramConfig, WalkConfig};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which sampler drives an abstraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingStrategy {
    #[default]
    Uniform,
    Importance,
}

/// Sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub strategy: SamplingStrategy,
    /// Share of the importance distribution in the blend, within [0, 1]
    pub importance_weight: f64,
    /// Allowed per-type deviation of sampled share from source share
    pub tolerance: f64,
    /// Extra slack absorbing quota rounding
    pub rounding_slack: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::Uniform,
            importance_weight: 0.5,
            tolerance: 0.15,
            rounding_slack: 0.02,
        }
    }
}

impl SamplingConfig {
    /// Maximum accepted absolute delta between source and sampled shares
    pub fn max_delta(&self) -> f64 {
        self.tolerance + self.rounding_slack
    }
}

/// node2vec training parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimensions: usize,
    pub walk_length: usize,
    pub num_walks: usize,
    /// Return parameter
    pub p: f64,
    /// In/out parameter
    pub q: f64,
    pub window: usize,
    pub negative_samples: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    /// Walk generation threads
    pub workers: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: 64,
            walk_length: 30,
            num_walks: 200,
            p: 1.0,
            q: 1.0,
            window: 10,
            negative_samples: 5,
            epochs: 1,
            learning_rate: 0.025,
            workers: 4,
        }
    }
}

impl EmbeddingConfig {
    /// Training configuration for the algorithm crate
    pub fn to_node2vec(&self) -> Node2VecConfig {
        Node2VecConfig {
            walks: WalkConfig {
                walk_length: self.walk_length,
                num_walks: self.num_walks,
                p: self.p,
                q: self.q,
                workers: self.workers,
            },
            skipgram: SkipGramConfig {
                dimensions: self.dimensions,
                window: self.window,
                negative_samples: self.negative_samples,
                epochs: self.epochs,
                learning_rate: self.learning_rate,
                ..Default::default()
            },
        }
    }
}

/// Embedding cache location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from(".embedding_cache"),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sampling: SamplingConfig,
    pub embedding: EmbeddingConfig,
    pub cache: CacheConfig,
}

impl EngineConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let sampling = &self.sampling;
        if !(0.0..=1.0).contains(&sampling.importance_weight) {
            return Err(invalid(
                "sampling.importance_weight",
                format!("{} is outside [0, 1]", sampling.importance_weight),
            ));
        }
        if sampling.tolerance < 0.0 || sampling.rounding_slack < 0.0 {
            return Err(invalid(
                "sampling.tolerance",
                "tolerance and slack must be non-negative".to_string(),
            ));
        }

        let embedding = &self.embedding;
        let positive = [
            ("embedding.dimensions", embedding.dimensions),
            ("embedding.walk_length", embedding.walk_length),
            ("embedding.num_walks", embedding.num_walks),
            ("embedding.window", embedding.window),
            ("embedding.epochs", embedding.epochs),
            ("embedding.workers", embedding.workers),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(invalid(field, "must be positive".to_string()));
            }
        }
        if !(embedding.p > 0.0 && embedding.q > 0.0) {
            return Err(invalid("embedding.p", "p and q must be positive".to_string()));
        }
        if embedding.learning_rate <= 0.0 {
            return Err(invalid("embedding.learning_rate", "must be positive".to_string()));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
