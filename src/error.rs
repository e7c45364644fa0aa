//! Top-level error type for abstraction runs

use crate::config::ConfigError;
use crate::embed::EmbedError;
use crate::graph::StoreError;
use crate::persistence::CacheError;
use thiserror::Error;

/// Errors surfaced by the abstraction engine
#[derive(Error, Debug)]
pub enum AbstractionError {
    /// Invalid caller input (sample size, tenant id, empty tenant)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store or session failure; never retried at this layer
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embed(#[from] EmbedError),

    /// Embedding cache failure
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

pub type AbstractionResult<T> = Result<T, AbstractionError>;
