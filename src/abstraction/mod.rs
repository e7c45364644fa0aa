//! Abstraction runs: sample a tenant and link the sample to its sources

pub mod orchestrator;

pub use orchestrator::{AbstractionOrchestrator, AbstractionStats};
