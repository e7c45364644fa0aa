//! node2vec biased random walks
//!
//! Walk bias is controlled by the return parameter `p` and the in-out
//! parameter `q`. Given a walk that just moved `t -> v`, the unnormalised
//! probability of stepping to neighbour `x` of `v` is:
//!
//! ```text
//! 1/p  if x == t          (return)
//! 1    if x is adjacent t (stay at distance 1)
//! 1/q  otherwise          (move outward)
//! ```
//!
//! `p = q = 1` reduces to an unbiased (DeepWalk) walk.

use super::common::GraphView;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Invalid walk configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build walk worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type WalkResult<T> = Result<T, WalkError>;

/// Walk generation parameters
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Nodes per walk, including the start node
    pub walk_length: usize,
    /// Walks started from every node
    pub num_walks: usize,
    /// Return parameter
    pub p: f64,
    /// In-out parameter
    pub q: f64,
    /// Upper bound on worker threads
    pub workers: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            walk_length: 30,
            num_walks: 200,
            p: 1.0,
            q: 1.0,
            workers: 4,
        }
    }
}

impl WalkConfig {
    pub fn validate(&self) -> WalkResult<()> {
        if self.walk_length == 0 || self.num_walks == 0 {
            return Err(WalkError::InvalidConfig(
                "walk_length and num_walks must be positive".to_string(),
            ));
        }
        if !(self.p > 0.0 && self.p.is_finite()) || !(self.q > 0.0 && self.q.is_finite()) {
            return Err(WalkError::InvalidConfig(format!(
                "p and q must be finite and positive (p={}, q={})",
                self.p, self.q
            )));
        }
        if self.workers == 0 {
            return Err(WalkError::InvalidConfig("workers must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Generate `num_walks` walks per node as dense node indices.
///
/// Each round visits the nodes in a seeded shuffle; each walk gets its own
/// RNG derived from `seed`, so the corpus is identical for any worker count.
/// Blocks until every walk is generated.
pub fn generate_walks(
    view: &GraphView,
    config: &WalkConfig,
    seed: u64,
) -> WalkResult<Vec<Vec<u32>>> {
    config.validate()?;
    let n = view.node_count;
    if n == 0 {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()?;

    let mut order_rng = StdRng::seed_from_u64(seed);
    let mut walks = Vec::with_capacity(n * config.num_walks);

    for round in 0..config.num_walks {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut order_rng);

        let round_walks: Vec<Vec<u32>> = pool.install(|| {
            order
                .par_iter()
                .map(|&start| {
                    let walk_seed = mix_seed(seed, (round * n + start) as u64);
                    let mut rng = StdRng::seed_from_u64(walk_seed);
                    biased_walk(view, start, config, &mut rng)
                })
                .collect()
        });
        walks.extend(round_walks);
    }

    Ok(walks)
}

/// Single walk from `start`.
///
/// Stops early at nodes without neighbours, and when the bias weights are
/// unusable (a `p` or `q` that was never validated).
pub fn biased_walk<R: Rng + ?Sized>(
    view: &GraphView,
    start: usize,
    config: &WalkConfig,
    rng: &mut R,
) -> Vec<u32> {
    let mut walk = Vec::with_capacity(config.walk_length);
    walk.push(start as u32);

    let unbiased = config.p == 1.0 && config.q == 1.0;

    while walk.len() < config.walk_length {
        let current = walk[walk.len() - 1] as usize;
        let neighbors = view.successors(current);
        if neighbors.is_empty() {
            break;
        }

        let next = if walk.len() == 1 || unbiased {
            neighbors[rng.gen_range(0..neighbors.len())]
        } else {
            let previous = walk[walk.len() - 2] as usize;
            let bias = |&x: &usize| {
                if x == previous {
                    1.0 / config.p
                } else if view.has_edge(previous, x) {
                    1.0
                } else {
                    1.0 / config.q
                }
            };
            match neighbors.choose_weighted(rng, bias) {
                Ok(&x) => x,
                Err(_) => break,
            }
        };

        walk.push(next as u32);
    }

    walk
}

/// SplitMix64 finaliser, used to derive independent per-walk seeds.
fn mix_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
