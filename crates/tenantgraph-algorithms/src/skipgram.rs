//! Skip-gram training for node embeddings
//!
//! Nodes appearing in similar random walk contexts end up with similar
//! vectors. Walks are treated as sentences and nodes as words; training uses
//! skip-gram with negative sampling (SGNS):
//!
//! ```text
//! L = log σ(v_ctx · v_center) + Σᵢ log σ(-v_negᵢ · v_center)
//! ```
//!
//! Negatives are drawn from the walk-frequency distribution raised to 0.75.

use super::common::GraphView;
use super::walk::{generate_walks, WalkConfig, WalkError};
use ndarray::{Array1, Array2};
use rand::distributions::{Distribution, Uniform, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum Node2VecError {
    #[error("Graph has no nodes to embed")]
    EmptyGraph,

    #[error("Invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Walk(#[from] WalkError),
}

pub type Node2VecResult<T> = Result<T, Node2VecError>;

/// Skip-gram model configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkipGramConfig {
    /// Embedding dimension.
    pub dimensions: usize,
    /// Maximum context window (each side).
    pub window: usize,
    /// Negative samples per positive pair.
    pub negative_samples: usize,
    /// Passes over the walk corpus.
    pub epochs: usize,
    /// Initial learning rate.
    pub learning_rate: f32,
    /// Floor for the linearly decayed learning rate.
    pub min_learning_rate: f32,
}

impl Default for SkipGramConfig {
    fn default() -> Self {
        Self {
            dimensions: 64,
            window: 10,
            negative_samples: 5,
            epochs: 1,
            learning_rate: 0.025,
            min_learning_rate: 0.0001,
        }
    }
}

/// Skip-gram model with separate input (output embedding) and context matrices.
pub struct SkipGram {
    input: Array2<f32>,
    context: Array2<f32>,
    config: SkipGramConfig,
    current_lr: f32,
    processed: usize,
    total: usize,
}

impl SkipGram {
    /// Create a model with small random input vectors and zeroed context vectors.
    pub fn new<R: Rng + ?Sized>(num_nodes: usize, config: SkipGramConfig, rng: &mut R) -> Self {
        let dim = config.dimensions;
        let bound = 0.5 / dim as f32;
        let dist = Uniform::new(-bound, bound);
        let input = Array2::from_shape_fn((num_nodes, dim), |_| dist.sample(rng));
        let context = Array2::zeros((num_nodes, dim));

        Self {
            input,
            context,
            current_lr: config.learning_rate,
            config,
            processed: 0,
            total: 0,
        }
    }

    /// Train over the full corpus for the configured number of epochs.
    pub fn train<R: Rng + ?Sized>(&mut self, walks: &[Vec<u32>], rng: &mut R) {
        let num_nodes = self.input.nrows();
        if num_nodes == 0 || walks.is_empty() {
            return;
        }

        let mut frequencies = vec![0u64; num_nodes];
        for walk in walks {
            for &node in walk {
                frequencies[node as usize] += 1;
            }
        }
        let negatives = WeightedIndex::new(
            frequencies
                .iter()
                .map(|&f| (f as f64).powf(0.75))
                .map(|w| w.max(1e-12)),
        )
        .ok();

        let corpus_len: usize = walks.iter().map(|w| w.len()).sum();
        self.total = corpus_len * self.config.epochs.max(1);
        self.processed = 0;

        for epoch in 0..self.config.epochs.max(1) {
            for walk in walks {
                self.train_walk(walk, negatives.as_ref(), rng);
            }
            debug!(epoch, lr = self.current_lr, "skip-gram epoch complete");
        }
    }

    fn train_walk<R: Rng + ?Sized>(
        &mut self,
        walk: &[u32],
        negatives: Option<&WeightedIndex<f64>>,
        rng: &mut R,
    ) {
        let dim = self.config.dimensions;
        let mut gradient = Array1::<f32>::zeros(dim);

        for (pos, &center) in walk.iter().enumerate() {
            // Dynamic window, as in word2vec
            let reach = rng.gen_range(1..=self.config.window.max(1));
            let start = pos.saturating_sub(reach);
            let end = (pos + reach + 1).min(walk.len());

            for (ctx_pos, &ctx) in walk.iter().enumerate().take(end).skip(start) {
                if ctx_pos == pos {
                    continue;
                }

                gradient.fill(0.0);
                self.update(center as usize, ctx as usize, 1.0, &mut gradient);

                if let Some(dist) = negatives {
                    for _ in 0..self.config.negative_samples {
                        let neg = dist.sample(rng);
                        if neg == center as usize {
                            continue;
                        }
                        self.update(neg, ctx as usize, 0.0, &mut gradient);
                    }
                }

                self.input.row_mut(ctx as usize).scaled_add(1.0, &gradient);
            }

            self.processed += 1;
            self.decay_learning_rate();
        }
    }

    /// One SGNS step for (target, source): accumulates the source gradient and
    /// updates the target's context vector in place.
    fn update(&mut self, target: usize, source: usize, label: f32, gradient: &mut Array1<f32>) {
        let dot = self.input.row(source).dot(&self.context.row(target));
        let g = (label - sigmoid(dot)) * self.current_lr;
        gradient.scaled_add(g, &self.context.row(target));
        self.context.row_mut(target).scaled_add(g, &self.input.row(source));
    }

    fn decay_learning_rate(&mut self) {
        if self.total == 0 {
            return;
        }
        let progress = self.processed as f32 / self.total as f32;
        self.current_lr = (self.config.learning_rate
            - (self.config.learning_rate - self.config.min_learning_rate) * progress)
            .max(self.config.min_learning_rate);
    }

    /// Learned vector for a node.
    pub fn embedding(&self, node: usize) -> Vec<f32> {
        self.input.row(node).to_vec()
    }
}

fn sigmoid(x: f32) -> f32 {
    if x > 6.0 {
        1.0
    } else if x < -6.0 {
        0.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

/// Full node2vec configuration: walk parameters plus skip-gram parameters.
#[derive(Debug, Clone, Default)]
pub struct Node2VecConfig {
    pub walks: WalkConfig,
    pub skipgram: SkipGramConfig,
}

/// Train node2vec embeddings for every node of `view`.
///
/// Returns one vector per dense index (`view.index_to_node[i]` owns row `i`).
pub fn node2vec(
    view: &GraphView,
    config: &Node2VecConfig,
    seed: u64,
) -> Node2VecResult<Vec<Vec<f32>>> {
    if view.node_count == 0 {
        return Err(Node2VecError::EmptyGraph);
    }
    if config.skipgram.dimensions == 0 {
        return Err(Node2VecError::InvalidConfig("dimensions must be positive".to_string()));
    }

    let walks = generate_walks(view, &config.walks, seed)?;
    debug!(nodes = view.node_count, walks = walks.len(), "generated node2vec corpus");

    let mut rng = StdRng::seed_from_u64(seed.rotate_left(17) ^ 0x5EED);
    let mut model = SkipGram::new(view.node_count, config.skipgram.clone(), &mut rng);
    model.train(&walks, &mut rng);

    Ok((0..view.node_count).map(|idx| model.embedding(idx)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(dimensions: usize) -> Node2VecConfig {
        Node2VecConfig {
            walks: WalkConfig { walk_length: 10, num_walks: 20, workers: 2, ..Default::default() },
            skipgram: SkipGramConfig { dimensions, window: 3, ..Default::default() },
        }
    }

    fn two_triangles() -> GraphView {
        let edges = [("a", "b"), ("b", "c"), ("c", "a"), ("x", "y"), ("y", "z"), ("z", "x")];
        GraphView::undirected(
            Vec::new(),
            edges.iter().map(|(s, t)| (s.to_string(), t.to_string())),
        )
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (na * nb)
    }

    #[test]
    fn test_embedding_shape() {
        let view = two_triangles();
        let vectors = node2vec(&view, &small_config(16), 42).unwrap();
        assert_eq!(vectors.len(), 6);
        assert!(vectors.iter().all(|v| v.len() == 16));
        assert!(vectors.iter().flatten().all(|x| x.is_finite()));
    }

    #[test]
    fn test_deterministic_for_seed() {
        let view = two_triangles();
        let a = node2vec(&view, &small_config(8), 5).unwrap();
        let b = node2vec(&view, &small_config(8), 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_component_is_closer() {
        let view = two_triangles();
        let mut config = small_config(16);
        config.walks.num_walks = 60;
        config.skipgram.epochs = 3;
        let vectors = node2vec(&view, &config, 11).unwrap();

        let idx = |id: &str| view.node_to_index[id];
        let within = cosine(&vectors[idx("a")], &vectors[idx("b")]);
        let across = cosine(&vectors[idx("a")], &vectors[idx("x")]);
        assert!(within > across);
    }

    #[test]
    fn test_empty_graph_rejected() {
        let view = GraphView::undirected(Vec::new(), Vec::new());
        assert!(matches!(
            node2vec(&view, &small_config(8), 0),
            Err(Node2VecError::EmptyGraph)
        ));
    }
}
