//! Importance scores derived from embeddings

use super::Embeddings;
use std::collections::HashMap;
use tenantgraph_algorithms::{degree_centrality, GraphView};

const MAGNITUDE_WEIGHT: f64 = 0.7;
const CENTRALITY_WEIGHT: f64 = 0.3;

/// Score every embedded node in [0, 1].
///
/// The base score is the vector magnitude divided by the largest magnitude.
/// With a graph, it becomes `0.7 * magnitude + 0.3 * degree_centrality`;
/// nodes absent from the graph get zero centrality.
pub fn get_node_importance_scores(
    embeddings: &Embeddings,
    graph: Option<&GraphView>,
) -> HashMap<String, f64> {
    let magnitudes: HashMap<&str, f64> = embeddings
        .iter()
        .map(|(id, v)| (id.as_str(), v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt()))
        .collect();
    let max = magnitudes.values().copied().fold(0.0_f64, f64::max);

    let normalized = |m: f64| if max > 0.0 { m / max } else { 0.0 };

    match graph {
        None => magnitudes
            .into_iter()
            .map(|(id, m)| (id.to_string(), normalized(m)))
            .collect(),
        Some(view) => {
            let centrality = degree_centrality(view);
            magnitudes
                .into_iter()
                .map(|(id, m)| {
                    let c = centrality.get(id).copied().unwrap_or(0.0);
                    let score = MAGNITUDE_WEIGHT * normalized(m) + CENTRALITY_WEIGHT * c;
                    (id.to_string(), score.clamp(0.0, 1.0))
                })
                .collect()
        }
    }
}
