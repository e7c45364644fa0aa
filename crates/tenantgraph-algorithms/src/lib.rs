pub mod common;
pub mod community;
pub mod centrality;
pub mod walk;
pub mod skipgram;

pub use common::{GraphView, NodeId};
pub use community::{connected_components, ComponentsResult};
pub use centrality::degree_centrality;
pub use walk::{biased_walk, generate_walks, WalkConfig, WalkError};
pub use skipgram::{node2vec, Node2VecConfig, Node2VecError, SkipGram, SkipGramConfig};
