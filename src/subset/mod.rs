//! Predicate-based subset selection with dependency closure
//!
//! A [`SubsetFilter`] names nodes by id, type pattern, label or resource
//! group. [`SubsetSelector::apply`] unions the matches, closes them over
//! outgoing references (except resource-group matches) and returns the
//! induced subgraph.

pub mod filter;
pub mod pattern;
pub mod selector;

pub use filter::{SubsetError, SubsetFilter, SubsetResult};
pub use pattern::TypePattern;
pub use selector::SubsetSelector;
