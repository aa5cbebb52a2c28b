//! Shortest path from the GC roots to the leaking instance

pub mod domain;
pub mod finder;

pub use domain::{LeakPathNode, PathArena, PathNodeId, ShortestPathResult};
pub use finder::ShortestPathFinder;
