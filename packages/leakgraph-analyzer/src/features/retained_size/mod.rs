//! Retained size estimation
//!
//! Dominator-based: an object retains everything it dominates. The
//! dominator tree is cached on the `HeapGraph` once computed.

pub mod bitmap;
pub mod dominators;

pub use bitmap::compute_ignored_bitmap_retained_size;
pub use dominators::{Dominator, DominatorTree};
