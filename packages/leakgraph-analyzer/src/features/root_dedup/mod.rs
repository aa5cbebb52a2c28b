//! GC Root Deduplication
//!
//! Some runtime versions emit the same root many times for one object, which
//! multiplies the fan-out of the shortest path search. Roots are collapsed to
//! one entry per `<root-kind>@0x%08x` key, first occurrence wins.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::shared::models::{GcRoot, HeapGraph};

/// Collapse duplicate roots in place; returns how many were removed
pub fn deduplicate_gc_roots(graph: &mut HeapGraph) -> usize {
    deduplicate_roots(graph.roots_mut())
}

/// Keep the first root for every `(kind, object)` key, preserving order
pub fn deduplicate_roots(roots: &mut Vec<GcRoot>) -> usize {
    let before = roots.len();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    seen.reserve(before);
    roots.retain(|root| seen.insert(root.key()));

    let removed = before - roots.len();
    if removed > 0 {
        debug!("Pruned {} duplicate GC roots ({} left)", removed, roots.len());
    }
    removed
}
