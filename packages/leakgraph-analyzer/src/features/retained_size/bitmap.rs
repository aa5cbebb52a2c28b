//! Native bitmap correction
//!
//! Bitmap pixel buffers are held by a native root, so the dominator tree
//! charges them to that root instead of to the leaking instance that keeps
//! the bitmap alive. This pass adds them back.

use rustc_hash::FxHashSet;
use tracing::debug;

use super::dominators::{Dominator, DominatorTree};
use crate::errors::{AnalyzerError, Result};
use crate::shared::models::{HeapGraph, ObjectId, RootKind};

/// Whether `target` dominates `object` once native roots are skipped
///
/// Walks up the dominator chain; at a native root, continues from the next
/// object on the shortest managed path instead. Only true when a native
/// root was actually crossed.
fn is_ignored_dominator(tree: &DominatorTree, target: ObjectId, object: ObjectId) -> bool {
    let mut found_native_root = false;
    let mut current = object;
    let mut seen: FxHashSet<ObjectId> = FxHashSet::default();
    loop {
        if !seen.insert(current) {
            return false;
        }
        let next = match tree.immediate_dominator(current) {
            Some(Dominator::Root {
                kind: RootKind::Unknown,
                ..
            }) => {
                found_native_root = true;
                tree.next_instance_to_gc_root(current)
            }
            Some(Dominator::Object(dominator)) => Some(dominator),
            Some(Dominator::Root { .. }) | Some(Dominator::Sentinel) | None => None,
        };
        match next {
            None => return false,
            Some(next) if next == target => return found_native_root,
            Some(next) => current = next,
        }
    }
}

/// Retained bytes of bitmaps (and their buffers) kept alive by `target`
/// through a native root
///
/// Requires `HeapGraph::compute_dominators` to have run. A snapshot without
/// `bitmap_class` contributes nothing.
pub fn compute_ignored_bitmap_retained_size(
    graph: &HeapGraph,
    target: ObjectId,
    bitmap_class: &str,
    buffer_field: &str,
) -> Result<u64> {
    let tree = graph
        .dominators()
        .ok_or_else(|| AnalyzerError::traversal("dominators have not been computed"))?;
    let Some(class) = graph.find_class(bitmap_class) else {
        debug!("No {} class in snapshot, skipping bitmap correction", bitmap_class);
        return Ok(0);
    };

    let mut total = 0u64;
    let mut counted = 0usize;
    for bitmap in graph.instances_of(class.id) {
        let Some(instance) = bitmap.as_instance() else {
            continue;
        };
        if !is_ignored_dominator(tree, target, instance.id) {
            continue;
        }
        let Some(buffer) = instance.field(buffer_field).and_then(|v| v.as_object()) else {
            continue;
        };
        let buffer_size = tree.retained_size(buffer).unwrap_or(0);
        let mut size = tree.retained_size(instance.id).unwrap_or(0);
        // The buffer may be dominated elsewhere and missing from the bitmap's own size.
        if size < buffer_size {
            size += buffer_size;
        }
        total += size;
        counted += 1;
    }

    debug!(
        "Bitmap correction for {}: {} bitmaps, {} bytes",
        target, counted, total
    );
    Ok(total)
}
