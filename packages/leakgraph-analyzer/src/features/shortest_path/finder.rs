//! Shortest strong path search
//!
//! Breadth-first over strong references from every traversable GC root. Two
//! priorities share one queue: clean edges always drain before edges that
//! matched an exclusion, so an excluded path is only returned when no clean
//! path to the target exists.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::domain::{LeakPathNode, PathArena, PathNodeId, ShortestPathResult};
use crate::errors::{AnalyzerError, Result};
use crate::features::exclusions::{ExcludedRefs, Exclusion};
use crate::features::leak_trace::{LeakReference, ReferenceKind};
use crate::shared::constants::{REFERENCE_CLASS, REFERENT_FIELD, STATIC_OVERHEAD_FIELD};
use crate::shared::models::{
    ArrayInstance, ClassInstance, ClassObj, HeapGraph, HeapObject, ObjectId, RootKind, ValueType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Priority {
    Clean,
    Excluded,
}

/// Queue key; `sequence` keeps FIFO order within a priority
type QueueKey = Reverse<(Priority, u64, PathNodeId)>;

/// Label of the edge being enqueued, rendered only once the child is kept
enum Edge<'g> {
    Field(ReferenceKind, &'g str),
    ArrayEntry(usize),
    Local,
}

impl Edge<'_> {
    fn into_reference(self, value: String) -> LeakReference {
        match self {
            Edge::Field(kind, name) => LeakReference::new(kind, name, value),
            Edge::ArrayEntry(index) => {
                LeakReference::new(ReferenceKind::ArrayEntry, index.to_string(), value)
            }
            Edge::Local => LeakReference::local(),
        }
    }
}

/// Finds the shortest strong path from a GC root to one object
pub struct ShortestPathFinder<'a> {
    excluded_refs: &'a ExcludedRefs,
}

impl<'a> ShortestPathFinder<'a> {
    pub fn new(excluded_refs: &'a ExcludedRefs) -> Self {
        Self { excluded_refs }
    }

    pub fn find_path(&self, graph: &HeapGraph, target: ObjectId) -> Result<ShortestPathResult> {
        let target_object = graph.object(target)?;
        let mut search = Search {
            graph,
            excluded_refs: self.excluded_refs,
            target,
            can_ignore_strings: !graph.is_string(target_object),
            arena: PathArena::new(),
            queue: BinaryHeap::new(),
            sequence: 0,
            to_visit: FxHashSet::default(),
            to_visit_if_no_path: FxHashSet::default(),
            visited: FxHashSet::default(),
        };

        search.enqueue_gc_roots();
        debug!(
            "Shortest path search for {} starting from {} queued roots",
            target,
            search.queue.len()
        );

        let mut excluding_known_leaks = false;
        let mut leaking_node = None;
        while let Some(Reverse((priority, _, node_id))) = search.queue.pop() {
            let node = search.arena.get(node_id);
            if priority == Priority::Excluded {
                if node.exclusion.is_none() {
                    return Err(AnalyzerError::traversal(format!(
                        "node {} was queued as excluded without an exclusion",
                        node.object
                    )));
                }
                excluding_known_leaks = true;
            }

            if node.object == target {
                leaking_node = Some(node_id);
                break;
            }

            let object_id = node.object;
            if !search.visited.insert(object_id) {
                continue;
            }

            match graph.object(object_id)? {
                HeapObject::Class(class) => search.visit_class(node_id, class),
                HeapObject::Instance(instance) => search.visit_instance(node_id, instance)?,
                HeapObject::Array(array) => search.visit_array(node_id, array),
            }
        }

        debug!(
            "Shortest path search visited {} objects, found={}, excluding_known_leaks={}",
            search.visited.len(),
            leaking_node.is_some(),
            excluding_known_leaks
        );

        Ok(ShortestPathResult {
            arena: search.arena,
            leaking_node,
            excluding_known_leaks,
        })
    }
}

struct Search<'g> {
    graph: &'g HeapGraph,
    excluded_refs: &'g ExcludedRefs,
    target: ObjectId,
    can_ignore_strings: bool,
    arena: PathArena,
    queue: BinaryHeap<QueueKey>,
    sequence: u64,
    to_visit: FxHashSet<ObjectId>,
    to_visit_if_no_path: FxHashSet<ObjectId>,
    visited: FxHashSet<ObjectId>,
}

impl<'g> Search<'g> {
    fn enqueue_gc_roots(&mut self) {
        let graph = self.graph;
        let excluded_refs = self.excluded_refs;
        for root in graph.roots() {
            match root.kind {
                RootKind::JavaLocal => {
                    let exclusion = root
                        .thread
                        .and_then(|thread| graph.thread_name(thread))
                        .and_then(|name| excluded_refs.thread(&name));
                    if exclusion.map_or(false, |e| e.always_exclude) {
                        continue;
                    }
                    // Locals hang off their thread so the trace shows who holds them.
                    let holder = root.thread.map(|thread| {
                        self.arena.push(LeakPathNode {
                            object: thread,
                            reference: None,
                            parent: None,
                            exclusion: None,
                        })
                    });
                    let edge = holder.map(|_| Edge::Local);
                    self.enqueue(exclusion, holder, root.object, edge);
                }
                kind if kind.is_traversable() => self.enqueue(None, None, root.object, None),
                _ => {}
            }
        }
    }

    fn visit_class(&mut self, parent: PathNodeId, class: &'g ClassObj) {
        let excluded_refs = self.excluded_refs;
        for field in &class.static_fields {
            if field.name == STATIC_OVERHEAD_FIELD {
                continue;
            }
            let Some(child) = field.value.as_object() else {
                continue;
            };
            let exclusion = excluded_refs.static_field(&class.name, &field.name);
            self.enqueue(
                exclusion,
                Some(parent),
                child,
                Some(Edge::Field(ReferenceKind::StaticField, &field.name)),
            );
        }
    }

    fn visit_instance(&mut self, parent: PathNodeId, instance: &'g ClassInstance) -> Result<()> {
        let graph = self.graph;
        let excluded_refs = self.excluded_refs;
        let class = graph.class(instance.class_id).ok_or_else(|| {
            AnalyzerError::traversal(format!(
                "instance {} has no class {}",
                instance.id, instance.class_id
            ))
        })?;

        let mut field_exclusions: FxHashMap<&str, &Exclusion> = FxHashMap::default();
        let mut class_exclusion: Option<&Exclusion> = None;
        let mut is_reference = false;
        for ancestor in graph.class_chain(class) {
            if let Some(exclusion) = excluded_refs.class(&ancestor.name) {
                if class_exclusion.map_or(true, |current| !current.always_exclude) {
                    class_exclusion = Some(exclusion);
                }
            }
            if let Some(fields) = excluded_refs.instance_fields(&ancestor.name) {
                for (name, exclusion) in fields {
                    field_exclusions.insert(name.as_str(), exclusion);
                }
            }
            if ancestor.name == REFERENCE_CLASS {
                is_reference = true;
            }
        }

        if class_exclusion.map_or(false, |e| e.always_exclude) {
            return Ok(());
        }

        for field in &instance.fields {
            if is_reference && field.name == REFERENT_FIELD {
                continue;
            }
            let Some(child) = field.value.as_object() else {
                continue;
            };
            let mut exclusion = class_exclusion;
            if let Some(&field_exclusion) = field_exclusions.get(field.name.as_str()) {
                let overrides = match exclusion {
                    None => true,
                    Some(current) => field_exclusion.always_exclude && !current.always_exclude,
                };
                if overrides {
                    exclusion = Some(field_exclusion);
                }
            }
            self.enqueue(
                exclusion,
                Some(parent),
                child,
                Some(Edge::Field(ReferenceKind::InstanceField, &field.name)),
            );
        }
        Ok(())
    }

    fn visit_array(&mut self, parent: PathNodeId, array: &'g ArrayInstance) {
        if array.element_type != ValueType::Object {
            return;
        }
        for (index, element) in array.elements.iter().enumerate() {
            if let Some(child) = element.as_object() {
                self.enqueue(None, Some(parent), child, Some(Edge::ArrayEntry(index)));
            }
        }
    }

    fn enqueue(
        &mut self,
        exclusion: Option<&Exclusion>,
        parent: Option<PathNodeId>,
        child: ObjectId,
        edge: Option<Edge<'_>>,
    ) {
        // Dangling references are not edges.
        let Some(object) = self.graph.get(child) else {
            return;
        };
        if child != self.target
            && (self.graph.is_primitive_wrapper(object)
                || self.graph.is_primitive_or_wrapper_array(object))
        {
            return;
        }
        if self.to_visit.contains(&child) {
            return;
        }
        if exclusion.map_or(false, |e| e.always_exclude) {
            return;
        }
        let priority = match exclusion {
            None => Priority::Clean,
            Some(_) => Priority::Excluded,
        };
        if priority == Priority::Excluded && self.to_visit_if_no_path.contains(&child) {
            return;
        }
        if self.can_ignore_strings && self.graph.is_string(object) {
            return;
        }
        if self.visited.contains(&child) {
            return;
        }

        let reference = edge.map(|edge| edge.into_reference(self.graph.describe(object)));
        let node_id = self.arena.push(LeakPathNode {
            object: child,
            reference,
            parent,
            exclusion: exclusion.cloned(),
        });
        match priority {
            Priority::Clean => self.to_visit.insert(child),
            Priority::Excluded => self.to_visit_if_no_path.insert(child),
        };
        self.sequence += 1;
        self.queue.push(Reverse((priority, self.sequence, node_id)));
    }
}
