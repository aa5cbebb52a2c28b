//! Dominator tree over the heap graph
//!
//! The flow graph is rooted at a synthetic sentinel with one vertex per GC
//! root below it. Objects held directly by an `unknown` (native) root lose
//! their incoming object edges, so the native root is their immediate
//! dominator and native allocations are attributed to the native side.

use std::collections::VecDeque;

use petgraph::algo::dominators::simple_fast;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::shared::constants::{REFERENCE_CLASS, REFERENT_FIELD, STATIC_OVERHEAD_FIELD};
use crate::shared::models::{HeapGraph, HeapObject, ObjectId, RootKind, ValueType};

/// Immediate dominator of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominator {
    /// Synthetic vertex above every root
    Sentinel,
    /// A GC root entry
    Root { kind: RootKind, object: ObjectId },
    Object(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vertex {
    Sentinel,
    Root(usize),
    Object(ObjectId),
}

/// Dominator tree, retained sizes and shortest managed paths to a root
#[derive(Debug, Clone, Default)]
pub struct DominatorTree {
    immediate_dominators: FxHashMap<ObjectId, Dominator>,
    retained_sizes: FxHashMap<ObjectId, u64>,
    next_to_gc_root: FxHashMap<ObjectId, ObjectId>,
}

impl DominatorTree {
    /// `None` when the object is not reachable from any root
    pub fn immediate_dominator(&self, object: ObjectId) -> Option<Dominator> {
        self.immediate_dominators.get(&object).copied()
    }

    /// Shallow sizes summed over the dominator subtree of `object`
    pub fn retained_size(&self, object: ObjectId) -> Option<u64> {
        self.retained_sizes.get(&object).copied()
    }

    /// Referrer one step closer to a traversable GC root on the shortest
    /// strong path; `None` for directly rooted or unreachable objects
    pub fn next_instance_to_gc_root(&self, object: ObjectId) -> Option<ObjectId> {
        self.next_to_gc_root.get(&object).copied()
    }

    pub fn reachable_count(&self) -> usize {
        self.immediate_dominators.len()
    }
}

/// Strong outgoing references of one object
///
/// `is_reference` caches, per class, whether the class extends
/// `java.lang.ref.Reference`.
fn strong_references(
    graph: &HeapGraph,
    object: &HeapObject,
    is_reference: &mut FxHashMap<ObjectId, bool>,
) -> Vec<ObjectId> {
    match object {
        HeapObject::Class(class) => class
            .static_fields
            .iter()
            .filter(|field| field.name != STATIC_OVERHEAD_FIELD)
            .filter_map(|field| field.value.as_object())
            .collect(),
        HeapObject::Instance(instance) => {
            let weak = *is_reference.entry(instance.class_id).or_insert_with(|| {
                graph
                    .class(instance.class_id)
                    .map_or(false, |class| graph.extends(class, REFERENCE_CLASS))
            });
            instance
                .fields
                .iter()
                .filter(|field| !(weak && field.name == REFERENT_FIELD))
                .filter_map(|field| field.value.as_object())
                .collect()
        }
        HeapObject::Array(array) if array.element_type == ValueType::Object => array
            .elements
            .iter()
            .filter_map(|value| value.as_object())
            .collect(),
        HeapObject::Array(_) => Vec::new(),
    }
}

impl DominatorTree {
    pub fn compute(graph: &HeapGraph) -> Self {
        let mut flow: DiGraph<Vertex, ()> = DiGraph::new();
        let sentinel = flow.add_node(Vertex::Sentinel);

        let mut node_of: FxHashMap<ObjectId, NodeIndex> = FxHashMap::default();
        node_of.reserve(graph.object_count());
        for object in graph.objects() {
            node_of.insert(object.id(), flow.add_node(Vertex::Object(object.id())));
        }

        let mut native_held: FxHashSet<ObjectId> = FxHashSet::default();
        for (index, root) in graph.roots().iter().enumerate() {
            let Some(&target) = node_of.get(&root.object) else {
                continue;
            };
            let vertex = flow.add_node(Vertex::Root(index));
            flow.add_edge(sentinel, vertex, ());
            flow.add_edge(vertex, target, ());
            if root.kind == RootKind::Unknown {
                native_held.insert(root.object);
            }
        }

        let mut is_reference = FxHashMap::default();
        let mut adjacency: FxHashMap<ObjectId, Vec<ObjectId>> = FxHashMap::default();
        for object in graph.objects() {
            let from = node_of[&object.id()];
            let children = strong_references(graph, object, &mut is_reference);
            for child in &children {
                if native_held.contains(child) {
                    continue;
                }
                if let Some(&to) = node_of.get(child) {
                    flow.add_edge(from, to, ());
                }
            }
            adjacency.insert(object.id(), children);
        }

        let dominators = simple_fast(&flow, sentinel);

        let mut children: Vec<Vec<NodeIndex>> = vec![Vec::new(); flow.node_count()];
        let mut immediate_dominators = FxHashMap::default();
        for node in flow.node_indices() {
            let Some(idom) = dominators.immediate_dominator(node) else {
                continue;
            };
            children[idom.index()].push(node);
            if let Vertex::Object(id) = flow[node] {
                let dominator = match flow[idom] {
                    Vertex::Sentinel => Dominator::Sentinel,
                    Vertex::Root(index) => {
                        let root = &graph.roots()[index];
                        Dominator::Root {
                            kind: root.kind,
                            object: root.object,
                        }
                    }
                    Vertex::Object(object) => Dominator::Object(object),
                };
                immediate_dominators.insert(id, dominator);
            }
        }

        // Breadth-first order puts every dominator before its subtree;
        // summing in reverse accumulates subtrees bottom-up.
        let mut order = Vec::with_capacity(flow.node_count());
        let mut queue = VecDeque::from([sentinel]);
        while let Some(node) = queue.pop_front() {
            order.push(node);
            queue.extend(children[node.index()].iter().copied());
        }
        let mut totals = vec![0u64; flow.node_count()];
        for &node in &order {
            if let Vertex::Object(id) = flow[node] {
                totals[node.index()] = graph.get(id).map_or(0, HeapObject::shallow_size);
            }
        }
        for &node in order.iter().rev() {
            if let Some(idom) = dominators.immediate_dominator(node) {
                totals[idom.index()] += totals[node.index()];
            }
        }
        let retained_sizes = order
            .iter()
            .filter_map(|&node| match flow[node] {
                Vertex::Object(id) => Some((id, totals[node.index()])),
                _ => None,
            })
            .collect();

        let next_to_gc_root = shortest_managed_parents(graph, &adjacency);

        debug!(
            "Dominator tree over {} vertices, {} objects reachable",
            flow.node_count(),
            immediate_dominators.len()
        );

        Self {
            immediate_dominators,
            retained_sizes,
            next_to_gc_root,
        }
    }
}

/// BFS parents over strong edges from every traversable root
fn shortest_managed_parents(
    graph: &HeapGraph,
    adjacency: &FxHashMap<ObjectId, Vec<ObjectId>>,
) -> FxHashMap<ObjectId, ObjectId> {
    let mut parents = FxHashMap::default();
    let mut seen: FxHashSet<ObjectId> = FxHashSet::default();
    let mut queue = VecDeque::new();
    for root in graph.roots() {
        if root.kind.is_traversable() && seen.insert(root.object) {
            queue.push_back(root.object);
        }
    }
    while let Some(object) = queue.pop_front() {
        for &child in adjacency.get(&object).into_iter().flatten() {
            if graph.get(child).is_some() && seen.insert(child) {
                parents.insert(child, object);
                queue.push_back(child);
            }
        }
    }
    parents
}

impl HeapGraph {
    /// Compute and cache the dominator tree; later calls reuse the cache
    pub fn compute_dominators(&mut self) -> &DominatorTree {
        if self.dominators.is_none() {
            self.dominators = Some(DominatorTree::compute(self));
        }
        self.dominators.get_or_insert_with(DominatorTree::default)
    }

    pub fn dominators(&self) -> Option<&DominatorTree> {
        self.dominators.as_ref()
    }
}
