//! Path node arena
//!
//! Path nodes only point at their parent. The path is discovered root-first
//! and read back leak-first, so a flat arena indexed by `PathNodeId` is all
//! the structure needed.

use crate::features::exclusions::Exclusion;
use crate::features::leak_trace::LeakReference;
use crate::shared::models::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathNodeId(usize);

impl PathNodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One step of a discovered path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakPathNode {
    pub object: ObjectId,
    /// Edge from the parent to this node; `None` for a root
    pub reference: Option<LeakReference>,
    pub parent: Option<PathNodeId>,
    /// Exclusion matched on the incoming edge
    pub exclusion: Option<Exclusion>,
}

#[derive(Debug, Default)]
pub struct PathArena {
    nodes: Vec<LeakPathNode>,
}

impl PathArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: LeakPathNode) -> PathNodeId {
        self.nodes.push(node);
        PathNodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: PathNodeId) -> &LeakPathNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes from `leaf` back to its root, leaf first
    pub fn walk_to_root(&self, leaf: PathNodeId) -> impl Iterator<Item = &LeakPathNode> {
        std::iter::successors(Some(self.get(leaf)), move |node| {
            node.parent.map(|parent| self.get(parent))
        })
    }

    /// Nodes from the root down to `leaf`
    pub fn path_to(&self, leaf: PathNodeId) -> Vec<&LeakPathNode> {
        let mut path: Vec<&LeakPathNode> = self.walk_to_root(leaf).collect();
        path.reverse();
        path
    }
}

/// Outcome of one shortest path search
#[derive(Debug)]
pub struct ShortestPathResult {
    pub arena: PathArena,
    /// Last node of the path; `None` when no strong path reaches the target
    pub leaking_node: Option<PathNodeId>,
    /// Whether the returned path needed an excluded reference
    pub excluding_known_leaks: bool,
}

impl ShortestPathResult {
    pub fn path(&self) -> Vec<&LeakPathNode> {
        self.leaking_node
            .map(|leaf| self.arena.path_to(leaf))
            .unwrap_or_default()
    }

    /// Edge count of the returned path
    pub fn path_length(&self) -> Option<usize> {
        self.leaking_node
            .map(|leaf| self.arena.walk_to_root(leaf).count() - 1)
    }
}
