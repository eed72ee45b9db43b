//! Node storage and world-transform propagation.
//!
//! The hierarchy is the shared substrate of the animation pipeline: poses
//! write node-local transforms, the propagation pass derives world
//! transforms top-down, and IK solvers re-propagate the sub-chains they
//! mutate. Propagation is unconditional: world transforms are derived
//! state, recomputed from local state on every pass.
//!
//! The traversal uses an explicit stack rather than recursion so deep
//! hierarchies cannot overflow the call stack.

use slotmap::SlotMap;

use crate::scene::NodeHandle;
use crate::scene::node::Node;
use crate::scene::transform::TransformData;

/// A tree of scene nodes with stable handles.
#[derive(Debug, Default)]
pub struct Hierarchy {
    nodes: SlotMap<NodeHandle, Node>,
    roots: Vec<NodeHandle>,
}

impl Hierarchy {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
        }
    }

    /// Adds a node with no parent.
    pub fn add_root(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.roots.push(handle);
        handle
    }

    /// Adds a node under `parent`. Falls back to a root node when the parent
    /// handle is stale.
    pub fn add_child(&mut self, parent: NodeHandle, node: Node) -> NodeHandle {
        if !self.nodes.contains_key(parent) {
            log::warn!("add_child: parent {parent:?} missing, inserting as root");
            return self.add_root(node);
        }
        let handle = self.nodes.insert(node);
        self.nodes[parent].children.push(handle);
        self.nodes[handle].parent = Some(parent);
        handle
    }

    /// Re-parents `child` under `new_parent` (or to the root set for `None`),
    /// keeping both sides of the link in sync.
    pub fn attach(&mut self, child: NodeHandle, new_parent: Option<NodeHandle>) {
        if !self.nodes.contains_key(child) {
            return;
        }
        if let Some(p) = new_parent {
            if !self.nodes.contains_key(p) {
                log::warn!("attach: new parent {p:?} missing, leaving {child:?} in place");
                return;
            }
            if p == child || self.is_descendant_of(p, child) {
                log::warn!("attach: {p:?} is within {child:?}'s subtree, refusing to form a cycle");
                return;
            }
        }

        self.unlink(child);
        self.nodes[child].parent = new_parent;
        match new_parent {
            Some(p) => self.nodes[p].children.push(child),
            None => self.roots.push(child),
        }
    }

    /// Removes a node and its whole subtree. Handles into the removed
    /// subtree become stale; consumers holding them (IK chains, rigs) are
    /// expected to fail soft on lookup.
    pub fn remove_subtree(&mut self, handle: NodeHandle) {
        if !self.nodes.contains_key(handle) {
            return;
        }
        self.unlink(handle);

        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            if let Some(node) = self.nodes.remove(h) {
                stack.extend(node.children);
            }
        }
    }

    /// True when `node` sits anywhere below `ancestor`.
    fn is_descendant_of(&self, node: NodeHandle, ancestor: NodeHandle) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(handle).and_then(|n| n.parent);
        }
        false
    }

    /// Detaches `handle` from its parent's child list or the root list,
    /// leaving `handle.parent` untouched.
    fn unlink(&mut self, handle: NodeHandle) {
        match self.nodes[handle].parent {
            Some(p) => {
                if let Some(parent) = self.nodes.get_mut(p) {
                    parent.children.retain(|&c| c != handle);
                }
            }
            None => self.roots.retain(|&r| r != handle),
        }
    }

    #[inline]
    #[must_use]
    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    #[must_use]
    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[NodeHandle] {
        &self.roots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recomputes every node's world transform top-down from the roots.
    ///
    /// Called once per frame after poses have been applied to local
    /// transforms and before skinning or IK runs.
    pub fn update_world_transforms(&mut self) {
        // Work stack: (node, parent world)
        let mut stack: Vec<(NodeHandle, TransformData)> = Vec::with_capacity(64);
        for &root in self.roots.iter().rev() {
            stack.push((root, TransformData::IDENTITY));
        }
        self.propagate(stack);
    }

    /// Recomputes world transforms for `handle` and all its descendants,
    /// reading the parent's current world transform as the starting point.
    ///
    /// IK solvers call this after mutating local rotations so that nodes
    /// below the chain (and side branches off it) stay consistent.
    pub fn propagate_subtree(&mut self, handle: NodeHandle) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        let parent_world = node
            .parent
            .and_then(|p| self.nodes.get(p))
            .map_or(TransformData::IDENTITY, |p| p.transform.world);

        self.propagate(vec![(handle, parent_world)]);
    }

    fn propagate(&mut self, mut stack: Vec<(NodeHandle, TransformData)>) {
        while let Some((handle, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };
            let world = TransformData::concatenate(&node.transform.local, &parent_world);
            node.transform.world = world;
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }
}
