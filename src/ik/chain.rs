//! IK chain description and path resolution.

use log::warn;
use smallvec::SmallVec;

use crate::scene::{Hierarchy, NodeHandle};

/// Joint handles from chain root to end effector, root first.
///
/// Inline capacity covers typical limb and spine chains without heap
/// allocation.
pub(crate) type ChainPath = SmallVec<[NodeHandle; 8]>;

/// The joints a solver works on, plus the target it reaches for.
///
/// `root` must be an ancestor of `end_effector` (or the same node); the
/// solved chain is the hierarchy path between them, inclusive. `target`
/// is an ordinary scene node, so targets can themselves be animated or
/// parented anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IkChain {
    pub root: NodeHandle,
    pub end_effector: NodeHandle,
    pub target: NodeHandle,
}

impl IkChain {
    #[must_use]
    pub fn new(root: NodeHandle, end_effector: NodeHandle, target: NodeHandle) -> Self {
        Self {
            root,
            end_effector,
            target,
        }
    }

    /// Walks parent links from the end effector up to the chain root and
    /// returns the path in root-first order.
    ///
    /// Returns `None` (with a warning) when the target is gone, a handle
    /// on the path is stale, or `root` is not an ancestor of the end
    /// effector. Solvers treat that as a failed solve rather than a
    /// panic, since handles go stale whenever a subtree is removed.
    pub(crate) fn resolve_path(&self, hierarchy: &Hierarchy) -> Option<ChainPath> {
        if !hierarchy.contains(self.target) {
            warn!("ik target {:?} is not in the hierarchy", self.target);
            return None;
        }

        let mut path = ChainPath::new();
        let mut current = Some(self.end_effector);
        while let Some(handle) = current {
            let Some(node) = hierarchy.node(handle) else {
                warn!("ik chain node {handle:?} is not in the hierarchy");
                return None;
            };
            path.push(handle);
            if handle == self.root {
                path.reverse();
                return Some(path);
            }
            current = node.parent();
        }

        warn!(
            "ik chain root {:?} is not an ancestor of end effector {:?}",
            self.root, self.end_effector
        );
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
