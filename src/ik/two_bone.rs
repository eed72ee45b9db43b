//! Closed-form two-bone IK.

use glam::Quat;
use log::{debug, warn};

use crate::ik::{SolveStatus, world_position};
use crate::scene::Hierarchy;

use super::IkChain;

/// Guard against a zero denominator when a bone has zero length.
const DENOMINATOR_EPSILON: f32 = 1e-6;

/// Analytic solver for chains of exactly two bones.
///
/// The solve is planar: the target is read as an XY offset from the
/// chain root and the two joints receive absolute local Z rotations (the
/// law-of-cosines bend at the middle joint, the aim angle at the root).
/// Bone lengths are measured from current world positions, so scaled
/// rigs keep working as long as the chain itself stays planar.
///
/// The chain must be `root -> middle -> end effector` with no extra
/// joints in between; anything else fails the solve without touching the
/// pose.
#[derive(Debug)]
pub struct TwoBoneIk {
    chain: IkChain,
    status: SolveStatus,
}

impl TwoBoneIk {
    #[must_use]
    pub fn new(chain: IkChain) -> Self {
        Self {
            chain,
            status: SolveStatus::Idle,
        }
    }

    #[inline]
    #[must_use]
    pub fn chain(&self) -> IkChain {
        self.chain
    }

    /// Replaces the chain and returns the solver to [`SolveStatus::Idle`].
    pub fn set_chain(&mut self, chain: IkChain) {
        self.chain = chain;
        self.status = SolveStatus::Idle;
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Runs the analytic solve against current world transforms.
    ///
    /// On success both joint rotations are written and the chain root's
    /// subtree is re-propagated. On failure (bad topology, missing
    /// nodes, unreachable target) the hierarchy is left exactly as it
    /// was.
    pub fn solve(&mut self, hierarchy: &mut Hierarchy) -> SolveStatus {
        self.status = SolveStatus::Processing;
        self.status = self.solve_inner(hierarchy);
        self.status
    }

    fn solve_inner(&mut self, hierarchy: &mut Hierarchy) -> SolveStatus {
        let Some(target_position) = world_position(hierarchy, self.chain.target) else {
            warn!("two-bone ik: target {:?} is gone", self.chain.target);
            return SolveStatus::Failure;
        };

        let Some(effector_node) = hierarchy.node(self.chain.end_effector) else {
            warn!(
                "two-bone ik: end effector {:?} is gone",
                self.chain.end_effector
            );
            return SolveStatus::Failure;
        };
        let effector_position = effector_node.transform.world().position;
        let Some(middle) = effector_node.parent() else {
            warn!("two-bone ik: end effector has no parent joint");
            return SolveStatus::Failure;
        };

        let Some(middle_node) = hierarchy.node(middle) else {
            warn!("two-bone ik: middle joint {middle:?} is gone");
            return SolveStatus::Failure;
        };
        let middle_position = middle_node.transform.world().position;
        if middle_node.parent() != Some(self.chain.root) {
            warn!(
                "two-bone ik: chain from {:?} to {:?} is not exactly two bones",
                self.chain.root, self.chain.end_effector
            );
            return SolveStatus::Failure;
        }

        let Some(root_position) = world_position(hierarchy, self.chain.root) else {
            warn!("two-bone ik: chain root {:?} is gone", self.chain.root);
            return SolveStatus::Failure;
        };

        let upper_len = root_position.distance(middle_position);
        let lower_len = middle_position.distance(effector_position);
        let offset = target_position - root_position;
        let (x, y) = (offset.x, offset.y);

        // Law of cosines for the bend angle at the middle joint.
        let mut denominator = 2.0 * upper_len * lower_len;
        if denominator.abs() < DENOMINATOR_EPSILON {
            denominator = DENOMINATOR_EPSILON;
        }
        let cos_bend =
            (x * x + y * y - upper_len * upper_len - lower_len * lower_len) / denominator;
        if cos_bend.abs() > 1.0 {
            debug!(
                "two-bone ik: target at distance {:.3} unreachable with bones {:.3} + {:.3}",
                offset.length(),
                upper_len,
                lower_len
            );
            return SolveStatus::Failure;
        }
        let bend = cos_bend.acos();

        // Aim the root at the target, compensating for the bend of the
        // second bone.
        let base = y.atan2(x) - (lower_len * bend.sin()).atan2(upper_len + lower_len * cos_bend);

        if let Some(node) = hierarchy.node_mut(self.chain.root) {
            node.transform.local.rotation = Quat::from_rotation_z(base);
        }
        if let Some(node) = hierarchy.node_mut(middle) {
            node.transform.local.rotation = Quat::from_rotation_z(bend);
        }
        hierarchy.propagate_subtree(self.chain.root);

        SolveStatus::Success
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Node, NodeHandle, TransformData};
    use glam::Vec3;

    const EPSILON: f32 = 1e-4;

    /// Root at the origin, two unit bones along +X, plus a target root.
    fn two_bone_rig(
        hierarchy: &mut Hierarchy,
        target_at: Vec3,
    ) -> (NodeHandle, NodeHandle, NodeHandle, NodeHandle) {
        let root = hierarchy.add_root(Node::new());
        let middle = hierarchy.add_child(root, Node::with_local(TransformData::from_position(Vec3::X)));
        let tip = hierarchy.add_child(middle, Node::with_local(TransformData::from_position(Vec3::X)));
        let target = hierarchy.add_root(Node::with_local(TransformData::from_position(target_at)));
        hierarchy.update_world_transforms();
        (root, middle, tip, target)
    }

    fn effector_world(hierarchy: &Hierarchy, tip: NodeHandle) -> Vec3 {
        hierarchy.node(tip).unwrap().transform.world().position
    }

    #[test]
    fn reaches_fully_extended_target() {
        let mut hierarchy = Hierarchy::new();
        let (root, _, tip, target) = two_bone_rig(&mut hierarchy, Vec3::new(2.0, 0.0, 0.0));

        let mut solver = TwoBoneIk::new(IkChain::new(root, tip, target));
        assert_eq!(solver.status(), SolveStatus::Idle);
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Success);
        assert!(effector_world(&hierarchy, tip).abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), EPSILON));
    }

    #[test]
    fn reaches_bent_target() {
        let mut hierarchy = Hierarchy::new();
        let (root, _, tip, target) = two_bone_rig(&mut hierarchy, Vec3::new(1.0, 1.0, 0.0));

        let mut solver = TwoBoneIk::new(IkChain::new(root, tip, target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Success);
        assert!(effector_world(&hierarchy, tip).abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), EPSILON));
    }

    #[test]
    fn reaches_target_behind_the_root() {
        let mut hierarchy = Hierarchy::new();
        let (root, _, tip, target) = two_bone_rig(&mut hierarchy, Vec3::new(-1.0, 1.0, 0.0));

        let mut solver = TwoBoneIk::new(IkChain::new(root, tip, target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Success);
        assert!(effector_world(&hierarchy, tip).abs_diff_eq(Vec3::new(-1.0, 1.0, 0.0), EPSILON));
    }

    #[test]
    fn unreachable_target_fails_without_mutation() {
        let mut hierarchy = Hierarchy::new();
        let (root, middle, tip, target) = two_bone_rig(&mut hierarchy, Vec3::new(5.0, 0.0, 0.0));

        let before_root = hierarchy.node(root).unwrap().transform.local.rotation;
        let before_middle = hierarchy.node(middle).unwrap().transform.local.rotation;

        let mut solver = TwoBoneIk::new(IkChain::new(root, tip, target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Failure);

        assert_eq!(
            hierarchy.node(root).unwrap().transform.local.rotation,
            before_root
        );
        assert_eq!(
            hierarchy.node(middle).unwrap().transform.local.rotation,
            before_middle
        );
    }

    #[test]
    fn too_close_target_fails() {
        // Equal bone lengths can always fold back to the root, but a
        // target inside |d0 - d1| is unreachable for unequal bones.
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.add_root(Node::new());
        let middle = hierarchy.add_child(
            root,
            Node::with_local(TransformData::from_position(Vec3::new(2.0, 0.0, 0.0))),
        );
        let tip = hierarchy.add_child(
            middle,
            Node::with_local(TransformData::from_position(Vec3::X)),
        );
        let target = hierarchy.add_root(Node::with_local(TransformData::from_position(
            Vec3::new(0.25, 0.0, 0.0),
        )));
        hierarchy.update_world_transforms();

        let mut solver = TwoBoneIk::new(IkChain::new(root, tip, target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Failure);
    }

    #[test]
    fn longer_chain_topology_fails() {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.add_root(Node::new());
        let a = hierarchy.add_child(root, Node::with_local(TransformData::from_position(Vec3::X)));
        let b = hierarchy.add_child(a, Node::with_local(TransformData::from_position(Vec3::X)));
        let tip = hierarchy.add_child(b, Node::with_local(TransformData::from_position(Vec3::X)));
        let target = hierarchy.add_root(Node::with_local(TransformData::from_position(Vec3::ONE)));
        hierarchy.update_world_transforms();

        let mut solver = TwoBoneIk::new(IkChain::new(root, tip, target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Failure);
    }

    #[test]
    fn resolving_again_is_stable() {
        let mut hierarchy = Hierarchy::new();
        let (root, _, tip, target) = two_bone_rig(&mut hierarchy, Vec3::new(1.2, 0.9, 0.0));

        let mut solver = TwoBoneIk::new(IkChain::new(root, tip, target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Success);
        let first = effector_world(&hierarchy, tip);

        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Success);
        let second = effector_world(&hierarchy, tip);
        assert!(first.abs_diff_eq(second, EPSILON));
    }

    #[test]
    fn set_chain_resets_status() {
        let mut hierarchy = Hierarchy::new();
        let (root, _, tip, target) = two_bone_rig(&mut hierarchy, Vec3::new(1.0, 1.0, 0.0));

        let mut solver = TwoBoneIk::new(IkChain::new(root, tip, target));
        solver.solve(&mut hierarchy);
        assert_eq!(solver.status(), SolveStatus::Success);

        solver.set_chain(IkChain::new(root, tip, target));
        assert_eq!(solver.status(), SolveStatus::Idle);
    }
}
