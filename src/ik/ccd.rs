//! Cyclic coordinate descent IK.

use log::{debug, warn};

use crate::ik::{SolveStatus, aim_delta, refresh_chain_worlds, world_position};
use crate::scene::Hierarchy;

use super::IkChain;

/// Iteration budget and convergence criterion for [`CcdSolver`].
#[derive(Debug, Clone, Copy)]
pub struct CcdSettings {
    pub max_iterations: u32,
    /// World-space distance at which the effector counts as on target.
    pub tolerance: f32,
}

impl Default for CcdSettings {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            tolerance: 1e-3,
        }
    }
}

/// Iterative solver for chains of any length.
///
/// Each sweep walks from the joint nearest the end effector up to the
/// chain root, rotating every joint so the effector swings toward the
/// target, and re-propagating the downstream chain before moving on.
/// Convergence is checked before each sweep, so a solve that starts on
/// target mutates nothing and re-running a converged solve is a no-op.
///
/// Running out of iterations reports [`SolveStatus::Failure`] but keeps
/// the progress made: the chain stays bent toward the target rather than
/// snapping back.
#[derive(Debug)]
pub struct CcdSolver {
    chain: IkChain,
    pub settings: CcdSettings,
    status: SolveStatus,
}

impl CcdSolver {
    #[must_use]
    pub fn new(chain: IkChain) -> Self {
        Self::with_settings(chain, CcdSettings::default())
    }

    #[must_use]
    pub fn with_settings(chain: IkChain, settings: CcdSettings) -> Self {
        Self {
            chain,
            settings,
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

    /// Runs up to `max_iterations` sweeps against current world
    /// transforms.
    pub fn solve(&mut self, hierarchy: &mut Hierarchy) -> SolveStatus {
        self.status = SolveStatus::Processing;
        self.status = self.solve_inner(hierarchy);
        self.status
    }

    fn solve_inner(&mut self, hierarchy: &mut Hierarchy) -> SolveStatus {
        let Some(path) = self.chain.resolve_path(hierarchy) else {
            return SolveStatus::Failure;
        };
        if path.len() < 2 {
            warn!("ccd: chain needs at least one bone");
            return SolveStatus::Failure;
        }
        let Some(target_position) = world_position(hierarchy, self.chain.target) else {
            return SolveStatus::Failure;
        };

        let tolerance_sq = self.settings.tolerance * self.settings.tolerance;
        let mut touched = false;

        for _ in 0..self.settings.max_iterations {
            // Check before sweeping: a chain already on target stays
            // untouched.
            if let Some(effector) = world_position(hierarchy, self.chain.end_effector) {
                if effector.distance_squared(target_position) <= tolerance_sq {
                    if touched {
                        hierarchy.propagate_subtree(self.chain.root);
                    }
                    return SolveStatus::Success;
                }
            }

            // Sweep from the effector's parent up to the root. The
            // effector joint itself never rotates; spinning it cannot
            // move its own position.
            for joint_index in (0..path.len() - 1).rev() {
                let joint = path[joint_index];
                let (Some(joint_position), Some(effector_position)) = (
                    world_position(hierarchy, joint),
                    world_position(hierarchy, self.chain.end_effector),
                ) else {
                    continue;
                };

                let Some(delta) = aim_delta(
                    effector_position - joint_position,
                    target_position - joint_position,
                ) else {
                    continue;
                };

                if let Some(node) = hierarchy.node_mut(joint) {
                    node.transform.local.rotation =
                        (delta * node.transform.local.rotation).normalize();
                }
                // Downstream joints must see the new orientation before
                // the next joint measures the effector.
                refresh_chain_worlds(hierarchy, &path[joint_index..]);
                touched = true;
            }
        }

        let converged = world_position(hierarchy, self.chain.end_effector)
            .is_some_and(|e| e.distance_squared(target_position) <= tolerance_sq);
        if touched {
            hierarchy.propagate_subtree(self.chain.root);
        }
        if converged {
            SolveStatus::Success
        } else {
            debug!(
                "ccd: not converged after {} iterations",
                self.settings.max_iterations
            );
            SolveStatus::Failure
        }
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

    /// A straight chain of unit bones along +X, plus a target root.
    fn chain_rig(
        hierarchy: &mut Hierarchy,
        bones: usize,
        target_at: Vec3,
    ) -> (Vec<NodeHandle>, NodeHandle) {
        let mut joints = vec![hierarchy.add_root(Node::new())];
        for _ in 0..bones {
            let parent = *joints.last().unwrap();
            joints.push(
                hierarchy.add_child(parent, Node::with_local(TransformData::from_position(Vec3::X))),
            );
        }
        let target = hierarchy.add_root(Node::with_local(TransformData::from_position(target_at)));
        hierarchy.update_world_transforms();
        (joints, target)
    }

    fn effector_world(hierarchy: &Hierarchy, tip: NodeHandle) -> Vec3 {
        hierarchy.node(tip).unwrap().transform.world().position
    }

    #[test]
    fn single_bone_aims_at_target_in_one_sweep() {
        let mut hierarchy = Hierarchy::new();
        // Reachable target on the unit sphere.
        let (joints, target) = chain_rig(&mut hierarchy, 1, Vec3::new(0.6, 0.8, 0.0));

        let mut solver = CcdSolver::new(IkChain::new(joints[0], joints[1], target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Success);
        assert!(
            effector_world(&hierarchy, joints[1])
                .abs_diff_eq(Vec3::new(0.6, 0.8, 0.0), 2.0 * solver.settings.tolerance)
        );
    }

    #[test]
    fn two_bone_chain_converges_on_off_axis_target() {
        let mut hierarchy = Hierarchy::new();
        let (joints, target) = chain_rig(&mut hierarchy, 2, Vec3::new(1.2, 0.9, 0.0));

        let mut solver = CcdSolver::new(IkChain::new(joints[0], joints[2], target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Success);

        let reached = effector_world(&hierarchy, joints[2]);
        assert!(reached.distance(Vec3::new(1.2, 0.9, 0.0)) <= 2.0 * solver.settings.tolerance);
    }

    #[test]
    fn unreachable_target_fails_but_keeps_progress() {
        let mut hierarchy = Hierarchy::new();
        let (joints, target) = chain_rig(&mut hierarchy, 2, Vec3::new(0.0, 5.0, 0.0));

        let mut solver = CcdSolver::new(IkChain::new(joints[0], joints[2], target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Failure);

        // The chain stretched toward the target instead of snapping
        // back: the effector ended up close to straight up.
        let reached = effector_world(&hierarchy, joints[2]);
        assert!(reached.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 0.05), "reached {reached:?}");
    }

    #[test]
    fn converged_solve_is_idempotent() {
        let mut hierarchy = Hierarchy::new();
        let (joints, target) = chain_rig(&mut hierarchy, 2, Vec3::new(1.2, 0.9, 0.0));

        let mut solver = CcdSolver::new(IkChain::new(joints[0], joints[2], target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Success);

        let rotations_after_first: Vec<_> = joints
            .iter()
            .map(|&j| hierarchy.node(j).unwrap().transform.local.rotation)
            .collect();

        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Success);
        for (&joint, &before) in joints.iter().zip(&rotations_after_first) {
            let after = hierarchy.node(joint).unwrap().transform.local.rotation;
            assert!(after.abs_diff_eq(before, EPSILON));
        }
    }

    #[test]
    fn stale_chain_fails() {
        let mut hierarchy = Hierarchy::new();
        let (joints, target) = chain_rig(&mut hierarchy, 2, Vec3::ONE);
        hierarchy.remove_subtree(joints[1]);

        let mut solver = CcdSolver::new(IkChain::new(joints[0], joints[2], target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Failure);
    }

    #[test]
    fn side_branches_follow_the_solved_chain() {
        let mut hierarchy = Hierarchy::new();
        let (joints, target) = chain_rig(&mut hierarchy, 2, Vec3::new(1.2, 0.9, 0.0));
        // A branch hanging off the middle joint, outside the chain.
        let branch = hierarchy.add_child(
            joints[1],
            Node::with_local(TransformData::from_position(Vec3::new(0.0, -0.5, 0.0))),
        );
        hierarchy.update_world_transforms();

        let mut solver = CcdSolver::new(IkChain::new(joints[0], joints[2], target));
        assert_eq!(solver.solve(&mut hierarchy), SolveStatus::Success);

        // The branch's world transform must match a fresh full
        // propagation.
        let solved = hierarchy.node(branch).unwrap().transform.world().position;
        hierarchy.update_world_transforms();
        let fresh = hierarchy.node(branch).unwrap().transform.world().position;
        assert!(solved.abs_diff_eq(fresh, EPSILON));
    }
}
