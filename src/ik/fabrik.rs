//! Forward-and-backward-reaching IK (FABRIK).

use glam::Vec3;
use log::{debug, warn};

use crate::ik::{FALLBACK_AXIS, SolveStatus, aim_delta, refresh_chain_worlds, world_position};
use crate::scene::Hierarchy;

use super::IkChain;

/// Iteration budget and convergence criterion for [`FabrikSolver`].
#[derive(Debug, Clone, Copy)]
pub struct FabrikSettings {
    pub max_iterations: u32,
    /// World-space distance at which the effector counts as on target.
    pub tolerance: f32,
}

impl Default for FabrikSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 1e-3,
        }
    }
}

/// Position-based iterative solver.
///
/// Joint world positions are snapshotted into a scratch buffer along
/// with the bone lengths. Each iteration runs a forward pass (pin the
/// effector to the target, re-space the chain toward the root) and a
/// backward pass (pin the root back to its original position, re-space
/// toward the effector), preserving bone lengths throughout. Once the
/// position buffer converges, the positions are converted back into
/// joint rotations from the root down.
///
/// A solve that starts on target returns early without touching the
/// pose, so re-solving a converged chain is a no-op.
#[derive(Debug)]
pub struct FabrikSolver {
    chain: IkChain,
    pub settings: FabrikSettings,
    status: SolveStatus,
    /// Scratch joint positions, effector first.
    positions: Vec<Vec3>,
    /// Scratch bone lengths, `lengths[i]` between `positions[i]` and
    /// `positions[i + 1]`.
    lengths: Vec<f32>,
}

impl FabrikSolver {
    #[must_use]
    pub fn new(chain: IkChain) -> Self {
        Self::with_settings(chain, FabrikSettings::default())
    }

    #[must_use]
    pub fn with_settings(chain: IkChain, settings: FabrikSettings) -> Self {
        Self {
            chain,
            settings,
            status: SolveStatus::Idle,
            positions: Vec::new(),
            lengths: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn chain(&self) -> IkChain {
        self.chain
    }

    /// Replaces the chain, clearing scratch state and returning the
    /// solver to [`SolveStatus::Idle`].
    pub fn set_chain(&mut self, chain: IkChain) {
        self.chain = chain;
        self.status = SolveStatus::Idle;
        self.positions.clear();
        self.lengths.clear();
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Runs up to `max_iterations` forward/backward passes against
    /// current world transforms.
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
            warn!("fabrik: chain needs at least one bone");
            return SolveStatus::Failure;
        }
        let Some(target_position) = world_position(hierarchy, self.chain.target) else {
            return SolveStatus::Failure;
        };

        // Snapshot world positions effector-first and measure the bones.
        self.positions.clear();
        for &handle in path.iter().rev() {
            let Some(position) = world_position(hierarchy, handle) else {
                return SolveStatus::Failure;
            };
            self.positions.push(position);
        }
        let count = self.positions.len();
        self.lengths.clear();
        for i in 0..count - 1 {
            self.lengths
                .push(self.positions[i].distance(self.positions[i + 1]));
        }
        let root_pin = self.positions[count - 1];
        let tolerance_sq = self.settings.tolerance * self.settings.tolerance;

        // Already on target: nothing to do.
        if self.positions[0].distance_squared(target_position) <= tolerance_sq {
            return SolveStatus::Success;
        }

        for _ in 0..self.settings.max_iterations {
            // Forward pass: the effector jumps onto the target and each
            // joint follows at its bone length.
            self.positions[0] = target_position;
            for i in 1..count {
                let direction = direction_or_fallback(self.positions[i] - self.positions[i - 1]);
                self.positions[i] = self.positions[i - 1] + direction * self.lengths[i - 1];
            }

            // Backward pass: the root snaps home and the chain re-spaces
            // back toward the effector.
            self.positions[count - 1] = root_pin;
            for i in (0..count - 1).rev() {
                let direction = direction_or_fallback(self.positions[i] - self.positions[i + 1]);
                self.positions[i] = self.positions[i + 1] + direction * self.lengths[i];
            }

            if self.positions[0].distance_squared(target_position) <= tolerance_sq {
                break;
            }
        }

        // Convert positions back to rotations, root down. Each joint is
        // aimed so its bone points at the solved child position, with
        // the world-space delta mapped into the joint's local frame.
        for (k, &joint) in path[..count - 1].iter().enumerate() {
            let child = path[k + 1];
            let (Some(joint_position), Some(child_position)) = (
                world_position(hierarchy, joint),
                world_position(hierarchy, child),
            ) else {
                continue;
            };
            let desired = self.positions[count - 2 - k] - self.positions[count - 1 - k];
            let Some(delta) = aim_delta(child_position - joint_position, desired) else {
                continue;
            };

            let parent_rotation = hierarchy
                .node(joint)
                .and_then(|node| node.parent())
                .and_then(|parent| hierarchy.node(parent))
                .map_or(glam::Quat::IDENTITY, |parent| {
                    parent.transform.world().rotation
                });
            if let Some(node) = hierarchy.node_mut(joint) {
                let world_rotation = (delta * node.transform.world().rotation).normalize();
                node.transform.local.rotation =
                    (parent_rotation.inverse() * world_rotation).normalize();
            }
            // Downstream joints must see this rotation before they are
            // measured.
            refresh_chain_worlds(hierarchy, &path[k..]);
        }

        hierarchy.propagate_subtree(self.chain.root);

        let converged = world_position(hierarchy, self.chain.end_effector)
            .is_some_and(|e| e.distance_squared(target_position) <= tolerance_sq);
        if converged {
            SolveStatus::Success
        } else {
            debug!(
                "fabrik: not converged after {} iterations",
                self.settings.max_iterations
            );
            SolveStatus::Failure
        }
    }
}

/// Normalizes `v`, falling back to the shared default axis for
/// zero-length deltas (coincident joints).
#[inline]
fn direction_or_fallback(v: Vec3) -> Vec3 {
    v.try_normalize().unwrap_or(FALLBACK_AXIS)
}

// ============================================================================
// Tests
// ============================================================================
