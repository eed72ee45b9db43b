//! Inverse kinematics over the scene hierarchy.
//!
//! Three solvers cover the usual trade-offs:
//! - [`TwoBoneIk`]: closed-form planar solve for exactly two bones, the
//!   right tool for arms and legs.
//! - [`CcdSolver`]: iterative per-joint rotation for chains of any
//!   length.
//! - [`FabrikSolver`]: iterative position-based solve, converted back to
//!   joint rotations afterwards.
//!
//! All of them read a target node and rewrite local rotations along an
//! [`IkChain`], then re-propagate world transforms so the hierarchy stays
//! consistent. Solvers run after pose application and world propagation,
//! layering procedural adjustment on top of keyframed motion.

mod ccd;
mod chain;
mod fabrik;
mod two_bone;

pub use ccd::{CcdSettings, CcdSolver};
pub use chain::IkChain;
pub use fabrik::{FabrikSettings, FabrikSolver};
pub use two_bone::TwoBoneIk;

use glam::{Quat, Vec3};

use crate::scene::{Hierarchy, NodeHandle, TransformData};

/// Rotation axis used when the geometry leaves none to infer, e.g. when
/// aligning a vector with its exact opposite.
pub const FALLBACK_AXIS: Vec3 = Vec3::Z;

const ALIGNED_ANGLE_EPSILON: f32 = 1e-6;

// ============================================================================
// Status
// ============================================================================

/// Solver lifecycle state.
///
/// `Idle` until the first solve after a chain (re)assignment,
/// `Processing` while a solve is running, then `Success` or `Failure`
/// describing the last completed solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveStatus {
    #[default]
    Idle,
    Processing,
    Success,
    Failure,
}

// ============================================================================
// Solver sum type
// ============================================================================

/// Any solver kind, for heterogeneous solver lists.
#[derive(Debug)]
pub enum IkSolver {
    TwoBone(TwoBoneIk),
    Ccd(CcdSolver),
    Fabrik(FabrikSolver),
}

impl IkSolver {
    /// Runs one solve against the hierarchy.
    pub fn solve(&mut self, hierarchy: &mut Hierarchy) -> SolveStatus {
        match self {
            Self::TwoBone(solver) => solver.solve(hierarchy),
            Self::Ccd(solver) => solver.solve(hierarchy),
            Self::Fabrik(solver) => solver.solve(hierarchy),
        }
    }

    #[must_use]
    pub fn status(&self) -> SolveStatus {
        match self {
            Self::TwoBone(solver) => solver.status(),
            Self::Ccd(solver) => solver.status(),
            Self::Fabrik(solver) => solver.status(),
        }
    }
}

impl From<TwoBoneIk> for IkSolver {
    fn from(solver: TwoBoneIk) -> Self {
        Self::TwoBone(solver)
    }
}

impl From<CcdSolver> for IkSolver {
    fn from(solver: CcdSolver) -> Self {
        Self::Ccd(solver)
    }
}

impl From<FabrikSolver> for IkSolver {
    fn from(solver: FabrikSolver) -> Self {
        Self::Fabrik(solver)
    }
}

// ============================================================================
// Shared geometry helpers
// ============================================================================

/// The world-space rotation taking direction `current` to `desired`.
///
/// Returns `None` when either vector is too short to define a direction.
/// Antiparallel vectors rotate half a turn around [`FALLBACK_AXIS`].
pub(crate) fn aim_delta(current: Vec3, desired: Vec3) -> Option<Quat> {
    let current = current.try_normalize()?;
    let desired = desired.try_normalize()?;

    let angle = current.dot(desired).clamp(-1.0, 1.0).acos();
    if angle < ALIGNED_ANGLE_EPSILON {
        return Some(Quat::IDENTITY);
    }
    let axis = current
        .cross(desired)
        .try_normalize()
        .unwrap_or(FALLBACK_AXIS);
    Some(Quat::from_axis_angle(axis, angle))
}

/// Recomputes world transforms along `chain` in order, each node against
/// its parent's current world transform.
///
/// Cheaper than a subtree propagation and sufficient inside iterative
/// sweeps, where only the chain itself needs to be current; callers run a
/// full [`Hierarchy::propagate_subtree`] once the solve is done so side
/// branches catch up.
pub(crate) fn refresh_chain_worlds(hierarchy: &mut Hierarchy, chain: &[NodeHandle]) {
    for &handle in chain {
        let parent_world = hierarchy
            .node(handle)
            .and_then(|node| node.parent())
            .and_then(|parent| hierarchy.node(parent))
            .map_or(TransformData::IDENTITY, |parent| *parent.transform.world());

        let Some(node) = hierarchy.node_mut(handle) else {
            continue;
        };
        node.transform.world = TransformData::concatenate(&node.transform.local, &parent_world);
    }
}

/// World position of a node, when it exists.
#[inline]
pub(crate) fn world_position(hierarchy: &Hierarchy, handle: NodeHandle) -> Option<Vec3> {
    hierarchy
        .node(handle)
        .map(|node| node.transform.world().position)
}

// ============================================================================
// Tests
// ============================================================================
