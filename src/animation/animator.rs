//! Per-frame animation orchestration.
//!
//! [`Animator`] owns the moving parts of the pipeline (playback sources
//! bound to rigs, plus IK solvers and skin instances) and steps them in a
//! fixed order each frame:
//!
//! 1. advance playback timelines by the frame delta,
//! 2. evaluate each source into a pose and apply it to local transforms,
//! 3. propagate world transforms top-down,
//! 4. run IK solvers (which re-propagate what they touch),
//! 5. recompute skinning matrices.
//!
//! Keeping the order fixed is what makes layering predictable: IK always
//! adjusts on top of the keyframed result, and skinning always sees the
//! final worlds. The animator is plain data owned by the caller; nothing
//! here is global.

use log::warn;

use crate::animation::blend_tree::BlendTree;
use crate::animation::player::ClipPlayer;
use crate::animation::pose::Pose;
use crate::animation::rig::Rig;
use crate::ik::IkSolver;
use crate::scene::{Hierarchy, SkinInstance};
use glam::Vec2;

// ============================================================================
// Playback sources
// ============================================================================

/// What drives a rig: a single clip player or a blend tree with its own
/// timeline.
#[derive(Debug)]
pub enum Playback {
    Clip(ClipPlayer),
    Tree {
        tree: BlendTree,
        /// Raw timeline handed to the tree; leaves wrap it per clip.
        time: f32,
        speed: f32,
    },
}

/// A rig paired with its playback source.
#[derive(Debug)]
pub struct RigBinding {
    pub rig: Rig,
    pub playback: Playback,
    /// Scratch pose reused across frames.
    pose: Pose,
}

impl RigBinding {
    /// The clip player, when this binding plays a single clip.
    pub fn clip_player_mut(&mut self) -> Option<&mut ClipPlayer> {
        match &mut self.playback {
            Playback::Clip(player) => Some(player),
            Playback::Tree { .. } => None,
        }
    }

    /// The blend tree, when this binding is tree-driven.
    pub fn blend_tree_mut(&mut self) -> Option<&mut BlendTree> {
        match &mut self.playback {
            Playback::Tree { tree, .. } => Some(tree),
            Playback::Clip(_) => None,
        }
    }
}

// ============================================================================
// Animator
// ============================================================================

/// The per-frame driver for a set of animated characters.
#[derive(Debug, Default)]
pub struct Animator {
    bindings: Vec<RigBinding>,
    solvers: Vec<IkSolver>,
    skins: Vec<SkinInstance>,
}

impl Animator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `player` to `rig`. Returns the binding index.
    pub fn add_clip_playback(&mut self, rig: Rig, player: ClipPlayer) -> usize {
        self.bindings.push(RigBinding {
            rig,
            playback: Playback::Clip(player),
            pose: Pose::new(),
        });
        self.bindings.len() - 1
    }

    /// Binds `tree` to `rig` with a fresh timeline. Returns the binding
    /// index.
    pub fn add_tree_playback(&mut self, rig: Rig, tree: BlendTree) -> usize {
        self.bindings.push(RigBinding {
            rig,
            playback: Playback::Tree {
                tree,
                time: 0.0,
                speed: 1.0,
            },
            pose: Pose::new(),
        });
        self.bindings.len() - 1
    }

    #[must_use]
    pub fn binding(&self, index: usize) -> Option<&RigBinding> {
        self.bindings.get(index)
    }

    pub fn binding_mut(&mut self, index: usize) -> Option<&mut RigBinding> {
        self.bindings.get_mut(index)
    }

    /// Registers an IK solver, run each frame after pose application.
    /// Returns the solver index.
    pub fn add_solver(&mut self, solver: impl Into<IkSolver>) -> usize {
        self.solvers.push(solver.into());
        self.solvers.len() - 1
    }

    #[must_use]
    pub fn solver(&self, index: usize) -> Option<&IkSolver> {
        self.solvers.get(index)
    }

    pub fn solver_mut(&mut self, index: usize) -> Option<&mut IkSolver> {
        self.solvers.get_mut(index)
    }

    /// Registers a skin instance, updated at the end of each frame.
    /// Returns the skin index.
    pub fn add_skin(&mut self, skin: SkinInstance) -> usize {
        self.skins.push(skin);
        self.skins.len() - 1
    }

    #[must_use]
    pub fn skin(&self, index: usize) -> Option<&SkinInstance> {
        self.skins.get(index)
    }

    #[must_use]
    pub fn skins(&self) -> &[SkinInstance] {
        &self.skins
    }

    /// Forwards a scalar blend parameter to the tree at `binding`.
    pub fn set_blend_parameter(&mut self, binding: usize, value: f32) {
        match self.bindings.get_mut(binding) {
            Some(b) => match b.blend_tree_mut() {
                Some(tree) => tree.set_parameter(value),
                None => warn!("binding {binding} is not tree-driven"),
            },
            None => warn!("no binding {binding}"),
        }
    }

    /// Forwards a 2-D blend parameter to the tree at `binding`.
    pub fn set_blend_parameter_2d(&mut self, binding: usize, value: Vec2) {
        match self.bindings.get_mut(binding) {
            Some(b) => match b.blend_tree_mut() {
                Some(tree) => tree.set_parameter_2d(value),
                None => warn!("binding {binding} is not tree-driven"),
            },
            None => warn!("no binding {binding}"),
        }
    }

    /// Steps the whole pipeline by `dt` seconds.
    pub fn update(&mut self, hierarchy: &mut Hierarchy, dt: f32) {
        // 1 + 2: advance timelines, evaluate poses, write local
        // transforms.
        for binding in &mut self.bindings {
            match &mut binding.playback {
                Playback::Clip(player) => {
                    player.advance(dt);
                    player.sample_into(&mut binding.pose);
                    binding.rig.apply_pose(hierarchy, &binding.pose);
                }
                Playback::Tree { tree, time, speed } => {
                    *time += dt * *speed;
                    tree.produce_pose(*time);
                    binding.rig.apply_pose(hierarchy, tree.result_pose());
                }
            }
        }

        // 3: derive world transforms for everything.
        hierarchy.update_world_transforms();

        // 4: procedural adjustment on top of the keyframed result.
        for solver in &mut self.solvers {
            solver.solve(hierarchy);
        }

        // 5: skinning matrices from the final worlds.
        for skin in &mut self.skins {
            skin.compute_joint_matrices(hierarchy);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
