//! Hierarchical blend trees.
//!
//! A [`BlendTree`] composes clip-sampling leaves through 1-D and 2-D
//! blend nodes into a single output pose, driven by blend parameters that
//! gameplay code updates each frame (speed, aim direction, and the like).
//!
//! Every node owns its output [`Pose`] and reuses it across frames, so a
//! deep tree evaluates without per-frame allocation. Child evaluation is
//! lazy in the structural sense: only the children that actually
//! contribute to the current parameter value are sampled.

use std::sync::Arc;

use glam::Vec2;
use log::{debug, warn};

use crate::animation::blend::{blend_barycentric, blend_lerp};
use crate::animation::clip::AnimationClip;
use crate::animation::delaunay::Triangulation;
use crate::animation::pose::Pose;
use crate::animation::sampler::ClipSampler;
use crate::errors::{AnimationError, Result};

/// Blend positions closer than this are considered duplicates.
const POSITION_EPSILON: f32 = 1e-6;

// ============================================================================
// Node
// ============================================================================

/// One node of a blend tree.
#[derive(Debug)]
pub enum BlendNode {
    /// Samples a clip.
    Leaf(LeafNode),
    /// Blends the two children bracketing a scalar parameter.
    Blend1D(Blend1DNode),
    /// Blends the triangle of children containing a 2-D parameter.
    Blend2D(Blend2DNode),
}

impl BlendNode {
    /// A leaf that samples `clip`.
    #[must_use]
    pub fn leaf(clip: Arc<AnimationClip>) -> Self {
        Self::Leaf(LeafNode::new(clip))
    }

    /// A 1-D blend node over `(position, child)` pairs.
    ///
    /// # Errors
    ///
    /// Fails if two children share a blend position.
    pub fn blend_1d(children: Vec<(f32, BlendNode)>) -> Result<Self> {
        Ok(Self::Blend1D(Blend1DNode::new(children)?))
    }

    /// A 2-D blend node over `(position, child)` pairs.
    ///
    /// # Errors
    ///
    /// Fails if two children share a blend position.
    pub fn blend_2d(children: Vec<(Vec2, BlendNode)>) -> Result<Self> {
        Ok(Self::Blend2D(Blend2DNode::new(children)?))
    }

    /// Evaluates this subtree at `time` and returns the resulting pose.
    pub fn produce_pose(&mut self, time: f32) -> &Pose {
        match self {
            Self::Leaf(node) => node.produce(time),
            Self::Blend1D(node) => node.produce(time),
            Self::Blend2D(node) => node.produce(time),
        }
    }

    /// The pose from the most recent evaluation.
    #[must_use]
    pub fn result_pose(&self) -> &Pose {
        match self {
            Self::Leaf(node) => &node.pose,
            Self::Blend1D(node) => &node.pose,
            Self::Blend2D(node) => &node.pose,
        }
    }

    /// Sets the scalar parameter on every 1-D node in this subtree.
    pub fn set_parameter(&mut self, value: f32) {
        match self {
            Self::Leaf(_) => {}
            Self::Blend1D(node) => {
                node.parameter = value;
                for child in &mut node.children {
                    child.node.set_parameter(value);
                }
            }
            Self::Blend2D(node) => {
                for child in &mut node.children {
                    child.node.set_parameter(value);
                }
            }
        }
    }

    /// Sets the 2-D parameter on every 2-D node in this subtree.
    pub fn set_parameter_2d(&mut self, value: Vec2) {
        match self {
            Self::Leaf(_) => {}
            Self::Blend1D(node) => {
                for child in &mut node.children {
                    child.node.set_parameter_2d(value);
                }
            }
            Self::Blend2D(node) => {
                node.parameter = value;
                for child in &mut node.children {
                    child.node.set_parameter_2d(value);
                }
            }
        }
    }
}

// ============================================================================
// Leaf
// ============================================================================

/// Clip-sampling leaf. Wraps its query time by the clip duration so the
/// tree can be driven with an ever-growing timeline.
#[derive(Debug)]
pub struct LeafNode {
    clip: Arc<AnimationClip>,
    sampler: ClipSampler,
    pose: Pose,
}

impl LeafNode {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        let sampler = ClipSampler::new(&clip);
        Self {
            clip,
            sampler,
            pose: Pose::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    fn produce(&mut self, time: f32) -> &Pose {
        let duration = self.clip.duration();
        let local = if duration > 0.0 {
            time.rem_euclid(duration)
        } else {
            0.0
        };
        self.sampler.sample_into(&self.clip, local, &mut self.pose);
        &self.pose
    }
}

// ============================================================================
// 1-D blend
// ============================================================================

#[derive(Debug)]
struct Blend1DChild {
    position: f32,
    node: BlendNode,
}

/// Blends along a scalar axis. Children are kept sorted by position; the
/// parameter picks the two bracketing children and the segment-relative
/// blend factor.
#[derive(Debug)]
pub struct Blend1DNode {
    children: Vec<Blend1DChild>,
    parameter: f32,
    pose: Pose,
}

impl Blend1DNode {
    pub fn new(children: Vec<(f32, BlendNode)>) -> Result<Self> {
        let mut children: Vec<Blend1DChild> = children
            .into_iter()
            .map(|(position, node)| Blend1DChild { position, node })
            .collect();
        children.sort_by(|a, b| a.position.total_cmp(&b.position));
        for (index, pair) in children.windows(2).enumerate() {
            if (pair[1].position - pair[0].position).abs() < POSITION_EPSILON {
                return Err(AnimationError::DuplicateBlendPosition { index: index + 1 });
            }
        }
        Ok(Self {
            children,
            parameter: 0.0,
            pose: Pose::new(),
        })
    }

    /// Inserts a child at `position`, keeping the list sorted.
    ///
    /// # Errors
    ///
    /// Fails if another child already sits at `position`.
    pub fn add_child(&mut self, position: f32, node: BlendNode) -> Result<()> {
        if self
            .children
            .iter()
            .any(|c| (c.position - position).abs() < POSITION_EPSILON)
        {
            return Err(AnimationError::DuplicateBlendPosition {
                index: self.children.len(),
            });
        }
        let at = self
            .children
            .partition_point(|c| c.position <= position);
        self.children.insert(at, Blend1DChild { position, node });
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    #[must_use]
    pub fn parameter(&self) -> f32 {
        self.parameter
    }

    fn produce(&mut self, time: f32) -> &Pose {
        if self.children.is_empty() {
            self.pose.clear();
            return &self.pose;
        }

        // Bracket the parameter: `from` is the closest child at or below
        // it, `to` the closest above. Outside the keyed range both
        // collapse onto the nearest end child.
        let last = self.children.len() - 1;
        let split = self
            .children
            .partition_point(|c| c.position <= self.parameter);
        let to = split.min(last);
        let from = split.saturating_sub(1).min(last);

        let span = self.children[to].position - self.children[from].position;
        let t = if span.abs() < POSITION_EPSILON {
            // Zero-length segment (collapsed bracket): either side works,
            // 1.0 keeps the endpoints exact.
            1.0
        } else {
            ((self.parameter - self.children[from].position) / span).clamp(0.0, 1.0)
        };

        self.children[from].node.produce_pose(time);
        if to != from {
            self.children[to].node.produce_pose(time);
        }
        let pose_from = self.children[from].node.result_pose();
        let pose_to = self.children[to].node.result_pose();
        blend_lerp(pose_from, pose_to, t, &mut self.pose);
        &self.pose
    }
}

// ============================================================================
// 2-D blend
// ============================================================================

#[derive(Debug)]
struct Blend2DChild {
    position: Vec2,
    node: BlendNode,
}

/// Blends across a 2-D parameter space. The children's positions are
/// Delaunay-triangulated; the parameter selects a containing triangle
/// and its barycentric weights pick how much of each corner child to
/// blend in. Parameters outside the hull clamp to the nearest point on
/// the triangulation.
#[derive(Debug)]
pub struct Blend2DNode {
    children: Vec<Blend2DChild>,
    parameter: Vec2,
    triangulation: Triangulation,
    dirty: bool,
    pose: Pose,
}

impl Blend2DNode {
    pub fn new(children: Vec<(Vec2, BlendNode)>) -> Result<Self> {
        let children: Vec<Blend2DChild> = children
            .into_iter()
            .map(|(position, node)| Blend2DChild { position, node })
            .collect();
        for (index, child) in children.iter().enumerate() {
            let duplicate = children[..index]
                .iter()
                .any(|other| other.position.distance_squared(child.position) < POSITION_EPSILON);
            if duplicate {
                return Err(AnimationError::DuplicateBlendPosition { index });
            }
        }
        Ok(Self {
            children,
            parameter: Vec2::ZERO,
            triangulation: Triangulation::default(),
            dirty: true,
            pose: Pose::new(),
        })
    }

    /// Adds a child at `position` and schedules retriangulation.
    ///
    /// # Errors
    ///
    /// Fails if another child already sits at `position`.
    pub fn add_child(&mut self, position: Vec2, node: BlendNode) -> Result<()> {
        if self
            .children
            .iter()
            .any(|c| c.position.distance_squared(position) < POSITION_EPSILON)
        {
            return Err(AnimationError::DuplicateBlendPosition {
                index: self.children.len(),
            });
        }
        self.children.push(Blend2DChild { position, node });
        self.dirty = true;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    #[must_use]
    pub fn parameter(&self) -> Vec2 {
        self.parameter
    }

    fn rebuild_triangulation(&mut self) {
        let points: Vec<Vec2> = self.children.iter().map(|c| c.position).collect();
        self.triangulation = Triangulation::build(&points);
        self.dirty = false;
        if self.children.len() >= 3 && self.triangulation.is_empty() {
            warn!(
                "blend space over {} children has no valid triangles; \
                 falling back to nearest child",
                self.children.len()
            );
        } else {
            debug!(
                "triangulated blend space: {} children, {} triangles",
                self.children.len(),
                self.triangulation.triangles().len()
            );
        }
    }

    fn produce(&mut self, time: f32) -> &Pose {
        if self.dirty {
            self.rebuild_triangulation();
        }
        if self.children.is_empty() {
            self.pose.clear();
            return &self.pose;
        }

        if let Some((indices, weights, _clamped)) = self.triangulation.select(self.parameter) {
            for &index in &indices {
                self.children[index].node.produce_pose(time);
            }
            let pose_a = self.children[indices[0]].node.result_pose();
            let pose_b = self.children[indices[1]].node.result_pose();
            let pose_c = self.children[indices[2]].node.result_pose();
            blend_barycentric(pose_a, pose_b, pose_c, weights, &mut self.pose);
        } else {
            // Degenerate layout (fewer than three children, or all
            // collinear): the nearest child wins outright.
            let mut nearest = 0;
            let mut best = f32::INFINITY;
            for (index, child) in self.children.iter().enumerate() {
                let distance = child.position.distance_squared(self.parameter);
                if distance < best {
                    best = distance;
                    nearest = index;
                }
            }
            self.children[nearest].node.produce_pose(time);
            let result = self.children[nearest].node.result_pose();
            self.pose.clone_from(result);
        }
        &self.pose
    }
}

// ============================================================================
// Tree
// ============================================================================

/// A blend tree: the root node plus whole-tree parameter plumbing.
#[derive(Debug)]
pub struct BlendTree {
    root: BlendNode,
}

impl BlendTree {
    #[must_use]
    pub fn new(root: BlendNode) -> Self {
        Self { root }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &BlendNode {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut BlendNode {
        &mut self.root
    }

    /// Broadcasts a scalar parameter to every 1-D node.
    pub fn set_parameter(&mut self, value: f32) {
        self.root.set_parameter(value);
    }

    /// Broadcasts a 2-D parameter to every 2-D node.
    pub fn set_parameter_2d(&mut self, value: Vec2) {
        self.root.set_parameter_2d(value);
    }

    /// Evaluates the whole tree at `time`.
    pub fn produce_pose(&mut self, time: f32) -> &Pose {
        self.root.produce_pose(time)
    }

    /// The root pose from the most recent evaluation.
    #[must_use]
    pub fn result_pose(&self) -> &Pose {
        self.root.result_pose()
    }
}

// ============================================================================
// Tests
// ============================================================================
