//! Rigs: the joint table that maps pose indices to scene nodes.
//!
//! Clips and poses refer to joints by dense index so they stay portable
//! across scenes. A [`Rig`] resolves those indices to [`NodeHandle`]s in
//! one concrete hierarchy and applies evaluated poses to the nodes' local
//! transforms.

use log::warn;

use crate::animation::pose::{Pose, PoseChannels};
use crate::scene::{Hierarchy, NodeHandle, Skin};

/// An ordered list of scene nodes addressed by joint index.
#[derive(Debug, Clone, Default)]
pub struct Rig {
    joints: Vec<NodeHandle>,
}

impl Rig {
    #[must_use]
    pub fn new(joints: Vec<NodeHandle>) -> Self {
        Self { joints }
    }

    /// A rig over the joints of `skin`, in skin order, so poses indexed
    /// for the skin drive the same nodes the skinning matrices read.
    #[must_use]
    pub fn from_skin(skin: &Skin) -> Self {
        Self {
            joints: skin.joints().to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn joints(&self) -> &[NodeHandle] {
        &self.joints
    }

    #[inline]
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Writes `pose` into the local transforms of this rig's nodes.
    ///
    /// Only the properties flagged in each entry's channel mask are
    /// written; everything else keeps its current local value. Entries
    /// whose joint index falls outside the rig, or whose node has been
    /// removed, are skipped with a warning.
    pub fn apply_pose(&self, hierarchy: &mut Hierarchy, pose: &Pose) {
        for (joint, entry) in pose.iter() {
            let Some(&handle) = self.joints.get(joint) else {
                warn!(
                    "pose targets joint {joint} but the rig only has {} joints; skipping",
                    self.joints.len()
                );
                continue;
            };
            let Some(node) = hierarchy.node_mut(handle) else {
                warn!("pose targets joint {joint} whose node is gone; skipping");
                continue;
            };

            if entry.has(PoseChannels::TRANSLATION) {
                node.transform.local.position = entry.transform.position;
            }
            if entry.has(PoseChannels::ROTATION) {
                node.transform.local.rotation = entry.transform.rotation;
            }
            if entry.has(PoseChannels::SCALE) {
                node.transform.local.scale = entry.transform.scale;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Node, TransformData};
    use glam::{Quat, Vec3};

    const EPSILON: f32 = 1e-5;

    #[test]
    fn applies_only_masked_properties() {
        let mut hierarchy = Hierarchy::new();
        let node = hierarchy.add_root(Node::with_local(TransformData {
            position: Vec3::new(5.0, 5.0, 5.0),
            rotation: Quat::from_rotation_x(1.0),
            scale: Vec3::splat(3.0),
        }));
        let rig = Rig::new(vec![node]);

        let mut pose = Pose::new();
        pose.set_translation(0, Vec3::new(1.0, 2.0, 3.0));
        rig.apply_pose(&mut hierarchy, &pose);

        let local = &hierarchy.node(node).unwrap().transform.local;
        assert!(local.position.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), EPSILON));
        // Rotation and scale were not in the mask and must survive.
        assert!(local.rotation.abs_diff_eq(Quat::from_rotation_x(1.0), EPSILON));
        assert!(local.scale.abs_diff_eq(Vec3::splat(3.0), EPSILON));
    }

    #[test]
    fn out_of_range_joints_are_skipped() {
        let mut hierarchy = Hierarchy::new();
        let node = hierarchy.add_root(Node::new());
        let rig = Rig::new(vec![node]);

        let mut pose = Pose::new();
        pose.set_translation(9, Vec3::ONE);
        // Must not panic, must not touch the only node.
        rig.apply_pose(&mut hierarchy, &pose);
        assert!(hierarchy
            .node(node)
            .unwrap()
            .transform
            .local
            .position
            .abs_diff_eq(Vec3::ZERO, EPSILON));
    }

    #[test]
    fn removed_nodes_are_skipped() {
        let mut hierarchy = Hierarchy::new();
        let keep = hierarchy.add_root(Node::new());
        let gone = hierarchy.add_root(Node::new());
        hierarchy.remove_subtree(gone);

        let rig = Rig::new(vec![keep, gone]);
        let mut pose = Pose::new();
        pose.set_translation(0, Vec3::X);
        pose.set_translation(1, Vec3::Y);
        rig.apply_pose(&mut hierarchy, &pose);

        assert!(hierarchy
            .node(keep)
            .unwrap()
            .transform
            .local
            .position
            .abs_diff_eq(Vec3::X, EPSILON));
    }
}
