use std::sync::Arc;

use glam::{Affine3A, Mat4};
use uuid::Uuid;

use crate::errors::{AnimationError, Result};
use crate::scene::{Hierarchy, NodeHandle};

/// Skinning data loaded once from an asset and shared read-only.
///
/// `joints[i]` pairs with `inverse_bind_matrices[i]`; the inverse bind
/// matrix takes a vertex from mesh space to joint-local space at bind time.
/// `skeleton_root` is the common ancestor joint the skinning matrices are
/// made relative to.
#[derive(Debug, Clone)]
pub struct Skin {
    pub id: Uuid,
    pub name: String,

    joints: Vec<NodeHandle>,
    inverse_bind_matrices: Vec<Affine3A>,
    skeleton_root: NodeHandle,
}

impl Skin {
    pub fn new(
        name: &str,
        joints: Vec<NodeHandle>,
        inverse_bind_matrices: Vec<Affine3A>,
        skeleton_root: NodeHandle,
    ) -> Result<Self> {
        if joints.len() != inverse_bind_matrices.len() {
            return Err(AnimationError::SkinJointMismatch {
                joints: joints.len(),
                matrices: inverse_bind_matrices.len(),
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            joints,
            inverse_bind_matrices,
            skeleton_root,
        })
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

    #[inline]
    #[must_use]
    pub fn skeleton_root(&self) -> NodeHandle {
        self.skeleton_root
    }
}

/// Per-character live skinning state: the computed joint matrices for one
/// skinned mesh, recomputed every frame from the hierarchy's world
/// transforms.
#[derive(Debug, Clone)]
pub struct SkinInstance {
    skin: Arc<Skin>,
    joint_matrices: Vec<Mat4>,
}

impl SkinInstance {
    #[must_use]
    pub fn new(skin: Arc<Skin>) -> Self {
        let count = skin.joint_count();
        Self {
            skin,
            joint_matrices: vec![Mat4::IDENTITY; count],
        }
    }

    #[inline]
    #[must_use]
    pub fn skin(&self) -> &Arc<Skin> {
        &self.skin
    }

    /// The matrices applied to vertices for skeletal deformation, one per
    /// joint, in `Skin::joints` order.
    #[inline]
    #[must_use]
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    /// Recomputes all joint matrices from current world transforms.
    ///
    /// For each joint `j`:
    ///
    /// `jointMatrix[j] = rootLocal * rootWorld⁻¹ * jointWorld * inverseBind[j]`
    ///
    /// which expresses the joint's current pose relative to the skeleton
    /// root, then relative to the bind pose. Requires the hierarchy's world
    /// transforms to be up to date for the skeleton root and every joint.
    pub fn compute_joint_matrices(&mut self, hierarchy: &Hierarchy) {
        let Some(root) = hierarchy.node(self.skin.skeleton_root) else {
            log::warn!(
                "Skin '{}': skeleton root {:?} missing, keeping previous joint matrices",
                self.skin.name,
                self.skin.skeleton_root
            );
            return;
        };
        let root_ref = root.transform.local.affine() * root.transform.world().affine().inverse();

        for (i, &joint) in self.skin.joints.iter().enumerate() {
            let Some(node) = hierarchy.node(joint) else {
                log::warn!(
                    "Skin '{}': joint {i} ({joint:?}) missing, skipping",
                    self.skin.name
                );
                continue;
            };
            let ibm = self.skin.inverse_bind_matrices[i];
            self.joint_matrices[i] =
                (root_ref * node.transform.world().affine() * ibm).into();
        }
    }
}
