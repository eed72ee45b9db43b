use glam::{Affine3A, Mat4, Quat, Vec3};

/// A position/rotation/scale triple.
///
/// The currency of the whole pipeline. Poses store one per joint, and
/// every node carries two: a local transform relative to its parent and a
/// world transform derived top-down every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformData {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl TransformData {
    /// The identity transform (zero translation, identity rotation, unit scale).
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Composes a local transform with its parent's world transform.
    ///
    /// Componentwise TRS composition (shear-free):
    /// - `world.scale    = parent.scale * local.scale`
    /// - `world.rotation = parent.rotation * local.rotation`
    /// - `world.position = parent.position + parent.rotation * (parent.scale * local.position)`
    #[must_use]
    pub fn concatenate(local: &Self, parent_world: &Self) -> Self {
        Self {
            scale: parent_world.scale * local.scale,
            rotation: parent_world.rotation * local.rotation,
            position: parent_world.position
                + parent_world.rotation * (parent_world.scale * local.position),
        }
    }

    /// Builds the equivalent column-major matrix.
    #[inline]
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Builds the equivalent affine transform.
    #[inline]
    #[must_use]
    pub fn affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for TransformData {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A node's transform component.
///
/// `local` is the authored value; animation poses and IK solvers write it.
/// `world` is derived from `local` and the parent's `world` by the
/// hierarchy's top-down propagation pass; solvers additionally rewrite it
/// mid-frame while re-propagating the sub-chains they touch. Nothing else
/// should author `world` directly.
#[derive(Debug, Clone)]
pub struct Transform {
    pub local: TransformData,
    pub(crate) world: TransformData,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            local: TransformData::IDENTITY,
            world: TransformData::IDENTITY,
        }
    }

    /// Returns the derived world transform.
    ///
    /// Valid after the hierarchy's world propagation pass for the current
    /// frame; stale before it.
    #[inline]
    #[must_use]
    pub fn world(&self) -> &TransformData {
        &self.world
    }

    /// Returns the world matrix, for uploading or matrix-space math.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.world.matrix()
    }

    /// Returns the local matrix.
    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        self.local.matrix()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
