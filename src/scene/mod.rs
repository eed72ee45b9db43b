//! Scene graph module
//!
//! The transform hierarchy the animation pipeline reads and writes:
//! - [`Node`]: a scene node (parent/child links plus a transform)
//! - [`TransformData`]: a position/rotation/scale triple
//! - [`Transform`]: a node's local transform and its derived world transform
//! - [`Hierarchy`]: node storage and top-down world propagation
//! - [`Skin`] / [`SkinInstance`]: skinning data and per-frame joint matrices

pub mod hierarchy;
pub mod node;
pub mod skin;
pub mod transform;

pub use hierarchy::Hierarchy;
pub use node::Node;
pub use skin::{Skin, SkinInstance};
pub use transform::{Transform, TransformData};

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle into a [`Hierarchy`]'s node storage.
    pub struct NodeHandle;
}
