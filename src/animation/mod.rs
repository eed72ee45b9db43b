//! Animation evaluation pipeline
//!
//! Everything between authored keyframes and final joint transforms:
//! - [`tracks`]: keyframe storage and cursor-accelerated sampling
//! - [`values`]: per-type interpolation rules
//! - [`clip`]: channels and clips
//! - [`pose`]: sparse per-joint evaluation results
//! - [`sampler`]: clip evaluation into poses
//! - [`blend`] / [`delaunay`] / [`blend_tree`]: pose composition
//! - [`player`]: single-clip playback state
//! - [`rig`]: joint-index to node-handle mapping and pose application
//! - [`animator`]: the per-frame driver

pub mod animator;
pub mod blend;
pub mod blend_tree;
pub mod clip;
pub mod delaunay;
pub mod player;
pub mod pose;
pub mod rig;
pub mod sampler;
pub mod tracks;
pub mod values;

pub use animator::{Animator, Playback, RigBinding};
pub use blend::{blend_barycentric, blend_lerp};
pub use blend_tree::{Blend1DNode, Blend2DNode, BlendNode, BlendTree, LeafNode};
pub use clip::{AnimationClip, Channel, ChannelProperty, TrackData};
pub use player::{ClipPlayer, LoopMode};
pub use pose::{Pose, PoseChannels, PoseEntry};
pub use rig::Rig;
pub use sampler::ClipSampler;
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use values::Interpolatable;
