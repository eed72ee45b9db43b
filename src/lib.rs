pub mod scene;
pub mod animation;
pub mod ik;
pub mod errors;

pub use scene::{Hierarchy, Node, NodeHandle, Skin, SkinInstance, Transform, TransformData};
pub use animation::{AnimationClip, Animator, BlendNode, BlendTree, Channel, ChannelProperty, ClipPlayer, ClipSampler, InterpolationMode, KeyframeTrack, LoopMode, Playback, Pose, Rig, TrackData};
pub use ik::{CcdSolver, FabrikSolver, IkChain, IkSolver, SolveStatus, TwoBoneIk};
pub use errors::AnimationError;
