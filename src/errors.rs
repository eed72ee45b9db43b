//! Error Types
//!
//! Errors in this crate are confined to construction and validation of
//! authored data: keyframe tracks, clips, blend trees and skins check their
//! invariants once, when built, and are immutable afterwards.
//!
//! Runtime evaluation never returns these errors. Numerical degeneracy,
//! such as an unreachable IK target or an out-of-range joint index, is
//! clamped or skipped locally with a log message instead.

use thiserror::Error;

/// The error type for animation data validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    // ========================================================================
    // Keyframe Tracks
    // ========================================================================
    /// A track was built with no keyframes at all.
    #[error("Keyframe track has no keys")]
    EmptyTrack,

    /// Keyframe times must be strictly increasing.
    #[error("Keyframe times not strictly increasing at index {index}")]
    NonMonotonicTimes {
        /// Index of the first offending key
        index: usize,
    },

    /// The value buffer length does not match the key count for the
    /// interpolation mode (cubic-spline tracks store three values per key).
    #[error("Track value count mismatch: {keys} keys require {expected} values, got {got}")]
    ValueCountMismatch {
        /// Number of keyframe times
        keys: usize,
        /// Required value count for the interpolation mode
        expected: usize,
        /// Actual value count supplied
        got: usize,
    },

    // ========================================================================
    // Clips & Channels
    // ========================================================================
    /// A channel pairs a property with the wrong track value type
    /// (rotation requires a quaternion track, translation/scale a vector one).
    #[error("Channel for joint {joint} pairs {property} with an incompatible track type")]
    ChannelTrackMismatch {
        /// Target joint index of the channel
        joint: usize,
        /// Name of the targeted property
        property: &'static str,
    },

    // ========================================================================
    // Blend Trees
    // ========================================================================
    /// Two children of the same blend node share a blend coordinate.
    #[error("Duplicate blend position at child {index}")]
    DuplicateBlendPosition {
        /// Index of the later duplicate child
        index: usize,
    },

    // ========================================================================
    // Skins
    // ========================================================================
    /// Joint list and inverse-bind-matrix list lengths differ.
    #[error("Skin joint count mismatch: {joints} joints, {matrices} inverse bind matrices")]
    SkinJointMismatch {
        /// Number of joints
        joints: usize,
        /// Number of inverse bind matrices
        matrices: usize,
    },
}

/// Alias for `Result<T, AnimationError>`.
pub type Result<T> = std::result::Result<T, AnimationError>;
