//! Animation clips: named bundles of keyframe channels.
//!
//! A [`Channel`] pairs one [`KeyframeTrack`] with the joint property it
//! animates. An [`AnimationClip`] is an immutable, shareable collection of
//! channels with a duration derived from its longest track, typically
//! wrapped in an [`Arc`](std::sync::Arc) and sampled by many players at
//! once.

use glam::{Quat, Vec3};
use uuid::Uuid;

use crate::animation::tracks::KeyframeTrack;
use crate::errors::{AnimationError, Result};

// ============================================================================
// Channel target
// ============================================================================

/// The transform property a channel writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelProperty {
    Translation,
    Rotation,
    Scale,
}

impl ChannelProperty {
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Translation => "translation",
            Self::Rotation => "rotation",
            Self::Scale => "scale",
        }
    }
}

// ============================================================================
// Track storage
// ============================================================================

/// Typed keyframe storage for a channel.
///
/// Translation and scale animate [`Vec3`], rotation animates [`Quat`].
/// Keeping the variants in one enum lets a clip hold heterogeneous
/// channels in a single list.
#[derive(Debug, Clone)]
pub enum TrackData {
    Vector3(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
}

impl TrackData {
    /// Time of the last keyframe in this track.
    #[inline]
    #[must_use]
    pub fn end_time(&self) -> f32 {
        match self {
            Self::Vector3(track) => track.end_time(),
            Self::Quaternion(track) => track.end_time(),
        }
    }

    #[inline]
    #[must_use]
    pub fn key_count(&self) -> usize {
        match self {
            Self::Vector3(track) => track.key_count(),
            Self::Quaternion(track) => track.key_count(),
        }
    }
}

// ============================================================================
// Channel
// ============================================================================

/// One animated property of one joint.
///
/// `joint` is an index into the rig's joint list, not a scene handle, so
/// the same clip can drive any rig with a compatible joint layout.
#[derive(Debug, Clone)]
pub struct Channel {
    pub joint: usize,
    pub property: ChannelProperty,
    pub track: TrackData,
}

impl Channel {
    /// Builds a channel, rejecting mismatched track payloads.
    ///
    /// # Errors
    ///
    /// Rotation channels must carry quaternion tracks, translation and
    /// scale channels must carry vector tracks.
    pub fn new(joint: usize, property: ChannelProperty, track: TrackData) -> Result<Self> {
        let compatible = matches!(
            (property, &track),
            (ChannelProperty::Rotation, TrackData::Quaternion(_))
                | (
                    ChannelProperty::Translation | ChannelProperty::Scale,
                    TrackData::Vector3(_)
                )
        );
        if !compatible {
            return Err(AnimationError::ChannelTrackMismatch {
                joint,
                property: property.name(),
            });
        }
        Ok(Self {
            joint,
            property,
            track,
        })
    }
}

// ============================================================================
// Clip
// ============================================================================

/// An immutable animation clip.
///
/// The duration is the maximum end time over all channels, computed once
/// at construction. Clips carry a unique id so tooling can refer to them
/// independently of their (non-unique) name.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub id: Uuid,
    pub name: String,
    duration: f32,
    channels: Vec<Channel>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .map(|channel| channel.track.end_time())
            .fold(0.0_f32, f32::max);
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            duration,
            channels,
        }
    }

    /// Clip length in seconds.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    #[inline]
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
