//! Clip evaluation into poses.
//!
//! [`ClipSampler`] owns one [`KeyframeCursor`] per clip channel and turns
//! a clip plus a playback time into a [`Pose`]. Cursors are playback
//! state, not clip state: two players sampling one shared clip each hold
//! their own sampler.

use crate::animation::clip::{AnimationClip, ChannelProperty, TrackData};
use crate::animation::pose::Pose;
use crate::animation::tracks::KeyframeCursor;

/// Samples a clip's channels with per-channel cursor acceleration.
#[derive(Debug, Clone, Default)]
pub struct ClipSampler {
    cursors: Vec<KeyframeCursor>,
}

impl ClipSampler {
    /// Creates a sampler sized for `clip`.
    #[must_use]
    pub fn new(clip: &AnimationClip) -> Self {
        Self {
            cursors: vec![KeyframeCursor::default(); clip.channel_count()],
        }
    }

    /// Drops all cached segment indices, e.g. after a hard seek.
    pub fn reset(&mut self) {
        for cursor in &mut self.cursors {
            cursor.reset();
        }
    }

    /// Evaluates every channel of `clip` at `time` into `pose`.
    ///
    /// The pose is cleared first; afterwards it contains exactly the
    /// joints and properties the clip animates. `time` is used as-is, so
    /// looping or clamping is the caller's business.
    pub fn sample_into(&mut self, clip: &AnimationClip, time: f32, pose: &mut Pose) {
        // Tolerate a clip swap by resizing the cursor pool.
        if self.cursors.len() != clip.channel_count() {
            self.cursors
                .resize_with(clip.channel_count(), KeyframeCursor::default);
        }

        pose.clear();
        for (channel, cursor) in clip.channels().iter().zip(&mut self.cursors) {
            // Pairing is enforced by `Channel::new`.
            match (&channel.track, channel.property) {
                (TrackData::Vector3(track), ChannelProperty::Translation) => {
                    pose.set_translation(channel.joint, track.sample_with_cursor(time, cursor));
                }
                (TrackData::Vector3(track), ChannelProperty::Scale) => {
                    pose.set_scale(channel.joint, track.sample_with_cursor(time, cursor));
                }
                (TrackData::Quaternion(track), ChannelProperty::Rotation) => {
                    pose.set_rotation(channel.joint, track.sample_with_cursor(time, cursor));
                }
                _ => {}
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
