//! Single-clip playback.
//!
//! A [`ClipPlayer`] binds a shared clip to its own timeline: current
//! time, speed, loop mode and play state, plus the sampler holding the
//! per-channel cursors. The player accumulates raw time and folds it
//! into the clip's range on demand, so ping-pong playback keeps its
//! direction across frames.

use std::sync::Arc;

use crate::animation::clip::AnimationClip;
use crate::animation::pose::Pose;
use crate::animation::sampler::ClipSampler;

/// What happens when playback reaches the end of the clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Clamp to the final frame and stop.
    Once,
    /// Wrap around to the start.
    #[default]
    Loop,
    /// Bounce back and forth between the ends.
    PingPong,
}

/// Plays one clip with independent timing state.
#[derive(Debug, Clone)]
pub struct ClipPlayer {
    clip: Arc<AnimationClip>,
    sampler: ClipSampler,
    /// Raw accumulated timeline. Folded into the clip range by
    /// [`Self::playback_time`].
    time: f32,
    pub speed: f32,
    pub loop_mode: LoopMode,
    playing: bool,
}

impl ClipPlayer {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        let sampler = ClipSampler::new(&clip);
        Self {
            clip,
            sampler,
            time: 0.0,
            speed: 1.0,
            loop_mode: LoopMode::default(),
            playing: true,
        }
    }

    #[inline]
    #[must_use]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.clip.duration()
    }

    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Stops playback and rewinds to the start.
    pub fn stop(&mut self) {
        self.playing = false;
        self.time = 0.0;
        self.sampler.reset();
    }

    /// Seeks to `time` on the raw timeline.
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Advances the timeline by `dt` seconds (scaled by `speed`) and
    /// applies the loop mode. A paused or zero-length clip is left
    /// untouched.
    pub fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        let duration = self.clip.duration();
        if duration <= 0.0 {
            return;
        }

        self.time += dt * self.speed;
        match self.loop_mode {
            LoopMode::Once => {
                if self.time >= duration {
                    self.time = duration;
                    self.playing = false;
                } else if self.time < 0.0 {
                    self.time = 0.0;
                    self.playing = false;
                }
            }
            LoopMode::Loop => {
                self.time = self.time.rem_euclid(duration);
            }
            LoopMode::PingPong => {
                // Keep the raw time inside one full out-and-back period
                // so the fold in `playback_time` stays exact.
                self.time = self.time.rem_euclid(2.0 * duration);
            }
        }
    }

    /// The clip-local time that sampling sees, after loop folding.
    #[must_use]
    pub fn playback_time(&self) -> f32 {
        let duration = self.clip.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        match self.loop_mode {
            LoopMode::Once => self.time.clamp(0.0, duration),
            LoopMode::Loop => self.time.rem_euclid(duration),
            LoopMode::PingPong => {
                let t = self.time.rem_euclid(2.0 * duration);
                if t > duration { 2.0 * duration - t } else { t }
            }
        }
    }

    /// Samples the clip at the current playback time into `pose`.
    pub fn sample_into(&mut self, pose: &mut Pose) {
        let time = self.playback_time();
        self.sampler.sample_into(&self.clip, time, pose);
    }
}

// ============================================================================
// Tests
// ============================================================================
