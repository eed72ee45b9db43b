//! Keyframe tracks and time-to-segment resolution.
//!
//! A [`KeyframeTrack`] owns a strictly increasing list of key times and the
//! matching value storage for one animated property. Sampling resolves a
//! query time to a keyframe segment, then interpolates inside it according
//! to the track's [`InterpolationMode`].
//!
//! # Design
//!
//! Playback advances time by small deltas, so the segment that contained
//! the previous query is almost always the segment (or a close neighbor)
//! that contains the next one. [`KeyframeCursor`] remembers the last
//! resolved segment and tries a short local scan before falling back to
//! binary search, making steady playback O(1) per sample regardless of
//! key count. The cursor lives outside the track so a single track can be
//! sampled concurrently by many players, each with its own cursor.

use std::fmt;

use crate::animation::values::Interpolatable;
use crate::errors::{AnimationError, Result};

/// How far the cursor scans from its cached index before giving up and
/// binary-searching. Covers normal frame-to-frame advancement and small
/// backward corrections.
const MAX_SCAN_OFFSET: usize = 3;

/// Segments shorter than this are treated as instantaneous.
const MIN_SEGMENT_DURATION: f32 = 1e-6;

// ============================================================================
// Interpolation mode
// ============================================================================

/// Interpolation rule applied between adjacent keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Hold the left keyframe's value until the next key.
    Step,
    /// Componentwise lerp, or shortest-arc slerp for rotations.
    #[default]
    Linear,
    /// Cubic Hermite spline with per-key in/out tangents.
    CubicSpline,
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step => write!(f, "Step"),
            Self::Linear => write!(f, "Linear"),
            Self::CubicSpline => write!(f, "CubicSpline"),
        }
    }
}

// ============================================================================
// Cursor
// ============================================================================

/// Per-player sampling state: the index of the last resolved left keyframe.
///
/// A default cursor starts at the first segment, which is also always a
/// correct (if cold) starting point after a seek.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyframeCursor {
    last_index: usize,
}

impl KeyframeCursor {
    /// Forgets the cached segment, forcing a fresh search on next sample.
    #[inline]
    pub fn reset(&mut self) {
        self.last_index = 0;
    }
}

// ============================================================================
// Track
// ============================================================================

/// An immutable keyframe curve for a single animated property.
///
/// For [`InterpolationMode::CubicSpline`] the value storage follows the
/// GLTF convention of three entries per key, laid out as
/// `[in-tangent, value, out-tangent]`, so `values.len() == 3 * times.len()`.
/// For the other modes it is one entry per key.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>,
    interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Builds a track, validating the keyframe data.
    ///
    /// # Errors
    ///
    /// Fails if `times` is empty, if the times are not strictly
    /// increasing, or if the value count does not match the key count for
    /// the chosen interpolation mode.
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Result<Self> {
        if times.is_empty() {
            return Err(AnimationError::EmptyTrack);
        }
        for (index, pair) in times.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(AnimationError::NonMonotonicTimes { index: index + 1 });
            }
        }
        let expected = match interpolation {
            InterpolationMode::CubicSpline => times.len() * 3,
            InterpolationMode::Step | InterpolationMode::Linear => times.len(),
        };
        if values.len() != expected {
            return Err(AnimationError::ValueCountMismatch {
                keys: times.len(),
                expected,
                got: values.len(),
            });
        }
        Ok(Self {
            times,
            values,
            interpolation,
        })
    }

    /// Keyframe times, strictly increasing.
    #[inline]
    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    #[inline]
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.times.len()
    }

    /// Time of the last keyframe.
    #[inline]
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Samples the track at `time`, clamping outside the keyed range.
    ///
    /// Stateless variant that binary-searches every call. Prefer
    /// [`Self::sample_with_cursor`] on hot playback paths.
    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        let next = self.times.partition_point(|&t| t <= time);
        let index = next.saturating_sub(1);
        self.sample_segment(index, time)
    }

    /// Samples the track at `time`, reusing `cursor` to resolve the
    /// segment in O(1) for coherent (small-delta) time queries.
    ///
    /// Produces bitwise-identical results to [`Self::sample`]; the cursor
    /// only changes how the segment is found, never which one.
    #[must_use]
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> T {
        let index = self.find_segment(time, cursor.last_index);
        cursor.last_index = index;
        self.sample_segment(index, time)
    }

    /// Resolves `time` to the left keyframe index of its segment: the
    /// largest `i` with `times[i] <= time`, or 0 when `time` precedes the
    /// first key.
    fn find_segment(&self, time: f32, hint: usize) -> usize {
        let len = self.times.len();
        let hint = hint.min(len - 1);

        // Cached segment still contains the query.
        if self.segment_contains(hint, time) {
            return hint;
        }

        if time >= self.times[hint] {
            // Scan forward a few segments. Steady playback lands here.
            let limit = (hint + MAX_SCAN_OFFSET).min(len - 1);
            for index in (hint + 1)..=limit {
                if self.segment_contains(index, time) {
                    return index;
                }
            }
        } else {
            // Scan backward, covering small corrections and loop wraps
            // near the cursor.
            let lower = hint.saturating_sub(MAX_SCAN_OFFSET);
            for index in (lower..hint).rev() {
                if self.segment_contains(index, time) {
                    return index;
                }
            }
        }

        // Large jump (seek, loop restart): fall back to binary search.
        let next = self.times.partition_point(|&t| t <= time);
        next.saturating_sub(1)
    }

    /// True when `times[index] <= time < times[index + 1]`, treating the
    /// last segment as open-ended.
    #[inline]
    fn segment_contains(&self, index: usize, time: f32) -> bool {
        if time < self.times[index] {
            return index == 0;
        }
        match self.times.get(index + 1) {
            Some(&next) => time < next,
            None => true,
        }
    }

    /// Interpolates inside the segment whose left keyframe is `index`.
    fn sample_segment(&self, index: usize, time: f32) -> T {
        let len = self.times.len();

        // At or past the last key there is no right-hand neighbor.
        if index + 1 >= len {
            return self.key_value(len - 1);
        }
        if self.interpolation == InterpolationMode::Step {
            return self.key_value(index);
        }

        let t0 = self.times[index];
        let t1 = self.times[index + 1];
        let dt = t1 - t0;
        if dt <= MIN_SEGMENT_DURATION {
            return self.key_value(index);
        }
        let t = ((time - t0) / dt).clamp(0.0, 1.0);

        match self.interpolation {
            InterpolationMode::Linear => {
                T::interpolate_linear(self.key_value(index), self.key_value(index + 1), t)
            }
            InterpolationMode::CubicSpline => {
                // GLTF layout: key k stores [in-tangent, value, out-tangent]
                // at indices 3k, 3k + 1, 3k + 2. Tangents are per second
                // and get scaled by the segment duration here.
                let start = self.values[index * 3 + 1];
                let tangent_out = self.values[index * 3 + 2] * dt;
                let end = self.values[(index + 1) * 3 + 1];
                let tangent_in = self.values[(index + 1) * 3] * dt;
                T::interpolate_cubic(start, tangent_out, end, tangent_in, t)
            }
            InterpolationMode::Step => unreachable!("handled above"),
        }
    }

    /// The stored value of key `index`, accounting for the cubic layout.
    #[inline]
    fn key_value(&self, index: usize) -> T {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.values[index * 3 + 1],
            InterpolationMode::Step | InterpolationMode::Linear => self.values[index],
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
