//! Evaluated poses: sparse per-joint transform snapshots.
//!
//! A [`Pose`] is what clip sampling and blending produce each frame. It
//! maps joint indices to local-space transform values plus a mask of
//! which properties were actually animated, so applying a pose never
//! clobbers properties no channel touched.

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::scene::TransformData;

// ============================================================================
// Channel mask
// ============================================================================

bitflags::bitflags! {
    /// Which transform properties a pose entry carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PoseChannels: u8 {
        const TRANSLATION = 1 << 0;
        const ROTATION    = 1 << 1;
        const SCALE       = 1 << 2;
    }
}

// ============================================================================
// Entry
// ============================================================================

/// Sampled transform values for one joint.
///
/// Only the properties flagged in `channels` are meaningful; the rest
/// hold identity placeholders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEntry {
    pub transform: TransformData,
    pub channels: PoseChannels,
}

impl Default for PoseEntry {
    fn default() -> Self {
        Self {
            transform: TransformData::IDENTITY,
            channels: PoseChannels::empty(),
        }
    }
}

impl PoseEntry {
    #[inline]
    #[must_use]
    pub fn has(&self, channels: PoseChannels) -> bool {
        self.channels.contains(channels)
    }
}

// ============================================================================
// Pose
// ============================================================================

/// A sparse set of joint transforms produced by one evaluation.
///
/// Backed by a hash map keyed on joint index so that clips animating a
/// handful of joints on a large rig stay cheap to produce and apply.
/// Poses are reused frame to frame via [`Pose::clear`], which keeps the
/// map's allocation.
#[derive(Debug, Clone, Default)]
pub struct Pose {
    entries: FxHashMap<usize, PoseEntry>,
}

impl Pose {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all entries, retaining capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn entry(&self, joint: usize) -> Option<&PoseEntry> {
        self.entries.get(&joint)
    }

    /// The entry for `joint`, inserting an identity entry if absent.
    #[inline]
    pub fn entry_mut(&mut self, joint: usize) -> &mut PoseEntry {
        self.entries.entry(joint).or_default()
    }

    /// Inserts a full entry, replacing any previous one for `joint`.
    #[inline]
    pub fn insert(&mut self, joint: usize, entry: PoseEntry) {
        self.entries.insert(joint, entry);
    }

    pub fn set_translation(&mut self, joint: usize, value: Vec3) {
        let entry = self.entry_mut(joint);
        entry.transform.position = value;
        entry.channels |= PoseChannels::TRANSLATION;
    }

    pub fn set_rotation(&mut self, joint: usize, value: Quat) {
        let entry = self.entry_mut(joint);
        entry.transform.rotation = value;
        entry.channels |= PoseChannels::ROTATION;
    }

    pub fn set_scale(&mut self, joint: usize, value: Vec3) {
        let entry = self.entry_mut(joint);
        entry.transform.scale = value;
        entry.channels |= PoseChannels::SCALE;
    }

    /// Iterates `(joint, entry)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &PoseEntry)> {
        self.entries.iter().map(|(&joint, entry)| (joint, entry))
    }

    /// Joint indices present in this pose, in arbitrary order.
    pub fn joints(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }
}

// ============================================================================
// Tests
// ============================================================================
