//! Pose combination primitives.
//!
//! Two operations cover every composite node in a blend tree: pairwise
//! linear blending for 1-D segments and weighted three-way blending for
//! triangulated 2-D blend spaces.
//!
//! Both follow the same sparse-pose policy: joints present in only some
//! inputs are copied through unchanged, and within a joint each property
//! is blended only between the inputs that define it. A walk clip that
//! never keys the head therefore cannot drag the head toward identity
//! when blended with an idle clip that does.

use glam::{Quat, Vec3, Vec4};

use crate::animation::pose::{Pose, PoseChannels, PoseEntry};
use crate::animation::values::Interpolatable;

const WEIGHT_EPSILON: f32 = 1e-6;

// ============================================================================
// Pairwise blend
// ============================================================================

/// Blends `a` toward `b` by factor `t`, writing the result into `out`.
///
/// `t = 0` reproduces `a` and `t = 1` reproduces `b` for every property
/// both sides define. Rotations travel the shortest arc and come back
/// renormalized.
pub fn blend_lerp(a: &Pose, b: &Pose, t: f32, out: &mut Pose) {
    out.clear();

    for (joint, entry_a) in a.iter() {
        let blended = match b.entry(joint) {
            Some(entry_b) => blend_entry_linear(entry_a, entry_b, t),
            None => *entry_a,
        };
        out.insert(joint, blended);
    }
    for (joint, entry_b) in b.iter() {
        if a.entry(joint).is_none() {
            out.insert(joint, *entry_b);
        }
    }
}

fn blend_entry_linear(a: &PoseEntry, b: &PoseEntry, t: f32) -> PoseEntry {
    let mut out = PoseEntry::default();

    if let Some(position) = merge_property(
        a.has(PoseChannels::TRANSLATION),
        b.has(PoseChannels::TRANSLATION),
        a.transform.position,
        b.transform.position,
        |x, y| Vec3::interpolate_linear(x, y, t),
    ) {
        out.transform.position = position;
        out.channels |= PoseChannels::TRANSLATION;
    }
    if let Some(rotation) = merge_property(
        a.has(PoseChannels::ROTATION),
        b.has(PoseChannels::ROTATION),
        a.transform.rotation,
        b.transform.rotation,
        |x, y| Quat::interpolate_linear(x, y, t),
    ) {
        out.transform.rotation = rotation;
        out.channels |= PoseChannels::ROTATION;
    }
    if let Some(scale) = merge_property(
        a.has(PoseChannels::SCALE),
        b.has(PoseChannels::SCALE),
        a.transform.scale,
        b.transform.scale,
        |x, y| Vec3::interpolate_linear(x, y, t),
    ) {
        out.transform.scale = scale;
        out.channels |= PoseChannels::SCALE;
    }

    out
}

/// Blends when both sides define the property, copies through when only
/// one does.
#[inline]
fn merge_property<T: Copy>(
    in_a: bool,
    in_b: bool,
    value_a: T,
    value_b: T,
    blend: impl FnOnce(T, T) -> T,
) -> Option<T> {
    match (in_a, in_b) {
        (true, true) => Some(blend(value_a, value_b)),
        (true, false) => Some(value_a),
        (false, true) => Some(value_b),
        (false, false) => None,
    }
}

// ============================================================================
// Barycentric blend
// ============================================================================

/// Blends three poses with barycentric `weights`, writing into `out`.
///
/// Weights are expected to sum to one. When a joint property is defined
/// in only a subset of the inputs, the weights of that subset are
/// renormalized so the defined values still blend to full strength
/// instead of shrinking toward identity.
pub fn blend_barycentric(a: &Pose, b: &Pose, c: &Pose, weights: [f32; 3], out: &mut Pose) {
    out.clear();

    let poses = [a, b, c];
    for (slot, pose) in poses.iter().enumerate() {
        for (joint, _) in pose.iter() {
            // Each joint is resolved once, when first encountered.
            if poses[..slot].iter().any(|p| p.entry(joint).is_some()) {
                continue;
            }
            let entries = [a.entry(joint), b.entry(joint), c.entry(joint)];
            if let Some(blended) = blend_entry_barycentric(entries, weights) {
                out.insert(joint, blended);
            }
        }
    }
}

fn blend_entry_barycentric(entries: [Option<&PoseEntry>; 3], weights: [f32; 3]) -> Option<PoseEntry> {
    let mut out = PoseEntry::default();

    if let Some(position) =
        weighted_vec3(&entries, weights, PoseChannels::TRANSLATION, |e| {
            e.transform.position
        })
    {
        out.transform.position = position;
        out.channels |= PoseChannels::TRANSLATION;
    }
    if let Some(rotation) = weighted_quat(&entries, weights) {
        out.transform.rotation = rotation;
        out.channels |= PoseChannels::ROTATION;
    }
    if let Some(scale) = weighted_vec3(&entries, weights, PoseChannels::SCALE, |e| e.transform.scale)
    {
        out.transform.scale = scale;
        out.channels |= PoseChannels::SCALE;
    }

    if out.channels.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Weights over the inputs that define `flag`, renormalized to sum to
/// one. Falls back to equal weights when the defined subset carries no
/// weight at all.
fn subset_weights(
    entries: &[Option<&PoseEntry>; 3],
    weights: [f32; 3],
    flag: PoseChannels,
) -> Option<[Option<f32>; 3]> {
    let mut defined = [None; 3];
    let mut total = 0.0_f32;
    let mut count = 0_u32;
    for slot in 0..3 {
        if let Some(entry) = entries[slot] {
            if entry.has(flag) {
                defined[slot] = Some(weights[slot]);
                total += weights[slot];
                count += 1;
            }
        }
    }
    if count == 0 {
        return None;
    }
    let uniform = 1.0 / count as f32;
    for weight in &mut defined {
        if let Some(w) = weight {
            *w = if total.abs() > WEIGHT_EPSILON {
                *w / total
            } else {
                uniform
            };
        }
    }
    Some(defined)
}

fn weighted_vec3(
    entries: &[Option<&PoseEntry>; 3],
    weights: [f32; 3],
    flag: PoseChannels,
    get: impl Fn(&PoseEntry) -> Vec3,
) -> Option<Vec3> {
    let normalized = subset_weights(entries, weights, flag)?;
    let mut sum = Vec3::ZERO;
    for slot in 0..3 {
        if let (Some(entry), Some(weight)) = (entries[slot], normalized[slot]) {
            sum += get(entry) * weight;
        }
    }
    Some(sum)
}

fn weighted_quat(entries: &[Option<&PoseEntry>; 3], weights: [f32; 3]) -> Option<Quat> {
    let normalized = subset_weights(entries, weights, PoseChannels::ROTATION)?;

    // Align every input to the first defined rotation's hemisphere so
    // the componentwise sum cannot cancel across the double cover.
    let mut reference = None;
    let mut sum = Vec4::ZERO;
    for slot in 0..3 {
        if let (Some(entry), Some(weight)) = (entries[slot], normalized[slot]) {
            let mut q = entry.transform.rotation;
            match reference {
                None => reference = Some(q),
                Some(r) => {
                    if q.dot(r) < 0.0 {
                        q = -q;
                    }
                }
            }
            sum += Vec4::from(q) * weight;
        }
    }

    let reference = reference?;
    if sum.length_squared() < WEIGHT_EPSILON {
        return Some(reference);
    }
    Some(Quat::from_vec4(sum.normalize()))
}

// ============================================================================
// Tests
// ============================================================================
