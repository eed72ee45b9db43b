//! Interpolation behavior for animatable value types.
//!
//! Keyframe tracks are generic over the value they animate. This module
//! defines the [`Interpolatable`] trait that supplies the per-type linear
//! and cubic interpolation rules, and implements it for the vector and
//! quaternion payloads used by transform channels.

use std::ops::Mul;

use glam::{Quat, Vec3, Vec4};

// ============================================================================
// Trait
// ============================================================================

/// A value that can be interpolated between keyframes.
///
/// `interpolate_cubic` expects Hermite tangents that have already been
/// scaled by the keyframe interval, matching the GLTF cubic-spline
/// convention where tangents are stored per second. The `Mul<f32>`
/// supertrait is what lets the sampler perform that scaling generically.
pub trait Interpolatable: Copy + Mul<f32, Output = Self> {
    /// Linear interpolation between two keyframe values at `t` in `[0, 1]`.
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;

    /// Cubic Hermite interpolation at `t` in `[0, 1]`.
    ///
    /// `tangent_out` is the outgoing tangent of the left keyframe and
    /// `tangent_in` the incoming tangent of the right keyframe, both
    /// pre-scaled by the segment duration.
    fn interpolate_cubic(
        start: Self,
        tangent_out: Self,
        end: Self,
        tangent_in: Self,
        t: f32,
    ) -> Self;
}

/// Hermite basis weights `(s0, s1, s2, s3)` for parameter `t`.
#[inline]
fn hermite_basis(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    let s2 = -2.0 * t3 + 3.0 * t2;
    let s3 = t3 - t2;
    let s0 = 1.0 - s2;
    let s1 = s3 - t2 + t;
    (s0, s1, s2, s3)
}

// ============================================================================
// Implementations
// ============================================================================

impl Interpolatable for Vec3 {
    #[inline]
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }

    #[inline]
    fn interpolate_cubic(
        start: Self,
        tangent_out: Self,
        end: Self,
        tangent_in: Self,
        t: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);
        start * s0 + tangent_out * s1 + end * s2 + tangent_in * s3
    }
}

impl Interpolatable for Quat {
    /// Spherical interpolation along the shortest arc.
    ///
    /// The result is renormalized so that long chains of sampled
    /// rotations stay unit length.
    #[inline]
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.slerp(end, t).normalize()
    }

    /// Componentwise Hermite interpolation followed by normalization.
    ///
    /// This matches the GLTF cubic-spline rule for rotations: the four
    /// quaternion components are interpolated as an ordinary vector and
    /// the result is projected back onto the unit sphere.
    #[inline]
    fn interpolate_cubic(
        start: Self,
        tangent_out: Self,
        end: Self,
        tangent_in: Self,
        t: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);
        let v = Vec4::from(start) * s0
            + Vec4::from(tangent_out) * s1
            + Vec4::from(end) * s2
            + Vec4::from(tangent_in) * s3;
        Quat::from_vec4(v.normalize())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn vec3_linear_endpoints_and_midpoint() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 4.0, -6.0);

        assert!(Vec3::interpolate_linear(a, b, 0.0).abs_diff_eq(a, EPSILON));
        assert!(Vec3::interpolate_linear(a, b, 1.0).abs_diff_eq(b, EPSILON));
        assert!(
            Vec3::interpolate_linear(a, b, 0.5).abs_diff_eq(Vec3::new(1.0, 2.0, -3.0), EPSILON)
        );
    }

    #[test]
    fn vec3_cubic_matches_endpoints() {
        let v0 = Vec3::new(1.0, 0.0, 0.0);
        let v1 = Vec3::new(0.0, 1.0, 0.0);
        let m = Vec3::new(0.5, 0.5, 0.0);

        assert!(Vec3::interpolate_cubic(v0, m, v1, m, 0.0).abs_diff_eq(v0, EPSILON));
        assert!(Vec3::interpolate_cubic(v0, m, v1, m, 1.0).abs_diff_eq(v1, EPSILON));
    }

    #[test]
    fn vec3_cubic_with_zero_tangents_is_smoothstep() {
        let v0 = Vec3::ZERO;
        let v1 = Vec3::ONE;
        let mid = Vec3::interpolate_cubic(v0, Vec3::ZERO, v1, Vec3::ZERO, 0.5);
        assert!(mid.abs_diff_eq(Vec3::splat(0.5), EPSILON));
    }

    #[test]
    fn quat_linear_stays_normalized() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(FRAC_PI_2);

        for i in 0..=10 {
            let t = i as f32 / 10.0;
            let q = Quat::interpolate_linear(a, b, t);
            assert!((q.length() - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn quat_linear_halfway_is_half_angle() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(FRAC_PI_2);
        let half = Quat::interpolate_linear(a, b, 0.5);
        let expected = Quat::from_rotation_y(FRAC_PI_2 * 0.5);
        assert!(half.abs_diff_eq(expected, EPSILON));
    }

    #[test]
    fn quat_cubic_is_normalized() {
        let a = Quat::from_rotation_x(0.3);
        let b = Quat::from_rotation_x(1.1);
        let zero = Quat::from_xyzw(0.0, 0.0, 0.0, 0.0);
        let q = Quat::interpolate_cubic(a, zero, b, zero, 0.25);
        assert!((q.length() - 1.0).abs() < EPSILON);
    }
}
