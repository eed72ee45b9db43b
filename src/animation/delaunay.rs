//! Delaunay triangulation of 2-D blend-space positions.
//!
//! Blend-space children live at author-chosen 2-D coordinates. To blend
//! between them the space is triangulated once (Bowyer-Watson incremental
//! insertion) and each query resolves to a containing triangle plus
//! barycentric weights. Queries outside the hull are clamped to the
//! nearest point on the triangulation so the parameter can be driven
//! freely without special casing.
//!
//! Triangles are stored with clockwise winding, so a point is inside a
//! triangle exactly when all three edge cross products are non-positive.

use glam::Vec2;

/// Tolerance for on-edge containment.
const BOUNDARY_EPSILON: f32 = 1e-6;

/// Triangles flatter than this are discarded as degenerate.
const MIN_TRIANGLE_AREA: f32 = 1e-9;

#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Twice the signed area of triangle `(a, b, c)`; negative for clockwise.
#[inline]
fn signed_area_doubled(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    cross(b - a, c - a)
}

// ============================================================================
// Triangulation
// ============================================================================

/// An immutable triangulation over a fixed point set.
///
/// Triangle entries index into the original point slice. Collinear or
/// undersized inputs yield an empty triangulation; callers fall back to
/// nearest-point selection in that case.
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
    points: Vec<Vec2>,
    triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Triangulates `points` by incremental insertion.
    #[must_use]
    pub fn build(points: &[Vec2]) -> Self {
        let n = points.len();
        if n < 3 {
            return Self {
                points: points.to_vec(),
                triangles: Vec::new(),
            };
        }

        // Working vertex list: real points followed by a super-triangle
        // generous enough that its circumcircles never interfere.
        let mut min = points[0];
        let mut max = points[0];
        for &p in points {
            min = min.min(p);
            max = max.max(p);
        }
        let span = (max - min).max_element().max(1.0);
        let center = (min + max) * 0.5;

        let mut verts = points.to_vec();
        verts.push(center + Vec2::new(-20.0 * span, -span));
        verts.push(center + Vec2::new(20.0 * span, -span));
        verts.push(center + Vec2::new(0.0, 20.0 * span));

        let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];

        for point in 0..n {
            let p = verts[point];

            // Triangles whose circumcircle swallows the new point form
            // the insertion cavity.
            let mut bad = Vec::new();
            for (index, tri) in triangles.iter().enumerate() {
                if circumcircle_contains(verts[tri[0]], verts[tri[1]], verts[tri[2]], p) {
                    bad.push(index);
                }
            }

            // The cavity boundary is every directed edge of a bad
            // triangle whose reverse is not also a bad-triangle edge.
            let mut boundary: Vec<(usize, usize)> = Vec::new();
            for &index in &bad {
                let tri = triangles[index];
                for edge in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                    let reversed = (edge.1, edge.0);
                    let shared = bad.iter().any(|&other| {
                        other != index && triangle_has_edge(triangles[other], reversed)
                    });
                    if !shared {
                        boundary.push(edge);
                    }
                }
            }

            // Remove the cavity and fan new triangles from the point.
            // Winding is preserved because boundary edges keep the
            // cavity's orientation.
            for &index in bad.iter().rev() {
                triangles.swap_remove(index);
            }
            for (a, b) in boundary {
                triangles.push([point, a, b]);
            }
        }

        // Strip triangles that touch the super-triangle, and any slivers.
        triangles.retain(|tri| {
            tri.iter().all(|&v| v < n)
                && signed_area_doubled(verts[tri[0]], verts[tri[1]], verts[tri[2]]).abs()
                    > MIN_TRIANGLE_AREA
        });

        // Normalize to clockwise winding for the containment test.
        for tri in &mut triangles {
            if signed_area_doubled(verts[tri[0]], verts[tri[1]], verts[tri[2]]) > 0.0 {
                tri.swap(1, 2);
            }
        }

        Self {
            points: points.to_vec(),
            triangles,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Resolves `p` to `(vertex indices, barycentric weights, clamped)`.
    ///
    /// Returns the first containing triangle in storage order, or the
    /// nearest point on the triangulation when `p` lies outside the hull
    /// (`clamped = true`). `None` only when there are no triangles.
    #[must_use]
    pub fn select(&self, p: Vec2) -> Option<([usize; 3], [f32; 3], bool)> {
        if let Some((tri, weights)) = self.locate(p) {
            return Some((tri, weights, false));
        }
        self.clamp_to_nearest(p)
            .map(|(tri, weights)| (tri, weights, true))
    }

    /// First triangle containing `p`, with its barycentric weights.
    fn locate(&self, p: Vec2) -> Option<([usize; 3], [f32; 3])> {
        for tri in &self.triangles {
            let a = self.points[tri[0]];
            let b = self.points[tri[1]];
            let c = self.points[tri[2]];

            let s0 = cross(a - p, b - p);
            let s1 = cross(b - p, c - p);
            let s2 = cross(c - p, a - p);
            if s0 <= BOUNDARY_EPSILON && s1 <= BOUNDARY_EPSILON && s2 <= BOUNDARY_EPSILON {
                let total = s0 + s1 + s2;
                if total.abs() <= MIN_TRIANGLE_AREA {
                    continue;
                }
                // s1 spans the sub-triangle opposite vertex a, and so on.
                return Some((*tri, [s1 / total, s2 / total, s0 / total]));
            }
        }
        None
    }

    /// Nearest point on any triangle, as that triangle's weights. Ties
    /// resolve to the lowest triangle index.
    fn clamp_to_nearest(&self, p: Vec2) -> Option<([usize; 3], [f32; 3])> {
        let mut best: Option<(f32, [usize; 3], [f32; 3])> = None;
        for tri in &self.triangles {
            let a = self.points[tri[0]];
            let b = self.points[tri[1]];
            let c = self.points[tri[2]];

            let weights = closest_point_weights(a, b, c, p);
            let closest = a * weights[0] + b * weights[1] + c * weights[2];
            let distance = p.distance_squared(closest);
            if best.is_none_or(|(bd, _, _)| distance < bd) {
                best = Some((distance, *tri, weights));
            }
        }
        best.map(|(_, tri, weights)| (tri, weights))
    }
}

/// True when `p` lies strictly inside the circumcircle of `(a, b, c)`.
/// Degenerate triangles report every point as inside so they always get
/// replaced during insertion.
fn circumcircle_contains(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> bool {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        return true;
    }
    let a2 = a.length_squared();
    let b2 = b.length_squared();
    let c2 = c.length_squared();
    let center = Vec2::new(
        (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    );
    p.distance_squared(center) < a.distance_squared(center)
}

#[inline]
fn triangle_has_edge(tri: [usize; 3], edge: (usize, usize)) -> bool {
    [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])].contains(&edge)
}

/// Barycentric weights of the point in triangle `(a, b, c)` closest to
/// `p`, clamped to the triangle. Voronoi-region walk over vertices,
/// edges, then the interior.
fn closest_point_weights(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> [f32; 3] {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return [1.0, 0.0, 0.0];
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return [0.0, 1.0, 0.0];
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return [1.0 - v, v, 0.0];
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return [0.0, 0.0, 1.0];
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return [1.0 - w, 0.0, w];
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return [0.0, 1.0 - w, w];
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    [1.0 - v - w, v, w]
}

// ============================================================================
// Tests
// ============================================================================
