//! Point-triangle and ray-triangle primitives.

use nalgebra::SVector;
use serde::{Deserialize, Serialize};

use crate::{Point3, Ray, Vec3};

/// Closest point of a triangle to a query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleProjection {
    /// The closest point on the triangle.
    pub point: Point3,
    /// Barycentric weights of `point` with respect to `(a, b, c)`.
    pub barycentric: Vec3,
    /// Euclidean distance from the query to `point`.
    pub distance: f64,
}

/// Intersection of a ray with a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayTriangleHit {
    /// Ray parameter of the intersection.
    pub t: f64,
    /// Barycentric weights of the intersection with respect to `(a, b, c)`.
    pub barycentric: Vec3,
}

/// Barycentric weights of the point of triangle `(a, b, c)` closest to `p`.
///
/// Works in any dimension since it only relies on dot products, which is
/// what lets the same routine serve the lifted embedding. The weights are
/// non-negative and sum to one.
pub fn triangle_barycentric_closest<const D: usize>(
    p: &SVector<f64, D>,
    a: &SVector<f64, D>,
    b: &SVector<f64, D>,
    c: &SVector<f64, D>,
) -> [f64; 3] {
    let ab = b - a;
    let ac = c - a;

    // Vertex region A
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return [1.0, 0.0, 0.0];
    }

    // Vertex region B
    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return [0.0, 1.0, 0.0];
    }

    // Edge region AB
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return [1.0 - v, v, 0.0];
    }

    // Vertex region C
    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return [0.0, 0.0, 1.0];
    }

    // Edge region AC
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return [1.0 - w, 0.0, w];
    }

    // Edge region BC
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return [0.0, 1.0 - w, w];
    }

    let sum = va + vb + vc;
    if sum <= 0.0 || !sum.is_finite() {
        // Collinear vertices: settle for the nearest corner.
        let da = ap.norm_squared();
        let db = bp.norm_squared();
        let dc = cp.norm_squared();
        return if da <= db && da <= dc {
            [1.0, 0.0, 0.0]
        } else if db <= dc {
            [0.0, 1.0, 0.0]
        } else {
            [0.0, 0.0, 1.0]
        };
    }

    // Face interior
    let v = vb / sum;
    let w = vc / sum;
    [1.0 - v - w, v, w]
}

/// Closest point of triangle `(a, b, c)` to `p`.
pub fn closest_point_on_triangle(
    p: &Point3,
    a: &Point3,
    b: &Point3,
    c: &Point3,
) -> TriangleProjection {
    let w = triangle_barycentric_closest(&p.coords, &a.coords, &b.coords, &c.coords);
    let point = Point3::from(a.coords * w[0] + b.coords * w[1] + c.coords * w[2]);
    TriangleProjection {
        point,
        barycentric: Vec3::new(w[0], w[1], w[2]),
        distance: (p - point).norm(),
    }
}

/// Two-sided Möller-Trumbore ray/triangle intersection.
///
/// Hits at negative ray parameters are rejected.
pub fn intersect_ray_triangle(
    ray: &Ray,
    a: &Point3,
    b: &Point3,
    c: &Point3,
) -> Option<RayTriangleHit> {
    const EPS: f64 = 1e-12;

    let dir = ray.direction.as_ref();
    let e1 = b - a;
    let e2 = c - a;
    let pvec = dir.cross(&e2);
    let det = e1.dot(&pvec);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = ray.origin - a;
    let u = tvec.dot(&pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(&e1);
    let v = dir.dot(&qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(&qvec) * inv_det;
    if t < 0.0 {
        return None;
    }

    Some(RayTriangleHit {
        t,
        barycentric: Vec3::new(1.0 - u - v, u, v),
    })
}

/// Unit normal of triangle `(a, b, c)` following its winding.
///
/// Degenerate triangles yield the zero vector.
pub fn triangle_normal(a: &Point3, b: &Point3, c: &Point3) -> Vec3 {
    (b - a)
        .cross(&(c - a))
        .try_normalize(f64::MIN_POSITIVE)
        .unwrap_or_else(Vec3::zeros)
}
