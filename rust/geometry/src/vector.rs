// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Small vector helpers shared by the orientation solver

use nalgebra::{Unit, Vector3};

/// Below this magnitude a vector is treated as zero length
pub const EPSILON: f64 = 1e-10;

/// Cross product of two 3D vectors
#[inline]
pub fn cross(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a.cross(b)
}

#[inline]
pub fn dot(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.dot(b)
}

/// Unit vector in the direction of `v`, or `None` for a zero-length vector
#[inline]
pub fn normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    v.try_normalize(EPSILON)
}

/// Vector pointing the opposite way
#[inline]
pub fn flip(v: &Vector3<f64>) -> Vector3<f64> {
    -v
}

/// Projection onto the horizontal (XY) plane
#[inline]
pub fn horizontal(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, v.y, 0.0)
}

/// Angle between two vectors in `[0, π]`
///
/// The cosine is clamped to `[-1, 1]` before `acos` so that floating point
/// overshoot never produces NaN. Returns `None` when either vector has zero
/// length.
#[inline]
pub fn clamped_angle(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<f64> {
    let denominator = a.norm() * b.norm();
    if denominator < EPSILON {
        return None;
    }
    let cos_angle = (a.dot(b) / denominator).clamp(-1.0, 1.0);
    Some(cos_angle.acos())
}

/// Unit normal of the plane spanned by `v1` and `v2`
///
/// When the spanning vectors are (numerically) identical the plane is
/// undefined; `v2` is lifted by one unit along Z first, which always yields a
/// vertical plane through `v1` for a horizontal `v1`.
pub fn spanned_plane_normal(v1: &Vector3<f64>, v2: &Vector3<f64>) -> Option<Unit<Vector3<f64>>> {
    Unit::try_new(cross(v1, v2), EPSILON).or_else(|| {
        let lifted = Vector3::new(v2.x, v2.y, v2.z + 1.0);
        Unit::try_new(cross(v1, &lifted), EPSILON)
    })
}

/// Projection of `v` onto the plane with unit normal `m`: `v - dot(v, m)·m`
#[inline]
pub fn project_onto_plane(v: &Vector3<f64>, m: &Unit<Vector3<f64>>) -> Vector3<f64> {
    let m = m.as_ref();
    v - m * v.dot(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_cross_product_examples() {
        assert_eq!(
            cross(&Vector3::new(1.0, 2.0, 3.0), &Vector3::new(4.0, 5.0, 6.0)),
            Vector3::new(-3.0, 6.0, -3.0)
        );
        assert_eq!(
            cross(&Vector3::new(2.0, -3.0, 1.0), &Vector3::new(4.0, 1.0, 2.0)),
            Vector3::new(-7.0, 0.0, 14.0)
        );
        assert_eq!(
            cross(&Vector3::zeros(), &Vector3::new(1.0, 2.0, 3.0)),
            Vector3::zeros()
        );
    }

    #[test]
    fn test_clamped_angle() {
        let x = Vector3::x();
        let y = Vector3::y();
        assert_relative_eq!(clamped_angle(&x, &y).unwrap(), FRAC_PI_2);
        assert_relative_eq!(clamped_angle(&x, &(-x)).unwrap(), PI);
        // Parallel vectors of different lengths must not overshoot acos
        let a = Vector3::new(0.1, 0.2, 0.3);
        assert_relative_eq!(clamped_angle(&a, &(a * 7.0)).unwrap(), 0.0, epsilon = 1e-7);
        assert!(clamped_angle(&Vector3::zeros(), &x).is_none());
    }

    #[test]
    fn test_project_onto_plane() {
        // Plane spanned by (1,1,1) and (1,1,0) is the vertical plane x = y
        let m = spanned_plane_normal(&Vector3::new(1.0, 1.0, 1.0), &Vector3::new(1.0, 1.0, 0.0))
            .unwrap();
        let projected = project_onto_plane(&Vector3::new(0.0, 2.0, 2.0), &m);
        assert_relative_eq!(projected, Vector3::new(1.0, 1.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(projected.dot(&m), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spanned_plane_normal_identical_vectors() {
        let t = Vector3::new(0.0, 1.0, 0.0);
        let m = spanned_plane_normal(&t, &t).unwrap();
        // Lifting the copy gives the vertical plane containing t
        assert_relative_eq!(m.z, 0.0);
        assert_relative_eq!(m.dot(&t), 0.0);
    }

    #[test]
    fn test_normalize_and_flip() {
        assert!(normalize(&Vector3::zeros()).is_none());
        let n = normalize(&Vector3::new(3.0, 0.0, 4.0)).unwrap();
        assert_relative_eq!(n, Vector3::new(0.6, 0.0, 0.8));
        assert_eq!(flip(&n), Vector3::new(-0.6, 0.0, -0.8));
        assert_eq!(horizontal(&n), Vector3::new(0.6, 0.0, 0.0));
    }
}
