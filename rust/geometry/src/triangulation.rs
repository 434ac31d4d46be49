// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation utilities
//!
//! Wrapper around earcutr for capping contour loops.

use crate::{Error, Point2, Point3, Result, Vector3};

/// Two positions closer than this are the same vertex
const WELD_DISTANCE: f64 = 1e-9;

/// Check if a polygon is convex (all turns have the same sign)
#[inline]
fn is_convex(points: &[Point2<f64>]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let n = points.len();
    let mut sign = 0i8;

    for i in 0..n {
        let p0 = &points[i];
        let p1 = &points[(i + 1) % n];
        let p2 = &points[(i + 2) % n];

        let turn = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);

        if turn.abs() > 1e-10 {
            let current_sign = if turn > 0.0 { 1i8 } else { -1i8 };
            if sign == 0 {
                sign = current_sign;
            } else if sign != current_sign {
                return false;
            }
        }
    }

    true
}

/// Fan triangulation for convex polygons
#[inline]
fn fan_triangulate(n: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity((n - 2) * 3);
    for i in 1..n - 1 {
        indices.push(0);
        indices.push(i);
        indices.push(i + 1);
    }
    indices
}

/// Triangulate a simple polygon (no holes)
///
/// Returns triangle indices into the input points. Every triangle winds the
/// same way as the polygon itself.
pub fn triangulate_polygon(points: &[Point2<f64>]) -> Result<Vec<usize>> {
    let n = points.len();

    if n < 3 {
        return Err(Error::TriangulationError(
            "Need at least 3 points to triangulate".to_string(),
        ));
    }

    if n == 3 {
        return Ok(vec![0, 1, 2]);
    }

    if n <= 8 && is_convex(points) {
        return Ok(fan_triangulate(n));
    }

    let mut vertices = Vec::with_capacity(n * 2);
    for p in points {
        vertices.push(p.x);
        vertices.push(p.y);
    }

    let mut indices = earcutr::earcut(&vertices, &[], 2)
        .map_err(|e| Error::TriangulationError(format!("{:?}", e)))?;

    // earcut normalizes ring orientation internally
    let polygon_ccw = signed_area_2d(points) >= 0.0;
    for tri in indices.chunks_exact_mut(3) {
        let (a, b, c) = (points[tri[0]], points[tri[1]], points[tri[2]]);
        let tri_ccw = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x) >= 0.0;
        if tri_ccw != polygon_ccw {
            tri.swap(1, 2);
        }
    }

    Ok(indices)
}

fn signed_area_2d(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let p = &points[i];
            let q = &points[(i + 1) % n];
            p.x * q.y - q.x * p.y
        })
        .sum::<f64>()
        / 2.0
}

/// Signed area of a loop projected onto the XY plane
///
/// Positive for counter-clockwise loops in a right-handed XY frame.
pub fn signed_area_xy(points: &[Point3<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut twice_area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    twice_area / 2.0
}

/// Remove consecutive duplicate points, including a closing duplicate
///
/// Smoothing rounds to two decimals, so neighbouring pixels of a tight
/// corner can collapse onto the same position; earcut needs them merged.
pub fn clean_loop(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    let mut cleaned: Vec<Point3<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if cleaned
            .last()
            .map_or(true, |last| (last - p).norm() > WELD_DISTANCE)
        {
            cleaned.push(*p);
        }
    }
    while cleaned.len() > 1 && (cleaned[0] - cleaned[cleaned.len() - 1]).norm() <= WELD_DISTANCE {
        cleaned.pop();
    }
    cleaned
}

/// Project 3D points onto a 2D plane defined by a normal
/// Returns 2D points and the coordinate system (u_axis, v_axis, origin)
pub fn project_to_2d(
    points_3d: &[Point3<f64>],
    normal: &Vector3<f64>,
) -> (Vec<Point2<f64>>, Vector3<f64>, Vector3<f64>, Point3<f64>) {
    if points_3d.is_empty() {
        return (
            Vec::new(),
            Vector3::zeros(),
            Vector3::zeros(),
            Point3::origin(),
        );
    }

    let origin = points_3d[0];

    // Reference axis least parallel to the normal keeps the basis stable
    let abs_x = normal.x.abs();
    let abs_y = normal.y.abs();
    let abs_z = normal.z.abs();

    let reference = if abs_x <= abs_y && abs_x <= abs_z {
        Vector3::x()
    } else if abs_y <= abs_z {
        Vector3::y()
    } else {
        Vector3::z()
    };

    let u_axis = normal.cross(&reference).normalize();
    let v_axis = normal.cross(&u_axis).normalize();

    let points_2d = points_3d
        .iter()
        .map(|p| {
            let v = p - origin;
            Point2::new(v.dot(&u_axis), v.dot(&v_axis))
        })
        .collect();

    (points_2d, u_axis, v_axis, origin)
}

/// Newell normal of a planar polygon, +Z when degenerate
pub fn calculate_polygon_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    if n < 3 {
        return Vector3::z();
    }

    let mut normal = Vector3::<f64>::zeros();
    for i in 0..n {
        let current = &points[i];
        let next = &points[(i + 1) % n];

        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }

    normal.try_normalize(1e-10).unwrap_or_else(Vector3::z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ]
    }

    #[test]
    fn test_triangulate_square() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];

        let indices = triangulate_polygon(&points).unwrap();
        assert_eq!(indices.len(), 6);
    }

    #[test]
    fn test_triangulate_concave() {
        let indices = triangulate_polygon(&l_shape()).unwrap();
        // n - 2 triangles for a simple polygon
        assert_eq!(indices.len(), 12);
    }

    #[test]
    fn test_triangles_follow_polygon_winding() {
        let ccw = l_shape();
        let cw: Vec<Point2<f64>> = ccw.iter().rev().copied().collect();

        for (points, expected) in [(ccw, 1.0), (cw, -1.0)] {
            let indices = triangulate_polygon(&points).unwrap();
            for tri in indices.chunks_exact(3) {
                let (a, b, c) = (points[tri[0]], points[tri[1]], points[tri[2]]);
                let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
                assert!(cross * expected > 0.0);
            }
        }
    }

    #[test]
    fn test_triangulate_insufficient_points() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(triangulate_polygon(&points).is_err());
    }

    #[test]
    fn test_signed_area_orientation() {
        let ccw: Vec<Point3<f64>> = l_shape().iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect();
        assert!((signed_area_xy(&ccw) - 3.0).abs() < 1e-12);

        let cw: Vec<Point3<f64>> = ccw.iter().rev().copied().collect();
        assert!((signed_area_xy(&cw) + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_clean_loop_removes_duplicates() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let cleaned = clean_loop(&points);
        assert_eq!(cleaned.len(), 3);
        assert_eq!(cleaned[2], Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_calculate_polygon_normal() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let normal = calculate_polygon_normal(&points);
        assert!((normal.z - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_project_to_2d_keeps_shape() {
        let points = vec![
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(1.0, 0.0, 5.0),
            Point3::new(1.0, 1.0, 5.0),
            Point3::new(0.0, 1.0, 5.0),
        ];

        let (projected, _, _, _) = project_to_2d(&points, &Vector3::z());
        assert_eq!(projected.len(), 4);
        assert!(((projected[0] - projected[2]).norm() - 2f64.sqrt()).abs() < 1e-12);
    }
}
