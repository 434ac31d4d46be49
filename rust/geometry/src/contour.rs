// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contour data structures, smoothing and scaling
//!
//! Traced contours arrive as integer pixel loops with a parent link per
//! contour. Before they become geometry they are lifted to 3D (z = 0),
//! smoothed with a cyclic moving average and scaled so the source image
//! height maps onto the requested mesh height.

use crate::error::{Error, Result};
use nalgebra::{Point2, Point3, Vector3};

/// Number of consecutive points averaged by [`smooth_loop`]
pub const SMOOTHING_WINDOW: usize = 3;

/// Closed loop of 3D points (last point implicitly connects to the first)
pub type Loop3 = Vec<Point3<f64>>;

/// Closed polygon boundary of a foreground region, in pixel coordinates
///
/// x is the column and y the row of the boundary pixel. There is no explicit
/// closing point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point2<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point2<i32>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lift to 3D floating point with z = 0
    pub fn to_loop3(&self) -> Loop3 {
        self.points
            .iter()
            .map(|p| Point3::new(p.x as f64, p.y as f64, 0.0))
            .collect()
    }
}

/// Per-contour hierarchy record: the contour that immediately encloses it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HierarchyNode {
    pub parent: Option<usize>,
}

impl HierarchyNode {
    pub fn root() -> Self {
        Self { parent: None }
    }

    pub fn child_of(parent: usize) -> Self {
        Self {
            parent: Some(parent),
        }
    }
}

/// Containment tree stored as an arena of parent links
///
/// Node `i` describes contour `i` of the owning set. Depth is never stored;
/// it is derived by walking the parent chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    pub nodes: Vec<HierarchyNode>,
}

impl Hierarchy {
    pub fn new(nodes: Vec<HierarchyNode>) -> Self {
        Self { nodes }
    }

    /// Hierarchy where every contour is a root
    pub fn flat(len: usize) -> Self {
        Self {
            nodes: vec![HierarchyNode::root(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Indices of contours without a parent
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(i, _)| i)
    }

    /// Depth of contour `index`: number of enclosing ancestors
    pub fn depth(&self, index: usize) -> Result<usize> {
        let node = self.nodes.get(index).ok_or(Error::HierarchyCorruption {
            index,
            parent: index,
            reason: "contour index out of range",
        })?;

        let mut depth = 0;
        let mut current = index;
        let mut next = node.parent;
        while let Some(parent) = next {
            if parent >= self.nodes.len() {
                return Err(Error::HierarchyCorruption {
                    index: current,
                    parent,
                    reason: "parent index out of range",
                });
            }
            depth += 1;
            // A chain longer than the arena must revisit a node
            if depth > self.nodes.len() {
                return Err(Error::HierarchyCorruption {
                    index,
                    parent,
                    reason: "parent chain forms a cycle",
                });
            }
            current = parent;
            next = self.nodes[current].parent;
        }
        Ok(depth)
    }

    /// Depth of every contour, in contour order
    pub fn depths(&self) -> Result<Vec<usize>> {
        (0..self.nodes.len()).map(|i| self.depth(i)).collect()
    }

    /// Check that every parent link is in range and acyclic
    pub fn validate(&self) -> Result<()> {
        self.depths().map(|_| ())
    }
}

/// Traced contours of one image plus the raster size they came from
#[derive(Debug, Clone, Default)]
pub struct ContourSet {
    pub contours: Vec<Contour>,
    pub hierarchy: Hierarchy,
    /// Source image height in pixels
    pub height: u32,
    /// Source image width in pixels
    pub width: u32,
}

impl ContourSet {
    pub fn new(contours: Vec<Contour>, hierarchy: Hierarchy, height: u32, width: u32) -> Self {
        Self {
            contours,
            hierarchy,
            height,
            width,
        }
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

/// Axis-aligned frame matching the source image footprint
///
/// Corners are ordered `(0,0)`, `(0,H)`, `(W,0)`, `(W,H)` in image
/// coordinates and are scaled exactly like the contours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub corners: [Point3<f64>; 4],
}

impl Extent {
    /// Frame for an image of `height` rows and `width` columns
    pub fn from_dimensions(height: u32, width: u32) -> Self {
        let h = height as f64;
        let w = width as f64;
        Self {
            corners: [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, h, 0.0),
                Point3::new(w, 0.0, 0.0),
                Point3::new(w, h, 0.0),
            ],
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        let scaled = scale_points(&self.corners, factor);
        Self {
            corners: [scaled[0], scaled[1], scaled[2], scaled[3]],
        }
    }

    /// Bounding box (min, max) of the corners
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
        let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);
        for c in &self.corners {
            min = min.inf(c);
            max = max.sup(c);
        }
        (min, max)
    }

    pub fn width(&self) -> f64 {
        let (min, max) = self.bounds();
        max.x - min.x
    }

    pub fn height(&self) -> f64 {
        let (min, max) = self.bounds();
        max.y - min.y
    }
}

/// Cyclic moving average over [`SMOOTHING_WINDOW`] points
///
/// Point `i` becomes the mean of points `i`, `i+1`, `i+2` (wrapping around),
/// rounded to two decimals. Loops shorter than the window average only the
/// points they have. Point count never changes.
pub fn smooth_loop(points: &[Point3<f64>]) -> Loop3 {
    let n = points.len();
    let window = SMOOTHING_WINDOW.min(n);

    (0..n)
        .map(|i| {
            let sum = (0..window).fold(Vector3::zeros(), |acc, k| acc + points[(i + k) % n].coords);
            let mean = sum / window as f64;
            Point3::new(round2(mean.x), round2(mean.y), round2(mean.z))
        })
        .collect()
}

#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Uniform scale of every coordinate
pub fn scale_points(points: &[Point3<f64>], factor: f64) -> Loop3 {
    points
        .iter()
        .map(|p| Point3::from(p.coords * factor))
        .collect()
}

/// Factor that maps `height_px` pixels onto `mesh_height` world units
pub fn scale_factor(mesh_height: f64, height_px: u32) -> Result<f64> {
    if mesh_height <= 0.0 || !mesh_height.is_finite() || height_px == 0 {
        return Err(Error::InvalidScale {
            mesh_height,
            height_px,
        });
    }
    Ok(mesh_height / height_px as f64)
}

/// Smoothed and scaled loops of one image, ready for topology resolution
#[derive(Debug, Clone)]
pub struct PreparedContours {
    pub loops: Vec<Loop3>,
    pub hierarchy: Hierarchy,
    pub extent: Extent,
}

/// Lift, smooth and scale every contour of `set`, and scale its extent
pub fn prepare_contours(set: &ContourSet, mesh_height: f64) -> Result<PreparedContours> {
    let factor = scale_factor(mesh_height, set.height)?;

    let loops = set
        .contours
        .iter()
        .map(|contour| scale_points(&smooth_loop(&contour.to_loop3()), factor))
        .collect();

    Ok(PreparedContours {
        loops,
        hierarchy: set.hierarchy.clone(),
        extent: Extent::from_dimensions(set.height, set.width).scaled(factor),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_loop() -> Loop3 {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ]
    }

    #[test]
    fn test_smooth_preserves_point_count() {
        for n in 0..12 {
            let points: Loop3 = (0..n)
                .map(|i| Point3::new(i as f64, (i * i) as f64, 0.0))
                .collect();
            assert_eq!(smooth_loop(&points).len(), n);
        }
    }

    #[test]
    fn test_smooth_cyclic_window() {
        let smoothed = smooth_loop(&square_loop());
        // (0,0) (3,0) (3,3) -> (2, 1)
        assert_eq!(smoothed[0], Point3::new(2.0, 1.0, 0.0));
        // Last window wraps: (0,3) (0,0) (3,0) -> (1, 1)
        assert_eq!(smoothed[3], Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_smooth_rounds_to_two_decimals() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let smoothed = smooth_loop(&points);
        assert_eq!(smoothed[0], Point3::new(0.67, 0.33, 0.0));
    }

    #[test]
    fn test_smooth_short_loops_do_not_pull_towards_origin() {
        let single = vec![Point3::new(10.0, 20.0, 0.0)];
        assert_eq!(smooth_loop(&single), single);

        let pair = vec![Point3::new(10.0, 20.0, 0.0), Point3::new(20.0, 20.0, 0.0)];
        let smoothed = smooth_loop(&pair);
        assert_eq!(smoothed[0], Point3::new(15.0, 20.0, 0.0));
        assert_eq!(smoothed[1], Point3::new(15.0, 20.0, 0.0));
    }

    #[test]
    fn test_scale_is_linear() {
        let points = square_loop();
        let (s, t) = (0.37, 2.5);
        let twice = scale_points(&scale_points(&points, s), t);
        let once = scale_points(&points, s * t);
        for (a, b) in twice.iter().zip(&once) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_scale_factor_validation() {
        assert_relative_eq!(scale_factor(1.7, 340).unwrap(), 0.005);
        assert!(scale_factor(0.0, 100).is_err());
        assert!(scale_factor(-1.0, 100).is_err());
        assert!(scale_factor(1.0, 0).is_err());
        assert!(scale_factor(f64::NAN, 10).is_err());
    }

    #[test]
    fn test_extent_scaled_height_matches_mesh_height() {
        let extent = Extent::from_dimensions(200, 100);
        let factor = scale_factor(1.7, 200).unwrap();
        let scaled = extent.scaled(factor);
        assert_relative_eq!(scaled.height(), 1.7, epsilon = 1e-12);
        assert_relative_eq!(scaled.width(), 0.85, epsilon = 1e-12);
    }

    #[test]
    fn test_depths_follow_parent_chain() {
        let hierarchy = Hierarchy::new(vec![
            HierarchyNode::root(),
            HierarchyNode::child_of(0),
            HierarchyNode::child_of(1),
            HierarchyNode::root(),
            HierarchyNode::child_of(2),
        ]);
        let depths = hierarchy.depths().unwrap();
        assert_eq!(depths, vec![0, 1, 2, 0, 3]);
        for (i, node) in hierarchy.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                assert_eq!(depths[parent] + 1, depths[i]);
            }
        }
        assert_eq!(hierarchy.roots().collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn test_out_of_range_parent_is_corruption() {
        let hierarchy = Hierarchy::new(vec![HierarchyNode::root(), HierarchyNode::child_of(7)]);
        assert!(matches!(
            hierarchy.validate(),
            Err(Error::HierarchyCorruption { index: 1, parent: 7, .. })
        ));
    }

    #[test]
    fn test_depth_of_missing_contour_is_corruption() {
        let hierarchy = Hierarchy::new(vec![HierarchyNode::root(), HierarchyNode::child_of(0)]);
        assert_eq!(hierarchy.depth(1).unwrap(), 1);
        assert!(matches!(
            hierarchy.depth(2),
            Err(Error::HierarchyCorruption { index: 2, .. })
        ));
    }

    #[test]
    fn test_parent_cycle_is_corruption() {
        let hierarchy = Hierarchy::new(vec![HierarchyNode::child_of(1), HierarchyNode::child_of(0)]);
        assert!(matches!(
            hierarchy.depth(0),
            Err(Error::HierarchyCorruption { .. })
        ));
    }

    #[test]
    fn test_prepare_contours() {
        let contour = Contour::new(vec![
            Point2::new(0, 0),
            Point2::new(10, 0),
            Point2::new(10, 10),
            Point2::new(0, 10),
        ]);
        let set = ContourSet::new(vec![contour], Hierarchy::flat(1), 10, 20);
        let prepared = prepare_contours(&set, 1.0).unwrap();
        assert_eq!(prepared.loops.len(), 1);
        assert_eq!(prepared.loops[0].len(), 4);
        // Smoothed (6.67, 3.33) scaled by 0.1
        assert_relative_eq!(prepared.loops[0][0].x, 0.667, epsilon = 1e-9);
        assert_relative_eq!(prepared.extent.width(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(prepared.extent.height(), 1.0, epsilon = 1e-12);
    }
}
