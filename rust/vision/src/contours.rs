// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hierarchical contour tracing of alpha masks
//!
//! Masks are blurred and binarized, then traced with Suzuki-Abe border
//! following, which reports every outer border and hole border together with
//! the border that immediately encloses it.

use crate::image_ops::binarize;
use cutout3d_geometry::{Contour, ContourSet, Hierarchy, HierarchyNode};
use image::GrayImage;
use imageproc::contours::Contour as TracedContour;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// How many boundary points each contour keeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContourPrecision {
    /// Straight runs collapse to their end points
    #[default]
    Fast,
    /// Every boundary pixel is kept
    Detailed,
}

/// Which part of the containment tree is returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    /// Outermost borders only; holes are ignored
    #[default]
    OuterOnly,
    /// All borders with their parent links
    FullTree,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceOptions {
    pub precision: ContourPrecision,
    pub mode: TraceMode,
}

impl TraceOptions {
    pub fn new(precision: ContourPrecision, holes: bool) -> Self {
        Self {
            precision,
            mode: if holes { TraceMode::FullTree } else { TraceMode::OuterOnly },
        }
    }
}

/// Trace the foreground borders of an alpha mask
pub fn find_contours(mask: &GrayImage, options: &TraceOptions) -> ContourSet {
    let binary = binarize(mask);
    let traced: Vec<TracedContour<i32>> = imageproc::contours::find_contours(&binary);

    let (contours, hierarchy) = match options.mode {
        TraceMode::FullTree => {
            let nodes = traced
                .iter()
                .map(|c| HierarchyNode { parent: c.parent })
                .collect();
            let contours = traced
                .iter()
                .map(|c| to_contour(c, options.precision))
                .collect();
            (contours, Hierarchy::new(nodes))
        }
        TraceMode::OuterOnly => {
            let contours: Vec<Contour> = traced
                .iter()
                .filter(|c| c.parent.is_none())
                .map(|c| to_contour(c, options.precision))
                .collect();
            let hierarchy = Hierarchy::flat(contours.len());
            (contours, hierarchy)
        }
    };

    tracing::debug!(
        traced = traced.len(),
        kept = contours.len(),
        mode = ?options.mode,
        "traced contours"
    );

    ContourSet::new(contours, hierarchy, mask.height(), mask.width())
}

fn to_contour(traced: &TracedContour<i32>, precision: ContourPrecision) -> Contour {
    let points: Vec<Point2<i32>> = traced.points.iter().map(|p| Point2::new(p.x, p.y)).collect();
    match precision {
        ContourPrecision::Detailed => Contour::new(points),
        ContourPrecision::Fast => Contour::new(compress_chain(&points)),
    }
}

/// Drop every point whose incoming and outgoing steps are the same
///
/// Border pixels are 8-connected, so this collapses horizontal, vertical and
/// diagonal runs to their corner points. The loop is treated as cyclic.
pub fn compress_chain(points: &[Point2<i32>]) -> Vec<Point2<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let compressed: Vec<Point2<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            points[i] - prev != next - points[i]
        })
        .map(|i| points[i])
        .collect();

    if compressed.is_empty() {
        vec![points[0]]
    } else {
        compressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Opaque square with a square hole and an island inside the hole
    fn nested_mask() -> GrayImage {
        GrayImage::from_fn(60, 60, |x, y| {
            let inside = |lo: u32, hi: u32| x >= lo && x < hi && y >= lo && y < hi;
            let opaque = (inside(5, 55) && !inside(15, 45)) || inside(25, 35);
            Luma([if opaque { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_full_tree_depths() {
        let set = find_contours(&nested_mask(), &TraceOptions::new(ContourPrecision::Fast, true));
        assert_eq!(set.len(), 3);
        assert_eq!((set.height, set.width), (60, 60));

        let mut depths = set.hierarchy.depths().unwrap();
        depths.sort_unstable();
        assert_eq!(depths, vec![0, 1, 2]);
    }

    #[test]
    fn test_outer_only_keeps_roots() {
        let set = find_contours(&nested_mask(), &TraceOptions::new(ContourPrecision::Fast, false));
        assert_eq!(set.len(), 1);
        assert_eq!(set.hierarchy, Hierarchy::flat(1));
    }

    #[test]
    fn test_fast_compresses_runs_to_corners() {
        let mask = GrayImage::from_fn(20, 20, |x, y| {
            Luma([if (4..16).contains(&x) && (4..16).contains(&y) { 255 } else { 0 }])
        });
        let fast = find_contours(&mask, &TraceOptions::new(ContourPrecision::Fast, false));
        let detailed = find_contours(&mask, &TraceOptions::new(ContourPrecision::Detailed, false));

        // The blur chamfers each corner into a short diagonal, so the
        // compressed loop is an octagon
        assert_eq!(fast.contours[0].len(), 8);
        assert!(detailed.contours[0].len() > 4 * 8);
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let set = find_contours(&GrayImage::new(8, 8), &TraceOptions::default());
        assert!(set.is_empty());
        assert_eq!(set.height, 8);
    }

    #[test]
    fn test_compress_chain_diagonal() {
        let points = vec![
            Point2::new(0, 0),
            Point2::new(1, 1),
            Point2::new(2, 2),
            Point2::new(1, 2),
            Point2::new(0, 2),
            Point2::new(0, 1),
        ];
        assert_eq!(
            compress_chain(&points),
            vec![Point2::new(0, 0), Point2::new(2, 2), Point2::new(0, 2)]
        );
    }

    #[test]
    fn test_compress_chain_keeps_short_loops() {
        let single = vec![Point2::new(3, 4)];
        assert_eq!(compress_chain(&single), single);
    }
}
