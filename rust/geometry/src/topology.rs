// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contour topology resolution
//!
//! Turns scaled loops and their containment tree into capped meshes. In flat
//! mode every outermost contour is filled and nesting is ignored. In
//! hole-aware mode contours at even depth are filled and the contours one
//! level deeper are carved out of them, so a ring becomes a ring and an
//! island inside a hole becomes a separate filled level.

use crate::contour::{Hierarchy, Loop3, PreparedContours};
use crate::csg::carve;
use crate::error::{Error, Result};
use crate::extrusion::cap_loops;
use crate::mesh::Mesh;
use std::collections::BTreeMap;

/// Capped geometry of one fill level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelMesh {
    /// Hierarchy depth of the filled contours (always even in hole-aware mode)
    pub level: usize,
    pub mesh: Mesh,
}

/// Resolve prepared contours into level meshes
pub fn resolve(prepared: &PreparedContours, holes: bool) -> Result<Vec<LevelMesh>> {
    if holes {
        resolve_levels(&prepared.loops, &prepared.hierarchy)
    } else {
        Ok(vec![resolve_flat(&prepared.loops, &prepared.hierarchy)?])
    }
}

/// Cap every root contour into a single level-0 mesh
pub fn resolve_flat(loops: &[Loop3], hierarchy: &Hierarchy) -> Result<LevelMesh> {
    check_lengths(loops, hierarchy)?;

    let roots: Vec<Loop3> = hierarchy.roots().map(|i| loops[i].clone()).collect();
    Ok(LevelMesh {
        level: 0,
        mesh: cap_loops(&roots)?,
    })
}

/// Fill every even depth and carve the next depth out of it
pub fn resolve_levels(loops: &[Loop3], hierarchy: &Hierarchy) -> Result<Vec<LevelMesh>> {
    check_lengths(loops, hierarchy)?;
    let depths = hierarchy.depths()?;

    let mut by_depth: BTreeMap<usize, Vec<Loop3>> = BTreeMap::new();
    for (points, depth) in loops.iter().zip(&depths) {
        by_depth.entry(*depth).or_default().push(points.clone());
    }

    let mut levels = Vec::new();
    for (&level, fill) in by_depth.iter().filter(|(depth, _)| *depth % 2 == 0) {
        let voids = by_depth.get(&(level + 1)).map(Vec::as_slice).unwrap_or(&[]);

        let mesh = if voids.is_empty() {
            cap_loops(fill)?
        } else {
            carve(fill, voids)?
        };

        tracing::debug!(
            level,
            fills = fill.len(),
            voids = voids.len(),
            "resolved fill level"
        );
        levels.push(LevelMesh { level, mesh });
    }

    Ok(levels)
}

/// Merge all level meshes into one, in ascending level order
pub fn join(levels: &[LevelMesh]) -> Mesh {
    let mut joined = Mesh::new();
    for level in levels {
        joined.merge(&level.mesh);
    }
    joined
}

fn check_lengths(loops: &[Loop3], hierarchy: &Hierarchy) -> Result<()> {
    if loops.len() != hierarchy.len() {
        return Err(Error::HierarchyMismatch {
            contours: loops.len(),
            nodes: hierarchy.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::HierarchyNode;
    use nalgebra::Point3;

    fn square(min: f64, max: f64) -> Loop3 {
        vec![
            Point3::new(min, min, 0.0),
            Point3::new(max, min, 0.0),
            Point3::new(max, max, 0.0),
            Point3::new(min, max, 0.0),
        ]
    }

    #[test]
    fn test_flat_keeps_roots_only() {
        let loops = vec![square(0.0, 4.0), square(1.0, 3.0), square(5.0, 6.0)];
        let hierarchy = Hierarchy::new(vec![
            HierarchyNode::root(),
            HierarchyNode::child_of(0),
            HierarchyNode::root(),
        ]);
        let level = resolve_flat(&loops, &hierarchy).unwrap();
        assert_eq!(level.level, 0);
        assert_eq!(level.mesh.vertex_count(), 8);
    }

    #[test]
    fn test_all_roots_match_flat_mode() {
        let loops = vec![square(0.0, 1.0), square(2.0, 3.0)];
        let hierarchy = Hierarchy::flat(2);

        let flat = join(&[resolve_flat(&loops, &hierarchy).unwrap()]);
        let levels = resolve_levels(&loops, &hierarchy).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(join(&levels), flat);
    }

    #[test]
    fn test_levels_are_even_and_ascending() {
        // Square, hole, island in the hole, hole in the island
        let loops = vec![
            square(0.0, 10.0),
            square(1.0, 9.0),
            square(2.0, 8.0),
            square(3.0, 7.0),
        ];
        let hierarchy = Hierarchy::new(vec![
            HierarchyNode::root(),
            HierarchyNode::child_of(0),
            HierarchyNode::child_of(1),
            HierarchyNode::child_of(2),
        ]);
        let levels = resolve_levels(&loops, &hierarchy).unwrap();
        let depths: Vec<usize> = levels.iter().map(|l| l.level).collect();
        assert_eq!(depths, vec![0, 2]);
        assert!(levels.iter().all(|l| !l.mesh.is_empty()));
    }

    #[test]
    fn test_fill_level_without_void_is_capped() {
        let loops = vec![square(0.0, 10.0), square(1.0, 9.0), square(2.0, 8.0)];
        let hierarchy = Hierarchy::new(vec![
            HierarchyNode::root(),
            HierarchyNode::child_of(0),
            HierarchyNode::child_of(1),
        ]);
        let levels = resolve_levels(&loops, &hierarchy).unwrap();
        assert_eq!(levels[1].level, 2);
        assert_eq!(levels[1].mesh, cap_loops(&[square(2.0, 8.0)]).unwrap());
    }

    #[test]
    fn test_corrupt_hierarchy_is_rejected() {
        let loops = vec![square(0.0, 1.0), square(2.0, 3.0)];
        let out_of_range = Hierarchy::new(vec![HierarchyNode::root(), HierarchyNode::child_of(7)]);
        assert!(matches!(
            resolve_levels(&loops, &out_of_range),
            Err(Error::HierarchyCorruption { .. })
        ));

        let cycle = Hierarchy::new(vec![HierarchyNode::child_of(1), HierarchyNode::child_of(0)]);
        assert!(matches!(
            resolve_levels(&loops, &cycle),
            Err(Error::HierarchyCorruption { .. })
        ));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let loops = vec![square(0.0, 1.0)];
        assert!(matches!(
            resolve(
                &PreparedContours {
                    loops,
                    hierarchy: Hierarchy::flat(2),
                    extent: crate::contour::Extent::from_dimensions(1, 1),
                },
                false
            ),
            Err(Error::HierarchyMismatch { .. })
        ));
    }
}
