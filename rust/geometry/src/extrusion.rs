// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capping and solidifying contour loops

use crate::contour::Loop3;
use crate::error::Result;
use crate::mesh::Mesh;
use crate::triangulation::{clean_loop, signed_area_xy, triangulate_polygon};
use nalgebra::{Point2, Point3, Vector3};

/// Loops with less area than this cannot carry a face
const MIN_CAP_AREA: f64 = 1e-12;

/// Triangulated loop, counter-clockwise in the XY plane
#[derive(Debug, Clone)]
pub struct Cap {
    pub points: Vec<Point3<f64>>,
    pub indices: Vec<usize>,
}

/// Triangulate a single loop into a cap
///
/// Duplicate points are welded and the loop is rewound counter-clockwise so
/// the cap faces +Z. Returns `Ok(None)` for loops too small to carry a face
/// (single pixels, slivers); those are kept as outline only.
pub fn cap_loop(points: &[Point3<f64>]) -> Result<Option<Cap>> {
    let mut cleaned = clean_loop(points);
    if cleaned.len() < 3 {
        return Ok(None);
    }

    let area = signed_area_xy(&cleaned);
    if area.abs() < MIN_CAP_AREA {
        return Ok(None);
    }
    if area < 0.0 {
        cleaned.reverse();
    }

    let flat: Vec<Point2<f64>> = cleaned.iter().map(|p| Point2::new(p.x, p.y)).collect();
    let indices = triangulate_polygon(&flat)?;

    Ok(Some(Cap {
        points: cleaned,
        indices,
    }))
}

/// Flat mesh with one face per loop, all facing +Z
///
/// Every loop also contributes its boundary edges. Loops that cannot be
/// capped still contribute their vertices and edges.
pub fn cap_loops(loops: &[Loop3]) -> Result<Mesh> {
    let mut mesh = Mesh::new();

    for points in loops {
        match cap_loop(points)? {
            Some(cap) => {
                let base_index = mesh.vertex_count() as u32;
                create_cap_mesh(&cap, None, true, &mut mesh);
                add_loop_edges(base_index, cap.points.len(), &mut mesh);
            }
            None => {
                let outline = clean_loop(points);
                let base_index = mesh.vertex_count() as u32;
                for p in &outline {
                    mesh.add_vertex(*p, Vector3::z());
                }
                if outline.len() > 1 {
                    add_loop_edges(base_index, outline.len(), &mut mesh);
                }
            }
        }
    }

    Ok(mesh)
}

/// Closed solid grown symmetrically from the loops' plane
///
/// Each loop becomes a prism spanning `z ± thickness / 2` with outward
/// facing caps and walls. Loops that cannot be capped are skipped.
pub fn solidify(loops: &[Loop3], thickness: f64) -> Result<Mesh> {
    let half = thickness / 2.0;
    let mut mesh = Mesh::new();

    for points in loops {
        let Some(cap) = cap_loop(points)? else {
            continue;
        };
        create_cap_mesh(&cap, Some(-half), false, &mut mesh);
        create_cap_mesh(&cap, Some(half), true, &mut mesh);
        create_side_walls(&cap.points, -half, half, &mut mesh);
    }

    Ok(mesh)
}

/// Append the cap triangles, optionally moved to height `z`
fn create_cap_mesh(cap: &Cap, z: Option<f64>, facing_up: bool, mesh: &mut Mesh) {
    let base_index = mesh.vertex_count() as u32;
    let normal = if facing_up { Vector3::z() } else { -Vector3::z() };

    for point in &cap.points {
        let position = match z {
            Some(z) => Point3::new(point.x, point.y, point.z + z),
            None => *point,
        };
        mesh.add_vertex(position, normal);
    }

    for tri in cap.indices.chunks_exact(3) {
        let i0 = base_index + tri[0] as u32;
        let i1 = base_index + tri[1] as u32;
        let i2 = base_index + tri[2] as u32;

        if facing_up {
            mesh.add_triangle(i0, i1, i2);
        } else {
            mesh.add_triangle(i0, i2, i1);
        }
    }
}

/// Outward facing walls of a counter-clockwise boundary
fn create_side_walls(boundary: &[Point3<f64>], z_start: f64, z_end: f64, mesh: &mut Mesh) {
    for i in 0..boundary.len() {
        let p0 = &boundary[i];
        let p1 = &boundary[(i + 1) % boundary.len()];

        let edge = p1 - p0;
        let normal = match Vector3::new(edge.y, -edge.x, 0.0).try_normalize(1e-10) {
            Some(n) => n,
            None => continue,
        };

        let idx = mesh.add_vertex(Point3::new(p0.x, p0.y, p0.z + z_start), normal);
        mesh.add_vertex(Point3::new(p1.x, p1.y, p1.z + z_start), normal);
        mesh.add_vertex(Point3::new(p1.x, p1.y, p1.z + z_end), normal);
        mesh.add_vertex(Point3::new(p0.x, p0.y, p0.z + z_end), normal);

        mesh.add_triangle(idx, idx + 1, idx + 2);
        mesh.add_triangle(idx, idx + 2, idx + 3);
    }
}

fn add_loop_edges(base_index: u32, len: usize, mesh: &mut Mesh) {
    // Two points close into a single segment
    if len == 2 {
        mesh.add_edge(base_index, base_index + 1);
        return;
    }
    let len = len as u32;
    for i in 0..len {
        mesh.add_edge(base_index + i, base_index + (i + 1) % len);
    }
}
