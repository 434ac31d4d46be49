// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Carving holes out of flat caps with csgrs boolean operations
//!
//! Both operands are solidified into thin prisms so the BSP boolean sees
//! closed volumes. The fill prism is thinner than the void prism, which keeps
//! every fill face strictly inside the void's Z range and avoids coplanar
//! faces. After subtraction only the fill's top face survives the filter, is
//! welded into shared vertices and lowered back onto the loops' plane.
//!
//! The boolean runs in a unit frame fitted to the fill loops, so thicknesses
//! and tolerances hold at any world scale.

use crate::contour::Loop3;
use crate::error::Result;
use crate::extrusion::{cap_loops, solidify};
use crate::mesh::Mesh;
use crate::triangulation::{calculate_polygon_normal, project_to_2d, triangulate_polygon};
use crate::vector::EPSILON;
use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;

/// Thickness of the void solid, in unit-frame lengths
pub const VOID_THICKNESS: f64 = 0.5;

/// Thickness of the temporary fill solid, always thinner than the void
const FILL_THICKNESS: f64 = 0.1;

/// Tolerance for plane membership and vertex welding, in unit-frame lengths
const PLANE_TOLERANCE: f64 = 1e-6;

/// Subtract the void loops from the capped fill loops
///
/// Returns a flat mesh on the fill loops' plane facing +Z, with coincident
/// vertices shared between triangles. Without voids the plain cap of the fill
/// loops is returned.
pub fn carve(fill: &[Loop3], voids: &[Loop3]) -> Result<Mesh> {
    let frame = UnitFrame::around(fill);
    let void_solid = solidify(&frame.to_local(voids), VOID_THICKNESS)?;
    if void_solid.is_empty() {
        return cap_loops(fill);
    }

    let fill_solid = solidify(&frame.to_local(fill), FILL_THICKNESS)?;
    let carved = subtract_mesh(&fill_solid, &void_solid)?;

    let top = FILL_THICKNESS / 2.0;
    let mut face = weld(&keep_in_plane(&carved, top, &Vector3::z()));
    face.edges = boundary_edges(&face);
    face.translate(&Vector3::new(0.0, 0.0, -top));
    frame.to_world(&mut face);

    tracing::debug!(
        fill = fill.len(),
        voids = voids.len(),
        vertices = face.vertex_count(),
        triangles = face.triangle_count(),
        "carved fill level"
    );

    Ok(face)
}

/// Similarity mapping the fill loops' bounding box onto a unit square
struct UnitFrame {
    origin: Vector3<f64>,
    size: f64,
}

impl UnitFrame {
    fn around(loops: &[Loop3]) -> Self {
        let mut points = loops.iter().flatten();
        let Some(first) = points.next() else {
            return Self {
                origin: Vector3::zeros(),
                size: 1.0,
            };
        };

        let (min, max) = points.fold((first.coords, first.coords), |(min, max), p| {
            (min.inf(&p.coords), max.sup(&p.coords))
        });
        let extent = max - min;
        let size = extent.x.max(extent.y);

        Self {
            origin: min,
            size: if size > EPSILON { size } else { 1.0 },
        }
    }

    fn to_local(&self, loops: &[Loop3]) -> Vec<Loop3> {
        loops
            .iter()
            .map(|points| {
                points
                    .iter()
                    .map(|p| Point3::from((p.coords - self.origin) / self.size))
                    .collect()
            })
            .collect()
    }

    fn to_world(&self, mesh: &mut Mesh) {
        mesh.scale(self.size);
        mesh.translate(&self.origin);
    }
}

/// Subtract one closed mesh from another using csgrs
pub fn subtract_mesh(host_mesh: &Mesh, opening_mesh: &Mesh) -> Result<Mesh> {
    use csgrs::traits::CSG;

    if opening_mesh.is_empty() {
        return Ok(host_mesh.clone());
    }

    let host_csg = mesh_to_csgrs(host_mesh);
    let opening_csg = mesh_to_csgrs(opening_mesh);

    let result_csg = host_csg.difference(&opening_csg);

    Ok(csgrs_to_mesh(&result_csg))
}

/// Triangles lying in the plane `z = height` whose face normal matches `facing`
pub fn keep_in_plane(mesh: &Mesh, height: f64, facing: &Vector3<f64>) -> Mesh {
    let mut result = Mesh::new();

    for tri in mesh.indices.chunks_exact(3) {
        let v0 = mesh.position(tri[0] as usize);
        let v1 = mesh.position(tri[1] as usize);
        let v2 = mesh.position(tri[2] as usize);

        if [v0, v1, v2]
            .iter()
            .any(|v| (v.z - height).abs() > PLANE_TOLERANCE)
        {
            continue;
        }

        let normal = match (v1 - v0).cross(&(v2 - v0)).try_normalize(1e-12) {
            Some(n) => n,
            None => continue,
        };
        if normal.dot(facing) < 1.0 - PLANE_TOLERANCE {
            continue;
        }

        let i0 = result.add_vertex(v0, normal);
        let i1 = result.add_vertex(v1, normal);
        let i2 = result.add_vertex(v2, normal);
        result.add_triangle(i0, i1, i2);
    }

    result
}

/// For every vertex, the first vertex at the same position within tolerance
fn weld_map(mesh: &Mesh) -> Vec<u32> {
    let quantize = |p: Point3<f64>| {
        (
            (p.x / PLANE_TOLERANCE).round() as i64,
            (p.y / PLANE_TOLERANCE).round() as i64,
            (p.z / PLANE_TOLERANCE).round() as i64,
        )
    };

    let mut welded: FxHashMap<(i64, i64, i64), u32> = FxHashMap::default();
    (0..mesh.vertex_count())
        .map(|i| *welded.entry(quantize(mesh.position(i))).or_insert(i as u32))
        .collect()
}

/// Rebuild `mesh` with coincident vertices shared
///
/// Triangles collapsed by the weld are dropped. Edges are not carried over.
pub fn weld(mesh: &Mesh) -> Mesh {
    let canonical = weld_map(mesh);
    let mut remap: FxHashMap<u32, u32> = FxHashMap::default();
    let mut result = Mesh::new();

    for tri in mesh.indices.chunks_exact(3) {
        let corners = [
            canonical[tri[0] as usize],
            canonical[tri[1] as usize],
            canonical[tri[2] as usize],
        ];
        if corners[0] == corners[1] || corners[1] == corners[2] || corners[0] == corners[2] {
            continue;
        }

        let [i0, i1, i2] = corners.map(|source| {
            *remap.entry(source).or_insert_with(|| {
                result.add_vertex(mesh.position(source as usize), mesh.normal(source as usize))
            })
        });
        result.add_triangle(i0, i1, i2);
    }

    result
}

/// Edges used by exactly one triangle, with coincident vertices welded
pub fn boundary_edges(mesh: &Mesh) -> Vec<[u32; 2]> {
    let canonical = weld_map(mesh);

    let mut counts: FxHashMap<(u32, u32), (usize, [u32; 2])> = FxHashMap::default();
    for tri in mesh.indices.chunks_exact(3) {
        for k in 0..3 {
            let a = canonical[tri[k] as usize];
            let b = canonical[tri[(k + 1) % 3] as usize];
            if a == b {
                continue;
            }
            let key = (a.min(b), a.max(b));
            counts.entry(key).or_insert((0, [a, b])).0 += 1;
        }
    }

    let mut edges: Vec<[u32; 2]> = counts
        .into_values()
        .filter(|(count, _)| *count == 1)
        .map(|(_, edge)| edge)
        .collect();
    edges.sort_unstable();
    edges
}

fn mesh_to_csgrs(mesh: &Mesh) -> csgrs::mesh::Mesh<()> {
    use csgrs::mesh::{polygon::Polygon, vertex::Vertex, Mesh as CSGMesh};
    use std::sync::OnceLock;

    if mesh.is_empty() {
        return CSGMesh {
            polygons: Vec::new(),
            bounding_box: OnceLock::new(),
            metadata: None,
        };
    }

    let mut polygons = Vec::with_capacity(mesh.triangle_count());

    for tri in mesh.indices.chunks_exact(3) {
        let v0 = mesh.position(tri[0] as usize);
        let v1 = mesh.position(tri[1] as usize);
        let v2 = mesh.position(tri[2] as usize);

        // Degenerate triangles would poison the BSP planes with NaN
        let face_normal = match (v1 - v0).cross(&(v2 - v0)).try_normalize(1e-10) {
            Some(n) => n,
            None => continue,
        };

        let vertices = vec![
            Vertex::new(v0, face_normal),
            Vertex::new(v1, face_normal),
            Vertex::new(v2, face_normal),
        ];

        polygons.push(Polygon::new(vertices, None));
    }

    CSGMesh::from_polygons(&polygons, None)
}

fn csgrs_to_mesh(csg_mesh: &csgrs::mesh::Mesh<()>) -> Mesh {
    let mut mesh = Mesh::new();

    for polygon in &csg_mesh.polygons {
        let vertices = &polygon.vertices;
        if vertices.len() < 3 {
            continue;
        }

        let points: Vec<Point3<f64>> = vertices
            .iter()
            .map(|v| Point3::new(v.pos[0], v.pos[1], v.pos[2]))
            .collect();

        let raw_normal = Vector3::new(
            vertices[0].normal[0],
            vertices[0].normal[1],
            vertices[0].normal[2],
        );
        let normal = match raw_normal.try_normalize(1e-10) {
            Some(n) if n.iter().all(|c| c.is_finite()) => n,
            _ => match calculate_polygon_normal(&points).try_normalize(1e-10) {
                Some(n) => n,
                None => continue,
            },
        };

        let base_idx = mesh.vertex_count() as u32;
        for p in &points {
            mesh.add_vertex(*p, normal);
        }

        if points.len() == 3 {
            mesh.add_triangle(base_idx, base_idx + 1, base_idx + 2);
            continue;
        }

        // Projection along the polygon normal keeps the winding
        let (points_2d, _, _, _) = project_to_2d(&points, &normal);
        let indices = match triangulate_polygon(&points_2d) {
            Ok(idx) => idx,
            Err(_) => continue,
        };

        for tri in indices.chunks_exact(3) {
            mesh.add_triangle(
                base_idx + tri[0] as u32,
                base_idx + tri[1] as u32,
                base_idx + tri[2] as u32,
            );
        }
    }

    mesh
}
