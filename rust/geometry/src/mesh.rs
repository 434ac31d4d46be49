// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Polygon mesh with triangulated faces
///
/// Vertices without triangles are allowed; the extent frame corners of an
/// assembled cutout are kept as loose vertices so that every mesh carries
/// the footprint of its source image.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Texture coordinates (u, v); empty until UVs are generated
    pub uvs: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
    /// Boundary edges (index pairs)
    pub edges: Vec<[u32; 2]>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Add a vertex with normal, returning its index
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) -> u32 {
        let index = self.vertex_count() as u32;

        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        self.normals.push(normal.x as f32);
        self.normals.push(normal.y as f32);
        self.normals.push(normal.z as f32);

        index
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Add a boundary edge
    #[inline]
    pub fn add_edge(&mut self, a: u32, b: u32) {
        self.edges.push([a, b]);
    }

    /// Position of vertex `index` in f64
    #[inline]
    pub fn position(&self, index: usize) -> Point3<f64> {
        Point3::new(
            self.positions[index * 3] as f64,
            self.positions[index * 3 + 1] as f64,
            self.positions[index * 3 + 2] as f64,
        )
    }

    /// Normal of vertex `index` in f64
    #[inline]
    pub fn normal(&self, index: usize) -> Vector3<f64> {
        Vector3::new(
            self.normals[index * 3] as f64,
            self.normals[index * 3 + 1] as f64,
            self.normals[index * 3 + 2] as f64,
        )
    }

    /// Whether every vertex carries a texture coordinate
    #[inline]
    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty() && self.uvs.len() / 2 == self.vertex_count()
    }

    /// Merge another mesh into this one
    ///
    /// Texture coordinates survive only when both sides carry them.
    #[inline]
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        let keep_uvs = (self.is_empty() || self.has_uvs()) && other.has_uvs();
        let vertex_offset = self.vertex_count() as u32;

        self.positions.reserve(other.positions.len());
        self.normals.reserve(other.normals.len());
        self.indices.reserve(other.indices.len());

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        if keep_uvs {
            self.uvs.extend_from_slice(&other.uvs);
        } else {
            self.uvs.clear();
        }

        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
        self.edges.extend(
            other
                .edges
                .iter()
                .map(|&[a, b]| [a + vertex_offset, b + vertex_offset]),
        );
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Calculate bounds (min, max)
    #[inline]
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        if self.is_empty() {
            return (Point3::origin(), Point3::origin());
        }

        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            let (x, y, z) = (chunk[0], chunk[1], chunk[2]);
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        });

        (min, max)
    }

    /// Move every vertex by `offset`
    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for chunk in self.positions.chunks_exact_mut(3) {
            chunk[0] = (chunk[0] as f64 + offset.x) as f32;
            chunk[1] = (chunk[1] as f64 + offset.y) as f32;
            chunk[2] = (chunk[2] as f64 + offset.z) as f32;
        }
    }

    /// Scale every vertex about the origin; normals are unchanged
    pub fn scale(&mut self, factor: f64) {
        for value in self.positions.iter_mut() {
            *value = (*value as f64 * factor) as f32;
        }
    }

    /// Reflect positions across the XZ plane (y becomes -y)
    ///
    /// Triangle winding is left untouched, so afterwards every face winds
    /// the opposite way to its stored normal until [`Mesh::flip_normals`]
    /// runs.
    pub fn mirror_y(&mut self) {
        for chunk in self.positions.chunks_exact_mut(3) {
            chunk[1] = -chunk[1];
        }
    }

    /// Reverse the winding of every triangle and recompute normals from it
    pub fn flip_normals(&mut self) {
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
        self.recompute_normals();
    }

    /// Rotate positions and normals about the origin
    pub fn rotate(&mut self, rotation: &UnitQuaternion<f64>) {
        for chunk in self.positions.chunks_exact_mut(3) {
            let p = rotation * Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            chunk[0] = p.x as f32;
            chunk[1] = p.y as f32;
            chunk[2] = p.z as f32;
        }
        for chunk in self.normals.chunks_exact_mut(3) {
            let n = rotation * Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            chunk[0] = n.x as f32;
            chunk[1] = n.y as f32;
            chunk[2] = n.z as f32;
        }
    }

    /// Calculate smooth normals from triangle winding
    ///
    /// Vertices that belong to no triangle get +Z.
    pub fn recompute_normals(&mut self) {
        let vertex_count = self.vertex_count();
        if vertex_count == 0 {
            return;
        }

        let mut normals = vec![Vector3::zeros(); vertex_count];

        // Accumulate face normals
        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let v0 = self.position(i0);
            let edge1 = self.position(i1) - v0;
            let edge2 = self.position(i2) - v0;
            let normal = edge1.cross(&edge2);

            normals[i0] += normal;
            normals[i1] += normal;
            normals[i2] += normal;
        }

        self.normals.clear();
        self.normals.reserve(vertex_count * 3);

        for normal in normals {
            let normalized = normal.try_normalize(1e-12).unwrap_or_else(Vector3::z);
            self.normals.push(normalized.x as f32);
            self.normals.push(normalized.y as f32);
            self.normals.push(normalized.z as f32);
        }
    }

    /// Normal of the first triangle, from its winding
    pub fn first_face_normal(&self) -> Option<Vector3<f64>> {
        let tri = self.indices.get(0..3)?;
        let v0 = self.position(tri[0] as usize);
        let edge1 = self.position(tri[1] as usize) - v0;
        let edge2 = self.position(tri[2] as usize) - v0;
        edge1.cross(&edge2).try_normalize(1e-12)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Unit;
    use std::f64::consts::FRAC_PI_2;

    fn unit_triangle() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0), Vector3::z());
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0), Vector3::z());
        mesh.add_vertex(Point3::new(0.0, 1.0, 0.0), Vector3::z());
        mesh.add_triangle(0, 1, 2);
        mesh.add_edge(0, 1);
        mesh
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.first_face_normal().is_none());
    }

    #[test]
    fn test_add_vertex() {
        let mut mesh = Mesh::new();
        let index = mesh.add_vertex(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(index, 0);
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.positions, vec![1.0, 2.0, 3.0]);
        assert_eq!(mesh.normals, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_merge_offsets_indices_and_edges() {
        let mut mesh = unit_triangle();
        mesh.merge(&unit_triangle());
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(&mesh.indices[3..], &[3, 4, 5]);
        assert_eq!(mesh.edges, vec![[0, 1], [3, 4]]);
    }

    #[test]
    fn test_merge_drops_partial_uvs() {
        let mut with_uvs = unit_triangle();
        with_uvs.uvs = vec![0.0; 6];

        let mut mesh = Mesh::new();
        mesh.merge(&with_uvs);
        assert!(mesh.has_uvs());

        mesh.merge(&unit_triangle());
        assert!(mesh.uvs.is_empty());
    }

    #[test]
    fn test_mirror_then_flip_keeps_facing() {
        let mut mesh = unit_triangle();
        mesh.mirror_y();
        assert_relative_eq!(mesh.first_face_normal().unwrap(), -Vector3::z());

        mesh.flip_normals();
        assert_relative_eq!(mesh.first_face_normal().unwrap(), Vector3::z());
        assert_relative_eq!(mesh.normal(0), Vector3::z());
        assert_eq!(mesh.position(2), Point3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_recompute_normals_loose_vertex() {
        let mut mesh = unit_triangle();
        mesh.add_vertex(Point3::new(5.0, 5.0, 5.0), Vector3::zeros());
        mesh.recompute_normals();
        assert_relative_eq!(mesh.normal(3), Vector3::z());
    }

    #[test]
    fn test_rotate_and_translate() {
        let mut mesh = unit_triangle();
        let rotation = UnitQuaternion::from_axis_angle(&Unit::new_normalize(Vector3::x()), FRAC_PI_2);
        mesh.rotate(&rotation);
        assert_relative_eq!(mesh.position(2), Point3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
        assert_relative_eq!(mesh.normal(0), -Vector3::y(), epsilon = 1e-6);

        mesh.translate(&Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(mesh.position(0), Point3::new(1.0, 2.0, 3.0), epsilon = 1e-6);
    }

    #[test]
    fn test_scale_keeps_normals() {
        let mut mesh = unit_triangle();
        mesh.scale(2.5);
        assert_relative_eq!(mesh.position(1), Point3::new(2.5, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(mesh.normal(1), Vector3::z());
    }

    #[test]
    fn test_bounds() {
        let mesh = unit_triangle();
        let (min, max) = mesh.bounds();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 0.0));
    }
}
