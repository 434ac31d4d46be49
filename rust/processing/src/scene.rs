// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene output: the sink that receives finished meshes, plus an OBJ/MTL writer

use crate::error::Result;
use cutout3d_geometry::{Mesh, Vector3};
use rustc_hash::FxHashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Spacing between grid cells relative to the largest object
pub const GRID_SPACING: f64 = 1.1;

/// A finished mesh and where it came from
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub mesh: Mesh,
    /// Source image, referenced as the object's diffuse and alpha map
    pub texture: Option<PathBuf>,
}

/// Receives finished objects; takes exclusive access for every insertion
pub trait SceneSink {
    fn add_object(&mut self, object: SceneObject);
}

impl SceneSink for Vec<SceneObject> {
    fn add_object(&mut self, object: SceneObject) {
        self.push(object);
    }
}

/// Collects objects and writes them as one OBJ file with a material library
#[derive(Debug, Default)]
pub struct ObjScene {
    objects: Vec<SceneObject>,
}

impl SceneSink for ObjScene {
    fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }
}

impl ObjScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Grid position of every object, in insertion order
    pub fn layout(&self) -> Vec<Vector3<f64>> {
        let sizes: Vec<(f64, f64)> = self
            .objects
            .iter()
            .map(|object| {
                let (min, max) = object.mesh.bounds();
                ((max.x - min.x) as f64, (max.y - min.y) as f64)
            })
            .collect();
        grid_offsets(&sizes)
    }

    /// Write `path` and a sibling `.mtl` library
    pub fn write(&self, path: &Path) -> Result<()> {
        let mtl_path = path.with_extension("mtl");
        let mtl_name = mtl_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scene.mtl".into());

        std::fs::write(path, self.to_obj(&mtl_name))?;
        std::fs::write(&mtl_path, self.to_mtl())?;

        tracing::info!(
            path = %path.display(),
            objects = self.objects.len(),
            "Wrote scene"
        );
        Ok(())
    }

    /// OBJ text with objects laid out on the grid
    ///
    /// Meshes are Z-up; the file is written Y-up as OBJ readers expect.
    pub fn to_obj(&self, mtl_name: &str) -> String {
        let names = unique_names(&self.objects);
        let offsets = self.layout();

        let mut out = String::new();
        let _ = writeln!(out, "# cutout3d scene, {} objects", self.objects.len());
        let _ = writeln!(out, "mtllib {mtl_name}");

        let mut vertex_offset = 1usize;
        for ((object, name), offset) in self.objects.iter().zip(&names).zip(&offsets) {
            let mesh = &object.mesh;
            let _ = writeln!(out, "\no {name}");
            let _ = writeln!(out, "usemtl {name}");

            for i in 0..mesh.vertex_count() {
                let p = mesh.position(i) + *offset;
                // Z-up to Y-up: (x, y, z) -> (x, z, -y)
                let _ = writeln!(out, "v {:.6} {:.6} {:.6}", p.x, p.z, -p.y);
            }
            let has_uvs = mesh.has_uvs();
            if has_uvs {
                for uv in mesh.uvs.chunks_exact(2) {
                    let _ = writeln!(out, "vt {:.6} {:.6}", uv[0], uv[1]);
                }
            }
            for i in 0..mesh.vertex_count() {
                let n = mesh.normal(i);
                let _ = writeln!(out, "vn {:.6} {:.6} {:.6}", n.x, n.z, -n.y);
            }

            for tri in mesh.indices.chunks_exact(3) {
                let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize + vertex_offset);
                if has_uvs {
                    let _ = writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}");
                } else {
                    let _ = writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}");
                }
            }
            for [a, b] in &mesh.edges {
                let _ = writeln!(out, "l {} {}", *a as usize + vertex_offset, *b as usize + vertex_offset);
            }

            vertex_offset += mesh.vertex_count();
        }

        out
    }

    /// MTL text with one material per object, mapped to its source image
    pub fn to_mtl(&self) -> String {
        let names = unique_names(&self.objects);
        let mut out = String::from("# cutout3d materials\n");

        for (object, name) in self.objects.iter().zip(&names) {
            let _ = writeln!(out, "\nnewmtl {name}");
            let _ = writeln!(out, "Kd 1.000000 1.000000 1.000000");
            let _ = writeln!(out, "illum 1");
            if let Some(texture) = &object.texture {
                let _ = writeln!(out, "map_Kd {}", texture.display());
                let _ = writeln!(out, "map_d {}", texture.display());
            }
        }

        out
    }
}

/// Grid positions for objects of the given (width, depth) sizes
///
/// Rows hold `round(sqrt(n))` objects before wrapping once that count is
/// exceeded, so a row carries one extra object. Cells are
/// [`GRID_SPACING`] times the widest and deepest object. Upright meshes have
/// no depth, in which case rows advance by the column pitch instead.
pub fn grid_offsets(sizes: &[(f64, f64)]) -> Vec<Vector3<f64>> {
    if sizes.is_empty() {
        return Vec::new();
    }

    let row_len = (sizes.len() as f64).sqrt().round() as usize;
    let max_width = sizes.iter().map(|s| s.0).fold(0.0, f64::max);
    let max_depth = sizes.iter().map(|s| s.1).fold(0.0, f64::max);

    let column_pitch = max_width * GRID_SPACING;
    let row_pitch = if max_depth > 0.0 {
        max_depth * GRID_SPACING
    } else {
        column_pitch
    };

    let mut offsets = Vec::with_capacity(sizes.len());
    let (mut x, mut y) = (0.0, 0.0);
    let mut in_row = 0;
    for _ in sizes {
        offsets.push(Vector3::new(x, y, 0.0));
        x += column_pitch;
        in_row += 1;
        if in_row > row_len {
            y += row_pitch;
            x = 0.0;
            in_row = 0;
        }
    }
    offsets
}

/// OBJ-safe names, made unique with a numeric suffix
fn unique_names(objects: &[SceneObject]) -> Vec<String> {
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    objects
        .iter()
        .map(|object| {
            let base: String = object
                .name
                .chars()
                .map(|c| if c.is_whitespace() || c == '/' { '_' } else { c })
                .collect();
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{base}.{:03}", *count - 1)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cutout3d_geometry::Point3;

    fn quad(width: f64, height: f64) -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0), Vector3::z());
        mesh.add_vertex(Point3::new(width, 0.0, 0.0), Vector3::z());
        mesh.add_vertex(Point3::new(width, height, 0.0), Vector3::z());
        mesh.add_triangle(0, 1, 2);
        mesh.add_edge(0, 1);
        mesh.uvs = vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0];
        mesh
    }

    fn object(name: &str, mesh: Mesh) -> SceneObject {
        SceneObject {
            name: name.into(),
            mesh,
            texture: Some(PathBuf::from(format!("/art/{name}.png"))),
        }
    }

    #[test]
    fn test_grid_wraps_after_row_is_exceeded() {
        // Five objects: row length round(sqrt(5)) = 2, wrap after the third
        let offsets = grid_offsets(&[(1.0, 2.0); 5]);
        assert_eq!(offsets.len(), 5);
        assert_relative_eq!(offsets[1].x, 1.1);
        assert_relative_eq!(offsets[2].x, 2.2);
        assert_relative_eq!(offsets[3].x, 0.0);
        assert_relative_eq!(offsets[3].y, 2.2);
        assert_relative_eq!(offsets[4].y, 2.2);
    }

    #[test]
    fn test_grid_upright_objects_use_column_pitch() {
        let offsets = grid_offsets(&[(2.0, 0.0); 4]);
        assert_relative_eq!(offsets[2].y, 0.0);
        assert_relative_eq!(offsets[3].y, 2.2);
    }

    #[test]
    fn test_obj_records() {
        let mut scene = ObjScene::new();
        scene.add_object(object("leaf", quad(1.0, 1.0)));
        scene.add_object(object("leaf", quad(2.0, 1.0)));

        let obj = scene.to_obj("scene.mtl");
        assert!(obj.contains("mtllib scene.mtl"));
        assert!(obj.contains("o leaf\n"));
        assert!(obj.contains("o leaf.001\n"));
        assert_eq!(obj.matches("\nv ").count(), 6);
        assert_eq!(obj.matches("\nvt ").count(), 6);
        // Second object indices continue after the first object's vertices
        assert!(obj.contains("f 4/4/4 5/5/5 6/6/6"));
        assert!(obj.contains("l 4 5"));

        let mtl = scene.to_mtl();
        assert!(mtl.contains("newmtl leaf.001"));
        assert!(mtl.contains("map_Kd /art/leaf.png"));
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<SceneObject> = Vec::new();
        sink.add_object(object("a", quad(1.0, 1.0)));
        assert_eq!(sink.len(), 1);
    }
}
