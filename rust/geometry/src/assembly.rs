// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Final mesh assembly
//!
//! Contours are traced in image space where rows grow downwards, so the raw
//! caps come out upside down and with the wrong handedness. Assembly mirrors
//! them back, restores the winding, moves the origin to the bottom edge of the
//! image frame and maps texture coordinates over that frame.

use crate::contour::Extent;
use crate::mesh::Mesh;
use crate::topology::{join, LevelMesh};
use nalgebra::{UnitQuaternion, Vector3};
use std::f64::consts::FRAC_PI_2;

/// Build the final mesh of one image from its resolved levels
///
/// The four extent corners stay in the mesh as loose vertices so the object
/// spans the whole image frame. Cap faces end up facing +Z and the frame
/// covers `[0, width] x [0, height]` in XY.
pub fn assemble(levels: &[LevelMesh], extent: &Extent) -> Mesh {
    let mut mesh = Mesh::new();
    for corner in &extent.corners {
        mesh.add_vertex(*corner, Vector3::z());
    }
    mesh.merge(&join(levels));

    mesh.mirror_y();
    mesh.flip_normals();

    // After mirroring the image's bottom row is the lowest Y of the frame
    let lowest = extent
        .corners
        .iter()
        .map(|c| -c.y)
        .fold(f64::INFINITY, f64::min);
    mesh.translate(&Vector3::new(0.0, -lowest, 0.0));

    let (min, _) = mesh.bounds();
    apply_frame_uvs(&mut mesh, min.x as f64, min.y as f64, extent.width(), extent.height());

    tracing::debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        levels = levels.len(),
        "assembled mesh"
    );

    mesh
}

/// Planar UVs over the image frame starting at `(min_x, min_y)`
fn apply_frame_uvs(mesh: &mut Mesh, min_x: f64, min_y: f64, width: f64, height: f64) {
    let width = if width > 0.0 { width } else { 1.0 };
    let height = if height > 0.0 { height } else { 1.0 };

    mesh.uvs.clear();
    mesh.uvs.reserve(mesh.vertex_count() * 2);
    for i in 0..mesh.vertex_count() {
        let p = mesh.position(i);
        mesh.uvs.push(((p.x - min_x) / width) as f32);
        mesh.uvs.push(((p.y - min_y) / height) as f32);
    }
}

/// Stand the mesh upright: image up becomes world +Z and the face looks down -Y
pub fn orient_vertical(mesh: &mut Mesh) {
    let rotation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
    mesh.rotate(&rotation);
}
