// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cutout3D Geometry Processing
//!
//! Turns traced image contours into flat meshes and points them at targets.
//!
//! The pipeline runs leaf-first:
//!
//! 1. [`contour`] lifts pixel loops to 3D, smooths and scales them.
//! 2. [`topology`] fills outer contours, optionally carving holes level by
//!    level with [`csg`].
//! 3. [`assembly`] fixes handedness, anchors the origin and maps UVs.
//!
//! [`orientation`] works independently on a placed mesh's face normal.

pub mod assembly;
pub mod contour;
pub mod csg;
pub mod error;
pub mod extrusion;
pub mod mesh;
pub mod orientation;
pub mod topology;
pub mod triangulation;
pub mod vector;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, UnitQuaternion, Vector3};

pub use assembly::{assemble, orient_vertical};
pub use contour::{
    prepare_contours, scale_factor, scale_points, smooth_loop, Contour, ContourSet, Extent, Hierarchy,
    HierarchyNode, Loop3, PreparedContours,
};
pub use csg::carve;
pub use error::{Error, Result};
pub use extrusion::{cap_loops, solidify};
pub use mesh::Mesh;
pub use orientation::{
    alignment_angles, tilt_rotation, Aligned, AlignmentResult, Oriented, TiltRotation, Tilted, Unaligned,
};
pub use topology::{join, resolve, LevelMesh};
pub use triangulation::triangulate_polygon;
