// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during contour and mesh processing
#[derive(Error, Debug)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Invalid scale: mesh height {mesh_height} over {height_px} px")]
    InvalidScale { mesh_height: f64, height_px: u32 },

    #[error("Contour hierarchy is corrupt: contour {index} references parent {parent} ({reason})")]
    HierarchyCorruption {
        index: usize,
        parent: usize,
        reason: &'static str,
    },

    #[error("Contour hierarchy has {nodes} nodes for {contours} contours")]
    HierarchyMismatch { contours: usize, nodes: usize },

    #[error("Cannot orient: face normal or target direction is vertical, heading is undefined")]
    PerpendicularOrient,

    #[error("Object is not facing the target ({xy_angle_deg:.2}°), run the align step first")]
    NotFacingTowards { xy_angle_deg: f64 },

    #[error("Empty mesh: {0}")]
    EmptyMesh(String),
}
