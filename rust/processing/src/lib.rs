// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch conversion of cutout images into meshes
//!
//! Discovers the PNG images of a directory, converts each one with the
//! vision and geometry crates and hands the meshes to a [`SceneSink`].

pub mod config;
pub mod discovery;
pub mod error;
pub mod pipeline;
pub mod scene;

pub use cutout3d_vision::ContourPrecision;

pub use config::ConversionConfig;
pub use discovery::{base_name, discover_images, mask_path, ImageJob};
pub use error::{Error, Result};
pub use pipeline::{build_mesh, run_batch, trace_job, BatchReport, ImageFailure};
pub use scene::{grid_offsets, ObjScene, SceneObject, SceneSink};
