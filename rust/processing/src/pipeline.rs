// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch conversion of cutout images into scene objects
//!
//! Tracing (alpha extraction, border following, smoothing, scaling) has no
//! cross-image dependency and runs on the rayon pool. Topology resolution,
//! assembly and scene insertion run one image at a time in discovery order.

use crate::config::ConversionConfig;
use crate::discovery::{discover_images, mask_path, ImageJob};
use crate::error::Result;
use crate::scene::{SceneObject, SceneSink};
use cutout3d_geometry::{assemble, orient_vertical, prepare_contours, resolve, Mesh, PreparedContours};
use cutout3d_vision::{extract_alpha, find_contours, load_rgba, save_mask};
use rayon::prelude::*;
use std::path::Path;

/// An image that could not be converted
#[derive(Debug)]
pub struct ImageFailure {
    pub name: String,
    pub error: crate::Error,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Names of the images handed to the scene, in order
    pub converted: Vec<String>,
    pub failures: Vec<ImageFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Read, trace, smooth and scale one image
///
/// The alpha mask is written below `dir` when mask persistence is enabled.
pub fn trace_job(dir: &Path, job: &ImageJob, config: &ConversionConfig) -> Result<PreparedContours> {
    let image = load_rgba(&job.path)?;
    let mask = extract_alpha(&image)?;

    if config.persist_masks {
        save_mask(&mask, &mask_path(dir, &job.path, config))?;
    }

    let contours = find_contours(&mask, &config.trace_options());
    tracing::debug!(image = %job.name, contours = contours.len(), "Traced image");

    Ok(prepare_contours(&contours, config.mesh_height)?)
}

/// Resolve topology and assemble the final mesh of one image
pub fn build_mesh(prepared: &PreparedContours, config: &ConversionConfig) -> Result<Mesh> {
    let levels = resolve(prepared, config.holes_enabled)?;
    let mut mesh = assemble(&levels, &prepared.extent);
    if config.vertical_orientation {
        orient_vertical(&mut mesh);
    }
    Ok(mesh)
}

/// Convert every PNG in `dir` and hand the results to `sink`
///
/// A missing or empty directory aborts the batch. Any other failure only
/// skips the image it belongs to and is recorded in the report.
pub fn run_batch(dir: &Path, config: &ConversionConfig, sink: &mut impl SceneSink) -> Result<BatchReport> {
    config.validate()?;
    let jobs = discover_images(dir, config)?;
    let start = std::time::Instant::now();

    let traced: Vec<(ImageJob, Result<PreparedContours>)> = jobs
        .into_par_iter()
        .map(|job| {
            let prepared = trace_job(dir, &job, config);
            (job, prepared)
        })
        .collect();

    let mut report = BatchReport::default();
    for (job, prepared) in traced {
        match prepared.and_then(|p| build_mesh(&p, config)) {
            Ok(mesh) => {
                tracing::debug!(
                    image = %job.name,
                    vertices = mesh.vertex_count(),
                    triangles = mesh.triangle_count(),
                    "Converted image"
                );
                sink.add_object(SceneObject {
                    name: job.name.clone(),
                    mesh,
                    texture: Some(job.path),
                });
                report.converted.push(job.name);
            }
            Err(error) => {
                tracing::warn!(image = %job.name, error = %error, "Skipping image");
                report.failures.push(ImageFailure { name: job.name, error });
            }
        }
    }

    tracing::info!(
        converted = report.converted.len(),
        failed = report.failures.len(),
        time_ms = start.elapsed().as_millis(),
        "Batch complete"
    );

    Ok(report)
}
