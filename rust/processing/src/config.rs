// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion settings, loaded from environment variables or a JSON file.

use crate::error::{Error, Result};
use cutout3d_vision::{ContourPrecision, TraceOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by every image of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Height of the finished mesh in world units; the image height maps onto it.
    pub mesh_height: f64,
    /// Stand meshes upright (image plane becomes XZ) instead of lying flat.
    pub vertical_orientation: bool,
    /// Carve holes from nested contours instead of filling outer borders only.
    pub holes_enabled: bool,
    pub contour_precision: ContourPrecision,
    /// Write each alpha mask next to its source image.
    pub persist_masks: bool,
    /// Subdirectory of the input directory that receives the masks.
    pub mask_directory: String,
    /// Appended to the image stem to name its mask.
    pub mask_suffix: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            mesh_height: 1.7,
            vertical_orientation: true,
            holes_enabled: false,
            contour_precision: ContourPrecision::Fast,
            persist_masks: true,
            mask_directory: "Alpha Channel".into(),
            mask_suffix: "_opc".into(),
        }
    }
}

impl ConversionConfig {
    /// Load configuration from `CUTOUT3D_*` environment variables.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup, using `from_env` variable names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            mesh_height: lookup("CUTOUT3D_MESH_HEIGHT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.mesh_height),
            vertical_orientation: lookup("CUTOUT3D_VERTICAL_ORIENTATION")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.vertical_orientation),
            holes_enabled: lookup("CUTOUT3D_HOLES")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.holes_enabled),
            contour_precision: lookup("CUTOUT3D_CONTOUR_PRECISION")
                .and_then(|v| parse_precision(&v))
                .unwrap_or(defaults.contour_precision),
            persist_masks: lookup("CUTOUT3D_PERSIST_MASKS")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.persist_masks),
            mask_directory: lookup("CUTOUT3D_MASK_DIRECTORY").unwrap_or(defaults.mask_directory),
            mask_suffix: lookup("CUTOUT3D_MASK_SUFFIX").unwrap_or(defaults.mask_suffix),
        }
    }

    /// Load configuration from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.mesh_height.is_finite() && self.mesh_height > 0.0) {
            return Err(Error::Config(format!(
                "mesh_height must be a positive number, got {}",
                self.mesh_height
            )));
        }
        if self.mask_suffix.is_empty() {
            return Err(Error::Config(
                "mask_suffix must not be empty, masks would be picked up as inputs".into(),
            ));
        }
        if self.persist_masks && self.mask_directory.trim().is_empty() {
            return Err(Error::Config("mask_directory must not be empty".into()));
        }
        Ok(())
    }

    /// Tracing options implied by the precision and holes settings.
    pub fn trace_options(&self) -> TraceOptions {
        TraceOptions::new(self.contour_precision, self.holes_enabled)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_precision(value: &str) -> Option<ContourPrecision> {
    match value.trim().to_ascii_lowercase().as_str() {
        "fast" | "simple" => Some(ContourPrecision::Fast),
        "detailed" | "none" => Some(ContourPrecision::Detailed),
        _ => None,
    }
}
