// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for batch processing
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a batch of cutouts
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input directory '{}' {reason}", path.display())]
    Input { path: PathBuf, reason: &'static str },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Geometry(#[from] cutout3d_geometry::Error),

    #[error(transparent)]
    Vision(#[from] cutout3d_vision::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
