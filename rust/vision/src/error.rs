// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for image operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading images and extracting masks
#[derive(Error, Debug)]
pub enum Error {
    #[error("Image has no alpha channel (color type {0})")]
    MissingChannel(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
