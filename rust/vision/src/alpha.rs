// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alpha channel extraction and mask persistence

use crate::error::{Error, Result};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use std::path::Path;

/// Open and decode an image file
pub fn load_rgba(path: &Path) -> Result<DynamicImage> {
    Ok(image::open(path)?)
}

/// Copy the alpha channel of `image` into a single-channel mask
///
/// Images without an alpha channel are rejected rather than treated as fully
/// opaque, since their silhouette would just be the image frame.
pub fn extract_alpha(image: &DynamicImage) -> Result<GrayImage> {
    if !image.color().has_alpha() {
        return Err(Error::MissingChannel(format!("{:?}", image.color())));
    }

    let rgba = image.to_rgba8();
    Ok(GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        Luma([rgba.get_pixel(x, y).0[3]])
    }))
}

/// Write a mask as PNG, creating its directory if needed
pub fn save_mask(mask: &GrayImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    mask.save_with_format(path, ImageFormat::Png)?;
    tracing::debug!(path = %path.display(), "saved alpha mask");
    Ok(())
}
