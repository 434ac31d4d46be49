// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input image discovery and naming

use crate::config::ConversionConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// One input image of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub path: PathBuf,
    /// Path relative to the input directory without extension, used as object name
    pub name: String,
}

/// List the PNG images at the top level of `dir`, sorted by file name
///
/// Extension matching is case-insensitive. Files whose stem ends with the
/// mask suffix are derived masks and are skipped. Fails with
/// [`Error::Input`] when the directory is missing or holds no images.
pub fn discover_images(dir: &Path, config: &ConversionConfig) -> Result<Vec<ImageJob>> {
    if !dir.is_dir() {
        return Err(Error::Input {
            path: dir.to_path_buf(),
            reason: "does not exist or is not a directory",
        });
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_png(path) && !is_mask(path, &config.mask_suffix))
        .collect();
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if paths.is_empty() {
        return Err(Error::Input {
            path: dir.to_path_buf(),
            reason: "contains no PNG images",
        });
    }

    tracing::info!(dir = %dir.display(), images = paths.len(), "Discovered input images");

    Ok(paths
        .into_iter()
        .map(|path| ImageJob {
            name: base_name(dir, &path),
            path,
        })
        .collect())
}

/// Where the alpha mask of `image` is written
pub fn mask_path(dir: &Path, image: &Path, config: &ConversionConfig) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(&config.mask_directory)
        .join(format!("{stem}{}.png", config.mask_suffix))
}

/// Path of `image` relative to `dir`, extension stripped, `/`-separated
pub fn base_name(dir: &Path, image: &Path) -> String {
    let relative = image.strip_prefix(dir).unwrap_or(image).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

fn is_mask(path: &Path, suffix: &str) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.ends_with(suffix))
}
