// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alpha mask extraction and contour tracing for cutout images
//!
//! ```rust,ignore
//! use cutout3d_vision::{extract_alpha, find_contours, load_rgba, TraceOptions};
//!
//! let image = load_rgba(path)?;
//! let mask = extract_alpha(&image)?;
//! let contours = find_contours(&mask, &TraceOptions::default());
//! ```

pub mod alpha;
pub mod contours;
pub mod error;
pub mod image_ops;

pub use alpha::{extract_alpha, load_rgba, save_mask};
pub use contours::{compress_chain, find_contours, ContourPrecision, TraceMode, TraceOptions};
pub use error::{Error, Result};

use cutout3d_geometry::ContourSet;
use image::{DynamicImage, GrayImage};

/// Extract the alpha mask of an image and trace it
///
/// The mask is returned alongside the contours so callers can persist it.
pub fn trace_image(image: &DynamicImage, options: &TraceOptions) -> Result<(GrayImage, ContourSet)> {
    let mask = extract_alpha(image)?;
    let contours = find_contours(&mask, options);
    Ok((mask, contours))
}
