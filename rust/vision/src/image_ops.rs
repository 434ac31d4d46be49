// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mask preprocessing before border tracing

use image::{GrayImage, Luma};

/// Side length of the square blur kernel
pub const BLUR_KERNEL: u32 = 5;

/// Intensity at or above which a blurred pixel counts as foreground
pub const FOREGROUND_THRESHOLD: u8 = 127;

/// Mean filter over a `BLUR_KERNEL` square, softening anti-aliased edges
pub fn box_blur(image: &GrayImage) -> GrayImage {
    let radius = BLUR_KERNEL / 2;
    imageproc::filter::box_filter(image, radius, radius)
}

/// Simple threshold - pixels at or above the threshold become white, the rest black
pub fn threshold(image: &GrayImage, threshold_value: u8) -> GrayImage {
    let mut result = GrayImage::new(image.width(), image.height());

    for (x, y, pixel) in image.enumerate_pixels() {
        let value = if pixel.0[0] >= threshold_value { 255 } else { 0 };
        result.put_pixel(x, y, Luma([value]));
    }

    result
}

/// Blur then binarize a mask
pub fn binarize(mask: &GrayImage) -> GrayImage {
    threshold(&box_blur(mask), FOREGROUND_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_cut_point() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([126]));
        img.put_pixel(1, 0, Luma([127]));
        img.put_pixel(2, 0, Luma([250]));

        let binary = threshold(&img, FOREGROUND_THRESHOLD);
        assert_eq!(binary.get_pixel(0, 0).0[0], 0);
        assert_eq!(binary.get_pixel(1, 0).0[0], 255);
        assert_eq!(binary.get_pixel(2, 0).0[0], 255);
    }

    #[test]
    fn test_binarize_removes_isolated_noise() {
        let mut img = GrayImage::new(20, 20);
        // One stray opaque pixel averages far below the cut point
        img.put_pixel(3, 3, Luma([255]));
        for y in 8..18 {
            for x in 8..18 {
                img.put_pixel(x, y, Luma([255]));
            }
        }

        let binary = binarize(&img);
        assert_eq!(binary.get_pixel(3, 3).0[0], 0);
        assert_eq!(binary.get_pixel(12, 12).0[0], 255);
        assert_eq!(binary.get_pixel(1, 1).0[0], 0);
    }
}
