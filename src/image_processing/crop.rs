use image::{DynamicImage, RgbaImage};

use super::classify::{is_background, ColorLimits};

/// Crop away uniform background borders.
///
/// The bounding box is computed on an RGBA view of the image (alpha is
/// synthesized as 255 when absent) by classifying every pixel against
/// `limits`. The crop is applied to the original image, so colors and alpha
/// survive untouched. An image classified as background everywhere is
/// returned unchanged.
pub fn crop_to_content(image: DynamicImage, limits: &ColorLimits) -> DynamicImage {
    let rgba = image.to_rgba8();
    match content_bounding_box(&rgba, limits) {
        Some((x, y, width, height)) => image.crop_imm(x, y, width, height),
        None => image,
    }
}

/// Tight bounding box `(x, y, width, height)` enclosing all non-background
/// pixels, or `None` when every pixel classifies as background.
fn content_bounding_box(
    rgba: &RgbaImage,
    limits: &ColorLimits,
) -> Option<(u32, u32, u32, u32)> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for (x, y, pixel) in rgba.enumerate_pixels() {
        if is_background(*pixel, limits) {
            continue;
        }
        found = true;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    found.then(|| (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}
