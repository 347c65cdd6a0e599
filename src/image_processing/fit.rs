use anyhow::Result;
use fast_image_resize::{images::Image, PixelType, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage, RgbaImage};

/// Cover-fit an image to exact target dimensions.
///
/// Scales uniformly so the image fully covers the target box, then
/// center-crops the overflow. Resampling uses fast_image_resize's default
/// convolution filter (Lanczos3). The pixel format (RGB vs RGBA) survives.
pub fn fit_cover(
    image: DynamicImage,
    target_width: u32,
    target_height: u32,
) -> Result<DynamicImage> {
    let (src_width, src_height) = (image.width(), image.height());

    // Center-crop to the target aspect ratio before scaling.
    let target_aspect = target_width as f64 / target_height as f64;
    let source_aspect = src_width as f64 / src_height as f64;

    let (crop_width, crop_height) = if source_aspect > target_aspect {
        // Source is wider - crop width
        let new_width = (src_height as f64 * target_aspect) as u32;
        (new_width.clamp(1, src_width), src_height)
    } else {
        // Source is taller - crop height
        let new_height = (src_width as f64 / target_aspect) as u32;
        (src_width, new_height.clamp(1, src_height))
    };

    let crop_x = (src_width - crop_width) / 2;
    let crop_y = (src_height - crop_height) / 2;
    let cropped = image.crop_imm(crop_x, crop_y, crop_width, crop_height);

    if cropped.color().has_alpha() {
        let rgba = cropped.to_rgba8();
        if (crop_width, crop_height) == (target_width, target_height) {
            return Ok(DynamicImage::ImageRgba8(rgba));
        }
        let pixels = resize_buffer(
            rgba.into_raw(),
            crop_width,
            crop_height,
            target_width,
            target_height,
            PixelType::U8x4,
        )?;
        let buffer = RgbaImage::from_raw(target_width, target_height, pixels)
            .ok_or_else(|| anyhow::anyhow!("resized RGBA buffer has unexpected length"))?;
        Ok(DynamicImage::ImageRgba8(buffer))
    } else {
        let rgb = cropped.to_rgb8();
        if (crop_width, crop_height) == (target_width, target_height) {
            return Ok(DynamicImage::ImageRgb8(rgb));
        }
        let pixels = resize_buffer(
            rgb.into_raw(),
            crop_width,
            crop_height,
            target_width,
            target_height,
            PixelType::U8x3,
        )?;
        let buffer = RgbImage::from_raw(target_width, target_height, pixels)
            .ok_or_else(|| anyhow::anyhow!("resized RGB buffer has unexpected length"))?;
        Ok(DynamicImage::ImageRgb8(buffer))
    }
}

/// Resize a raw pixel buffer to exact dimensions with the high-quality
/// default resampler.
fn resize_buffer(
    pixels: Vec<u8>,
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
    pixel_type: PixelType,
) -> Result<Vec<u8>> {
    let src_image = Image::from_vec_u8(src_width, src_height, pixels, pixel_type)?;
    let mut dst_image = Image::new(dst_width, dst_height, pixel_type);

    let mut resizer = Resizer::new();
    resizer.resize(&src_image, &mut dst_image, Some(&ResizeOptions::default()))?;

    Ok(dst_image.buffer().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};

    fn gradient_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn test_output_dimensions_are_exact_for_wider_source() {
        let result = fit_cover(gradient_image(200, 100), 50, 50).unwrap();
        assert_eq!((result.width(), result.height()), (50, 50));
    }

    #[test]
    fn test_output_dimensions_are_exact_for_taller_source() {
        let result = fit_cover(gradient_image(60, 180), 90, 30).unwrap();
        assert_eq!((result.width(), result.height()), (90, 30));
    }

    #[test]
    fn test_upscaling_reaches_exact_dimensions() {
        let result = fit_cover(gradient_image(10, 10), 64, 64).unwrap();
        assert_eq!((result.width(), result.height()), (64, 64));
    }

    #[test]
    fn test_matching_aspect_skips_cropping() {
        // Same aspect ratio: the full frame is scaled, nothing is cut.
        let result = fit_cover(gradient_image(100, 50), 40, 20).unwrap();
        assert_eq!((result.width(), result.height()), (40, 20));
    }

    #[test]
    fn test_alpha_channel_survives_fitting() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(30, 10, Rgba([5, 6, 7, 99])));
        let result = fit_cover(img, 20, 20).unwrap();
        assert!(result.color().has_alpha());
        assert_eq!((result.width(), result.height()), (20, 20));
    }

    #[test]
    fn test_exact_size_input_is_unchanged() {
        let img = gradient_image(32, 32);
        let result = fit_cover(img.clone(), 32, 32).unwrap();
        assert_eq!(result.to_rgb8().as_raw(), img.to_rgb8().as_raw());
    }
}
