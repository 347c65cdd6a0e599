use image::{imageops, DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// Pad an image to a square canvas, centered.
///
/// The canvas side equals the larger input dimension. Offsets use floor
/// division, so when the difference is odd the extra pixel of padding lands
/// on the trailing edge. When `needs_alpha` is set the canvas carries an
/// alpha channel and the fill is fully transparent; otherwise the canvas is
/// opaque RGB in `fill_color`.
pub fn make_square(image: DynamicImage, needs_alpha: bool, fill_color: [u8; 3]) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let side = width.max(height);
    let x = i64::from((side - width) / 2);
    let y = i64::from((side - height) / 2);
    let [r, g, b] = fill_color;

    if needs_alpha {
        let mut canvas = RgbaImage::from_pixel(side, side, Rgba([r, g, b, 0]));
        imageops::replace(&mut canvas, &image.to_rgba8(), x, y);
        DynamicImage::ImageRgba8(canvas)
    } else {
        let mut canvas = RgbImage::from_pixel(side, side, Rgb([r, g, b]));
        imageops::replace(&mut canvas, &image.to_rgb8(), x, y);
        DynamicImage::ImageRgb8(canvas)
    }
}
