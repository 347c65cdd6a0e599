use image::{DynamicImage, Rgb, RgbImage};

/// Composite an image with transparency onto an opaque background color.
///
/// Source alpha is the per-pixel blend weight:
/// `out = src * a/255 + background * (1 - a/255)`, rounded to nearest.
/// Images without an alpha channel pass through unchanged. The result never
/// carries an alpha channel.
pub fn flatten_onto(image: DynamicImage, background_color: [u8; 3]) -> DynamicImage {
    if !image.color().has_alpha() {
        return image;
    }

    let rgba = image.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u32::from(a);
        let blend = |src: u8, bg: u8| -> u8 {
            ((u32::from(src) * alpha + u32::from(bg) * (255 - alpha) + 127) / 255) as u8
        };
        flattened.put_pixel(
            x,
            y,
            Rgb([
                blend(r, background_color[0]),
                blend(g, background_color[1]),
                blend(b, background_color[2]),
            ]),
        );
    }

    DynamicImage::ImageRgb8(flattened)
}
