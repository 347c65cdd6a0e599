use image::Rgba;
use serde::{Deserialize, Serialize};

/// Per-channel thresholds deciding whether a pixel counts as background.
///
/// A pixel is background when all three color channels sit at or above their
/// limits, or when its alpha sits at or below the alpha limit. The limits are
/// fixed for the duration of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorLimits {
    #[serde(rename = "red")]
    pub red_max: u8,
    #[serde(rename = "green")]
    pub green_max: u8,
    #[serde(rename = "blue")]
    pub blue_max: u8,
    #[serde(rename = "alpha")]
    pub alpha_max: u8,
}

impl Default for ColorLimits {
    fn default() -> Self {
        Self {
            red_max: 252,
            green_max: 252,
            blue_max: 252,
            alpha_max: 10,
        }
    }
}

impl ColorLimits {
    pub fn new(red_max: u8, green_max: u8, blue_max: u8, alpha_max: u8) -> Self {
        Self {
            red_max,
            green_max,
            blue_max,
            alpha_max,
        }
    }
}

/// Classify a pixel as background or content.
///
/// Callers working on images without an alpha channel must synthesize
/// alpha = 255 before calling this, so the alpha branch never fires for
/// fully opaque inputs.
pub fn is_background(pixel: Rgba<u8>, limits: &ColorLimits) -> bool {
    let Rgba([r, g, b, a]) = pixel;
    (r >= limits.red_max && g >= limits.green_max && b >= limits.blue_max)
        || a <= limits.alpha_max
}
