pub mod batch;
pub mod classify;
pub mod crop;
pub mod fit;
pub mod flatten;
pub mod square;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ProcessError;
use crate::utils::{has_valid_extension, safe_output_path, verbose_println};
use self::batch::{BatchItem, BatchResult};
use self::classify::ColorLimits;

/// Target dimensions and encoder settings for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputImageSettings {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub color_limits: ColorLimits,
}

impl Default for OutputImageSettings {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            quality: 75,
            color_limits: ColorLimits::default(),
        }
    }
}

/// Immutable pipeline configuration, snapshotted at batch start.
///
/// Workers only ever read this; configuration mutation stays with the
/// external settings collaborator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub crop: bool,
    pub square: bool,
    pub fit: bool,
    pub opaque: bool,
    pub square_fill_color: [u8; 3],
    pub opaque_fill_color: [u8; 3],
    pub ignore_corrupt_metadata: bool,
    pub preserve_original_format: bool,
    pub no_overwrite: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            crop: true,
            square: true,
            fit: true,
            opaque: false,
            square_fill_color: [255, 255, 255],
            opaque_fill_color: [255, 255, 255],
            ignore_corrupt_metadata: false,
            preserve_original_format: false,
            no_overwrite: false,
        }
    }
}

/// Applies the transform pipeline to single images and whole batches.
pub struct ProcessingEngine {
    settings: OutputImageSettings,
    config: PipelineConfig,
    verbose: bool,
}

impl ProcessingEngine {
    pub fn new(
        settings: OutputImageSettings,
        config: PipelineConfig,
        verbose: bool,
    ) -> Result<Self> {
        if settings.width == 0 || settings.height == 0 {
            return Err(anyhow::anyhow!(
                "Output dimensions must be positive, got: {}x{}",
                settings.width,
                settings.height
            ));
        }
        if settings.quality > 100 {
            return Err(anyhow::anyhow!(
                "Quality must be between 0 and 100, got: {}",
                settings.quality
            ));
        }

        Ok(Self {
            settings,
            config,
            verbose,
        })
    }

    /// Enumerate candidate image files under the input paths.
    ///
    /// Directories are walked recursively; single files are taken as-is.
    /// Matching is by extension, case-insensitive. The result is sorted so
    /// dispatch order is deterministic.
    pub fn discover_images(
        &self,
        input_paths: &[PathBuf],
        extensions: &[String],
        output_dir: &Path,
    ) -> Result<Vec<BatchItem>> {
        let mut items = Vec::new();

        for input_path in input_paths {
            if input_path.is_file() {
                if has_valid_extension(input_path, extensions) {
                    let file_name = input_path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("image")
                        .to_string();
                    let input_dir = input_path
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from("."));
                    items.push(BatchItem::new(file_name, input_dir, output_dir));
                }
                continue;
            }

            verbose_println(
                self.verbose,
                &format!("Scanning directory: {}", input_path.display()),
            );

            let walker = WalkDir::new(input_path).follow_links(false).max_depth(10);

            for entry in walker {
                let entry = entry.context("Failed to read directory entry")?;
                let path = entry.path();

                if path.is_file() && has_valid_extension(path, extensions) {
                    let file_name = path
                        .strip_prefix(input_path)
                        .unwrap_or(path)
                        .to_string_lossy()
                        .into_owned();
                    items.push(BatchItem::new(file_name, input_path, output_dir));
                }
            }
        }

        items.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        verbose_println(self.verbose, &format!("Found {} image files", items.len()));
        Ok(items)
    }

    /// Run the whole batch through [`batch::run`] with this engine's pipeline.
    pub fn process_batch<C>(
        &self,
        items: Vec<BatchItem>,
        worker_limit: usize,
        on_item_done: C,
    ) -> Result<Vec<BatchResult>>
    where
        C: Fn(&BatchResult, f64) + Send + Sync,
    {
        batch::run(
            items,
            worker_limit,
            |item| self.process_item(item),
            on_item_done,
        )
    }

    /// Run one file through the pipeline: decode, transform, encode.
    ///
    /// Returns the path the normalized image was written to.
    pub fn process_item(&self, item: &BatchItem) -> Result<PathBuf> {
        let input_path = item.input_path();
        verbose_println(
            self.verbose,
            &format!("Processing: {}", input_path.display()),
        );

        let image = self.decode(&input_path)?;
        let had_alpha = image.color().has_alpha();

        let transformed = self.transform(image)?;

        let extension = self.output_extension(&input_path, had_alpha);
        let stem = Path::new(&item.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let mut output_path = item.output_dir.join(format!("{stem}.{extension}"));
        if self.config.no_overwrite {
            output_path = safe_output_path(&output_path)?;
        }

        self.encode(&transformed, &output_path)?;
        Ok(output_path)
    }

    /// Apply the configured operations in fixed order.
    ///
    /// Cropping runs before squaring so padding never enters the bounding
    /// box computation; squaring runs before flattening so the padding keeps
    /// its alpha until composited; flattening runs before fitting so the
    /// resampler never blends against transparent regions. Whether padding
    /// and flattening see an alpha channel is decided from the source image,
    /// before any step runs.
    pub fn transform(&self, image: DynamicImage) -> Result<DynamicImage> {
        let needs_alpha = image.color().has_alpha();
        let mut image = image;

        if self.config.crop {
            image = crop::crop_to_content(image, &self.settings.color_limits);
        }

        if self.config.square {
            image = square::make_square(image, needs_alpha, self.config.square_fill_color);
        }

        if needs_alpha && self.config.opaque {
            image = flatten::flatten_onto(image, self.config.opaque_fill_color);
        }

        if self.config.fit {
            image = fit::fit_cover(image, self.settings.width, self.settings.height)?;
        }

        Ok(image)
    }

    /// Decode an input file.
    ///
    /// With `ignore_corrupt_metadata` the decoder's resource limits are
    /// dropped and decoding proceeds best-effort, tolerating files whose
    /// metadata would otherwise abort the decode.
    fn decode(&self, path: &Path) -> Result<DynamicImage, ProcessError> {
        let decode_error = |source| ProcessError::Decode {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = ImageReader::open(path)
            .map_err(|e| decode_error(image::ImageError::IoError(e)))?
            .with_guessed_format()
            .map_err(|e| decode_error(image::ImageError::IoError(e)))?;

        if self.config.ignore_corrupt_metadata {
            reader.no_limits();
        }

        reader.decode().map_err(decode_error)
    }

    /// Choose the output file extension.
    ///
    /// Unless the original format is preserved, images that still carry
    /// transparency at the encode boundary (alpha present and flattening
    /// disabled) become PNG; everything else becomes JPEG.
    fn output_extension(&self, input_path: &Path, had_alpha: bool) -> String {
        if self.config.preserve_original_format {
            input_path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)
                .unwrap_or_else(|| "png".to_string())
        } else if had_alpha && !self.config.opaque {
            "png".to_string()
        } else {
            "jpg".to_string()
        }
    }

    /// Encode the transformed image, honoring the quality setting for JPEG.
    fn encode(&self, image: &DynamicImage, path: &Path) -> Result<(), ProcessError> {
        let encode_error = |source| ProcessError::Encode {
            path: path.to_path_buf(),
            source,
        };

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "jpg" | "jpeg" | "jfif" => {
                let file = File::create(path)
                    .map_err(|e| encode_error(image::ImageError::IoError(e)))?;
                let writer = BufWriter::new(file);
                let encoder = JpegEncoder::new_with_quality(writer, self.settings.quality);
                DynamicImage::ImageRgb8(image.to_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(encode_error)
            }
            _ => image.save(path).map_err(encode_error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn engine(config: PipelineConfig, settings: OutputImageSettings) -> ProcessingEngine {
        ProcessingEngine::new(settings, config, false).unwrap()
    }

    fn default_engine() -> ProcessingEngine {
        engine(PipelineConfig::default(), OutputImageSettings::default())
    }

    /// Fully transparent 64x64 canvas with an opaque white border ring and a
    /// solid red 20x20 block in the middle.
    fn transparent_with_white_border() -> DynamicImage {
        let mut img = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 0]));
        for x in 0..64 {
            img.put_pixel(x, 0, Rgba([255, 255, 255, 255]));
            img.put_pixel(x, 63, Rgba([255, 255, 255, 255]));
        }
        for y in 0..64 {
            img.put_pixel(0, y, Rgba([255, 255, 255, 255]));
            img.put_pixel(63, y, Rgba([255, 255, 255, 255]));
        }
        for y in 22..42 {
            for x in 22..42 {
                img.put_pixel(x, y, Rgba([190, 10, 10, 255]));
            }
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_full_pipeline_scenario_on_transparent_png() {
        let config = PipelineConfig {
            opaque: true,
            ..PipelineConfig::default()
        };
        let engine = engine(config, OutputImageSettings::default());

        let result = engine.transform(transparent_with_white_border()).unwrap();

        // 1000x1000, opaque, and the uniform border is gone: every sampled
        // pixel is the red content color.
        assert_eq!((result.width(), result.height()), (1000, 1000));
        assert!(!result.color().has_alpha());
        let rgb = result.to_rgb8();
        for (x, y) in [(0, 0), (999, 0), (0, 999), (999, 999), (500, 500)] {
            let pixel = rgb.get_pixel(x, y);
            assert!(pixel[0] > 150 && pixel[1] < 60 && pixel[2] < 60);
        }
    }

    #[test]
    fn test_transform_keeps_alpha_when_opaque_disabled() {
        let result = default_engine()
            .transform(transparent_with_white_border())
            .unwrap();
        assert!(result.color().has_alpha());
        assert_eq!((result.width(), result.height()), (1000, 1000));
    }

    #[test]
    fn test_transform_with_all_steps_disabled_is_identity() {
        let config = PipelineConfig {
            crop: false,
            square: false,
            fit: false,
            opaque: false,
            ..PipelineConfig::default()
        };
        let engine = engine(config, OutputImageSettings::default());
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(17, 11, Rgb([1, 2, 3])));
        let result = engine.transform(img.clone()).unwrap();
        assert_eq!(result.to_rgb8().as_raw(), img.to_rgb8().as_raw());
    }

    #[test]
    fn test_output_extension_simple_formats() {
        let engine = default_engine();
        // Alpha retained: PNG. Flattened or never transparent: JPEG.
        assert_eq!(engine.output_extension(Path::new("a.gif"), true), "png");
        assert_eq!(engine.output_extension(Path::new("a.png"), false), "jpg");
        assert_eq!(engine.output_extension(Path::new("a.jpg"), false), "jpg");

        let opaque = PipelineConfig {
            opaque: true,
            ..PipelineConfig::default()
        };
        let engine = self::engine(opaque, OutputImageSettings::default());
        assert_eq!(engine.output_extension(Path::new("a.png"), true), "jpg");
    }

    #[test]
    fn test_output_extension_preserves_original_format() {
        let config = PipelineConfig {
            preserve_original_format: true,
            ..PipelineConfig::default()
        };
        let engine = engine(config, OutputImageSettings::default());
        assert_eq!(engine.output_extension(Path::new("a.WEBP"), false), "webp");
        assert_eq!(engine.output_extension(Path::new("photo.TIFF"), true), "tiff");
    }

    #[test]
    fn test_engine_rejects_zero_dimensions() {
        let settings = OutputImageSettings {
            width: 0,
            ..OutputImageSettings::default()
        };
        assert!(ProcessingEngine::new(settings, PipelineConfig::default(), false).is_err());
    }

    #[test]
    fn test_process_item_writes_normalized_file() {
        let dir = TempDir::new().unwrap();
        let input_dir = dir.path().join("in");
        let output_dir = dir.path().join("out");
        std::fs::create_dir_all(&input_dir).unwrap();
        std::fs::create_dir_all(&output_dir).unwrap();

        transparent_with_white_border()
            .save(input_dir.join("sample.png"))
            .unwrap();

        let settings = OutputImageSettings {
            width: 50,
            height: 50,
            ..OutputImageSettings::default()
        };
        let config = PipelineConfig {
            opaque: true,
            ..PipelineConfig::default()
        };
        let engine = engine(config, settings);

        let item = BatchItem::new("sample.png", &input_dir, &output_dir);
        let output_path = engine.process_item(&item).unwrap();

        assert_eq!(output_path, output_dir.join("sample.jpg"));
        let written = image::open(&output_path).unwrap();
        assert_eq!((written.width(), written.height()), (50, 50));
        assert!(!written.color().has_alpha());
    }

    #[test]
    fn test_process_item_no_overwrite_appends_copy_suffix() {
        let dir = TempDir::new().unwrap();
        let input_dir = dir.path().join("in");
        let output_dir = dir.path().join("out");
        std::fs::create_dir_all(&input_dir).unwrap();
        std::fs::create_dir_all(&output_dir).unwrap();

        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([30, 30, 30])))
            .save(input_dir.join("busy.png"))
            .unwrap();
        std::fs::write(output_dir.join("busy.jpg"), b"occupied").unwrap();

        let settings = OutputImageSettings {
            width: 8,
            height: 8,
            ..OutputImageSettings::default()
        };
        let config = PipelineConfig {
            no_overwrite: true,
            ..PipelineConfig::default()
        };
        let engine = engine(config, settings);

        let item = BatchItem::new("busy.png", &input_dir, &output_dir);
        let output_path = engine.process_item(&item).unwrap();

        assert_eq!(output_path, output_dir.join("busy_copy.jpg"));
        assert_eq!(std::fs::read(output_dir.join("busy.jpg")).unwrap(), b"occupied");
    }

    #[test]
    fn test_process_item_reports_decode_error() {
        let dir = TempDir::new().unwrap();
        let item = BatchItem::new("missing.png", dir.path(), dir.path());
        let err = default_engine().process_item(&item).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProcessError>(),
            Some(ProcessError::Decode { .. })
        ));
    }

    #[test]
    fn test_discover_images_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])));
        rgb.save(dir.path().join("zebra.png")).unwrap();
        rgb.save(dir.path().join("apple.jpg")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();

        let extensions = vec!["jpg".to_string(), "png".to_string()];
        let items = default_engine()
            .discover_images(
                &[dir.path().to_path_buf()],
                &extensions,
                Path::new("/out"),
            )
            .unwrap();

        let names: Vec<_> = items.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, ["apple.jpg", "zebra.png"]);
    }

    #[test]
    fn test_discover_images_accepts_single_file_input() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("only.png");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])))
            .save(&file)
            .unwrap();

        let extensions = vec!["png".to_string()];
        let items = default_engine()
            .discover_images(&[file.clone()], &extensions, Path::new("/out"))
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].input_path(), file);
    }
}
