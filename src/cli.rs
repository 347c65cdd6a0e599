use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::image_processing::classify::ColorLimits;

#[derive(Parser, Debug)]
#[command(
    name = "content-image-processor",
    about = "High-performance batch normalizer for content images",
    long_about = "
Content Image Processor

This tool batch-processes images into a normalized output format: it crops
away uniform-color borders, pads the canvas to a square, flattens
transparency onto a background color and cover-fits the result to fixed
output dimensions. Files are processed in parallel with per-file failure
isolation, so one corrupt input never aborts the rest of the batch.

Key Features:
• Border cropping driven by configurable per-channel color limits
• Canvas squaring with opaque or transparent padding
• Transparency flattening onto a configurable background color
• Cover-fit resizing with high-quality Lanczos resampling
• Parallel batch processing with progress tracking

Example Usage:
  # Normalize a folder of product shots to 1000x1000 JPEGs
  content-image-processor -i ~/raw -o ~/normalized

  # Process a single file, keeping transparency, into a 512x512 PNG
  content-image-processor -i logo.png -o ~/out -s 512x512

  # Flatten transparency onto white and never overwrite existing outputs
  content-image-processor -i ~/raw -o ~/normalized --opaque --no-overwrite

  # Keep each source file's format and skip the squaring step
  content-image-processor -i ~/raw -o ~/out --preserve-format --no-square

  # Load a settings snapshot, overriding only the worker count
  content-image-processor --config-file settings.json -j 8"
)]
pub struct Args {
    /// Input directories or single image files (can be specified multiple times)
    #[arg(short = 'i', long = "input", required = true, value_name = "DIR|FILE")]
    pub input_paths: Vec<PathBuf>,

    /// Output directory for normalized images
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Target output size (format: WIDTHxHEIGHT, e.g., 1000x1000)
    #[arg(
        short = 's',
        long = "size",
        default_value = "1000x1000",
        value_name = "WIDTHxHEIGHT"
    )]
    pub size: String,

    /// JPEG quality for lossy outputs (0-100)
    #[arg(short = 'q', long = "quality", default_value = "75", value_name = "QUALITY")]
    pub quality: u8,

    /// Background color limits as R,G,B,A thresholds. Pixels with all color
    /// channels at or above R,G,B, or with alpha at or below A, count as
    /// background for cropping
    #[arg(
        long = "color-limits",
        default_value = "252,252,252,10",
        value_name = "R,G,B,A"
    )]
    pub color_limits_str: String,

    /// Disable border cropping
    #[arg(long = "no-crop")]
    pub no_crop: bool,

    /// Disable canvas squaring
    #[arg(long = "no-square")]
    pub no_square: bool,

    /// Disable cover-fit resizing to the target size
    #[arg(long = "no-fit")]
    pub no_fit: bool,

    /// Flatten transparency onto the opaque fill color
    #[arg(long = "opaque")]
    pub opaque: bool,

    /// Fill color for squaring padding (hex RGB, e.g., #FFFFFF)
    #[arg(
        long = "square-fill-color",
        default_value = "#FFFFFF",
        value_name = "COLOR"
    )]
    pub square_fill_color: String,

    /// Background color used when flattening transparency (hex RGB)
    #[arg(
        long = "opaque-fill-color",
        default_value = "#FFFFFF",
        value_name = "COLOR"
    )]
    pub opaque_fill_color: String,

    /// Decode files with corrupt or oversized metadata best-effort instead
    /// of rejecting them
    #[arg(long = "ignore-corrupt-metadata")]
    pub ignore_corrupt_metadata: bool,

    /// Keep each source file's extension instead of choosing png/jpg from
    /// the transparency of the result
    #[arg(long = "preserve-format")]
    pub preserve_format: bool,

    /// Never overwrite existing outputs; append _copy suffixes instead
    #[arg(long = "no-overwrite")]
    pub no_overwrite: bool,

    /// Comma-separated list of image extensions to process
    #[arg(
        long = "extensions",
        default_value = "jpg,jpeg,png,webp,jfif,gif,tiff",
        value_name = "LIST"
    )]
    pub extensions_str: String,

    /// Number of parallel workers (0 = number of logical CPUs)
    #[arg(short = 'j', long = "jobs", default_value = "4", value_name = "JOBS")]
    pub jobs: usize,

    /// JSON configuration snapshot merged under explicit command-line flags
    #[arg(long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Emit NDJSON progress events to stdout instead of human-readable output
    #[arg(long = "json-progress")]
    pub json_progress: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Parse the target size string into (width, height)
    pub fn parse_size(&self) -> Result<(u32, u32)> {
        let parts: Vec<&str> = self.size.split('x').collect();
        if parts.len() != 2 {
            return Err(anyhow::anyhow!(
                "Invalid size format: '{}'. Expected WIDTHxHEIGHT like 1000x1000",
                self.size
            ));
        }

        let width = parts[0]
            .trim()
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid width: '{}'", parts[0]))?;
        let height = parts[1]
            .trim()
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid height: '{}'", parts[1]))?;

        Ok((width, height))
    }

    /// Parse the color limits string into thresholds
    pub fn parse_color_limits(&self) -> Result<ColorLimits> {
        let parts: Vec<&str> = self.color_limits_str.split(',').collect();
        if parts.len() != 4 {
            return Err(anyhow::anyhow!(
                "Invalid color limits: '{}'. Expected R,G,B,A like 252,252,252,10",
                self.color_limits_str
            ));
        }

        let mut values = [0u8; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .trim()
                .parse::<u8>()
                .map_err(|_| anyhow::anyhow!("Invalid color limit: '{}'", part))?;
        }

        Ok(ColorLimits::new(values[0], values[1], values[2], values[3]))
    }

    /// Accepted input extensions, lowercased with any leading dots stripped
    pub fn extensions(&self) -> Vec<String> {
        self.extensions_str
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    /// Effective worker count: 0 means one worker per logical CPU
    pub fn worker_limit(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        }
    }
}
